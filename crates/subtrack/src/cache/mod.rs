pub mod clock;
pub mod controller;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{IngestionCache, RefreshSummary, DEFAULT_STALENESS};
pub use source::{FileSource, MemorySource, SheetSource};
