pub mod diagnostics;
pub mod extractor;
pub mod record;

pub use diagnostics::{Diagnostic, Severity};
pub use extractor::{ExtractionResult, RecordExtractor};
pub use record::{Priority, RecordDetails, SubmittalRecord};
