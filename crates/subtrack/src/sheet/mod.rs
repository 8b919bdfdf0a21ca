pub mod cell;
pub mod decode;
pub mod header;

pub use cell::{CellValue, RawSheet};
pub use decode::decode_workbook;
pub use header::{ColumnMap, HeaderDetection, HeaderDetector};
