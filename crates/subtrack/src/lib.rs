pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod sheet;

pub use cache::{
    Clock, FileSource, IngestionCache, ManualClock, MemorySource, RefreshSummary, SheetSource,
    SystemClock, DEFAULT_STALENESS,
};
pub use config::{load_config, load_config_from_str, Config, DatasetConfig, Field, FieldSpec, RecordKind};
pub use error::{ConfigError, Result, SheetError, SourceError, SubtrackError};
pub use extract::{
    Diagnostic, ExtractionResult, Priority, RecordDetails, RecordExtractor, Severity,
    SubmittalRecord,
};
pub use normalize::{normalize_status, parse_date, CanonicalStatus, StatusVocabulary};
pub use sheet::{decode_workbook, CellValue, ColumnMap, HeaderDetector, RawSheet};
