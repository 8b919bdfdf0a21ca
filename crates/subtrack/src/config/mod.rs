pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{default_field_specs, Config, DatasetConfig, Field, FieldSpec, RecordKind};
