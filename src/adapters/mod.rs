//! Concrete adapter implementations for ports.

#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_snapshot_adapter;

use crate::domain::error::ScanError;
use crate::domain::scan_config::DataSource;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// Open the data source named by `[scan] source`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, ScanError> {
    let source: DataSource = config
        .require_string("scan", "source")?
        .parse()
        .map_err(|reason| ScanError::ConfigInvalid {
            section: "scan".into(),
            key: "source".into(),
            reason,
        })?;

    match source {
        DataSource::Csv => Ok(Box::new(csv_adapter::CsvAdapter::from_config(config)?)),
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => Ok(Box::new(sqlite_adapter::SqliteAdapter::from_config(config)?)),
        #[cfg(feature = "postgres")]
        DataSource::Postgres => Ok(Box::new(postgres_adapter::PostgresAdapter::from_config(
            config,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(ScanError::ConfigInvalid {
            section: "scan".into(),
            key: "source".into(),
            reason: format!("{other:?} support not compiled in"),
        }),
    }
}
