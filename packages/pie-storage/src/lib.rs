pub mod archive;
pub mod catalog;
pub mod loader;

mod error;

pub use archive::{ArchiveLimits, ObservationArchive, ObservationRecord};
pub use catalog::{BulkLoadReport, CatalogStats, PatternStore, RecordRejection};
pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
