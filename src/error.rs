use thiserror::Error;

/// Errors raised while resolving raw build options into a [`Config`].
///
/// [`Config`]: crate::Config
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option was not supplied.
    #[error("missing required option: {0}")]
    MissingField(&'static str),

    /// Storage is enabled but no filesystem backend was selected.
    #[error("invalid storage partition subtype")]
    InvalidStorageSubtype,

    /// Storage is enabled and both filesystem backends were selected.
    #[error("storage backends are mutually exclusive: select either spiffs or lfs")]
    ConflictingStorageBackends,

    /// A reserved region was configured with a size of zero bytes.
    #[error("{0} size must not be zero")]
    ZeroSize(&'static str),

    /// The partition table has to start on a flash sector boundary (4k).
    #[error("partition table offset {0:#x} is not aligned to a 4096 byte sector")]
    UnalignedTableOffset(u32),
}

/// Errors that can occur while planning, writing or checking a partition
/// table.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to process CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error(
        "flash size {flash_size:#x} is too small: data partitions end at {data_end:#x}, \
         leaving no room for {app_count} 64K aligned app partition(s)"
    )]
    InsufficientCapacity {
        flash_size: u32,
        data_end: u64,
        app_count: u32,
    },

    #[error("partition '{next}' overlaps or precedes partition '{previous}'")]
    Overlap { previous: String, next: String },

    #[error("partition '{name}' ends at {end:#x}, beyond flash size {flash_size:#x}")]
    ExceedsFlash {
        name: String,
        end: u64,
        flash_size: u32,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl From<tempfile::PersistError> for Error {
    fn from(e: tempfile::PersistError) -> Self {
        Self::IoError(e.error)
    }
}
