use std::path::{
    Path,
    PathBuf,
};

use crate::error::ConfigError;
use crate::layout::FLASH_SECTOR_SIZE;

/// The on-flash filesystem used for the general purpose storage partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageBackend {
    /// SPIFFS, ESP-IDF data subtype `0x40`.
    Spiffs,
    /// LittleFS, ESP-IDF data subtype `0x41`.
    LittleFs,
}

impl StorageBackend {
    /// Numeric data subtype written to the partition table.
    pub fn subtype_code(self) -> u8 {
        match self {
            Self::Spiffs => 0x40,
            Self::LittleFs => 0x41,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spiffs => "spiffs",
            Self::LittleFs => "littlefs",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend and reserved size of the storage partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub size: u32,
}

/// How the application area at the end of flash is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLayout {
    /// One `factory` app partition covering the remaining flash.
    Single,
    /// Two OTA slots, `ota_0` and `ota_1`.
    Ota,
    /// A `factory` slot followed by `ota_0` and `ota_1`.
    OtaWithFactory,
}

impl AppLayout {
    /// Number of equally sized app partitions.
    pub fn app_count(self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Ota => 2,
            Self::OtaWithFactory => 3,
        }
    }

    pub fn has_ota(self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// A validated build configuration, produced by [`BuildOptions::resolve`].
///
/// Fields are read-only outside the crate so that every `Config` has passed
/// the resolver's checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) flash_size: u32,
    pub(crate) table_offset: u32,
    pub(crate) nvs_size: u32,
    pub(crate) storage: Option<StorageConfig>,
    pub(crate) app_layout: AppLayout,
    pub(crate) phy_init: bool,
    pub(crate) output: PathBuf,
}

impl Config {
    /// Total flash capacity in bytes.
    pub fn flash_size(&self) -> u32 {
        self.flash_size
    }

    /// Offset of the partition table itself. The table occupies one sector.
    pub fn table_offset(&self) -> u32 {
        self.table_offset
    }

    pub fn nvs_size(&self) -> u32 {
        self.nvs_size
    }

    /// `Some` iff a storage partition is requested.
    pub fn storage(&self) -> Option<StorageConfig> {
        self.storage
    }

    pub fn app_layout(&self) -> AppLayout {
        self.app_layout
    }

    /// Keep PHY calibration data in its own `phy_init` partition.
    pub fn phy_init(&self) -> bool {
        self.phy_init
    }

    /// Destination of the generated partition table.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Raw, unvalidated build options as handed over by the build system.
///
/// Numeric options are optional so that a missing value is reported by
/// [`BuildOptions::resolve`] with the name of the option instead of a
/// generic parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub flash_size: Option<u32>,
    pub table_offset: Option<u32>,
    pub nvs_size: Option<u32>,
    pub storage_size: Option<u32>,
    pub storage: bool,
    pub spiffs: bool,
    pub lfs: bool,
    pub ota: bool,
    pub ota_factory: bool,
    pub phy_init: bool,
    pub output: Option<PathBuf>,
}

impl BuildOptions {
    /// Validate and normalize the options.
    ///
    /// This is a pure function: equal options always resolve to equal
    /// configurations.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let flash_size = self
            .flash_size
            .ok_or(ConfigError::MissingField("flash_size"))?;
        let table_offset = self
            .table_offset
            .ok_or(ConfigError::MissingField("table_offset"))?;
        let nvs_size = self.nvs_size.ok_or(ConfigError::MissingField("nvs_size"))?;
        let output = self
            .output
            .clone()
            .ok_or(ConfigError::MissingField("output"))?;

        if !table_offset.is_multiple_of(FLASH_SECTOR_SIZE) {
            return Err(ConfigError::UnalignedTableOffset(table_offset));
        }
        if nvs_size == 0 {
            return Err(ConfigError::ZeroSize("nvs"));
        }

        let storage = if self.storage {
            let backend = match (self.spiffs, self.lfs) {
                (true, false) => StorageBackend::Spiffs,
                (false, true) => StorageBackend::LittleFs,
                (true, true) => return Err(ConfigError::ConflictingStorageBackends),
                (false, false) => return Err(ConfigError::InvalidStorageSubtype),
            };
            let size = self
                .storage_size
                .ok_or(ConfigError::MissingField("storage_size"))?;
            if size == 0 {
                return Err(ConfigError::ZeroSize("storage"));
            }
            Some(StorageConfig { backend, size })
        } else {
            None
        };

        // A factory slot next to the OTA slots only exists with OTA enabled.
        let app_layout = match (self.ota, self.ota_factory) {
            (false, _) => AppLayout::Single,
            (true, false) => AppLayout::Ota,
            (true, true) => AppLayout::OtaWithFactory,
        };

        Ok(Config {
            flash_size,
            table_offset,
            nvs_size,
            storage,
            app_layout,
            phy_init: self.phy_init,
            output,
        })
    }
}
