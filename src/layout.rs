pub(crate) mod check;
pub(crate) mod consts;
pub(crate) mod planner;

use std::io::Write;
use std::path::Path;

pub use consts::{
    APP_ALIGNMENT,
    FLASH_SECTOR_SIZE,
    OTA_DATA_SIZE,
    PHY_INIT_SIZE,
};

use crate::config::StorageBackend;
use crate::error::Error;
use crate::report::{
    self,
    ReportRow,
};

/// Subtype of a data partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSubtype {
    /// Key-value storage used by the NVS library.
    Nvs,
    /// Filesystem partition; the backend selects the numeric subtype.
    Storage(StorageBackend),
    /// PHY calibration data loaded at boot.
    Phy,
    /// OTA selection metadata.
    Ota,
}

/// Subtype of an app partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSubtype {
    Factory,
    Ota0,
    Ota1,
}

impl AppSubtype {
    /// Partition label used for this slot.
    pub fn label(self) -> &'static str {
        match self {
            Self::Factory => "factory",
            Self::Ota0 => "ota_0",
            Self::Ota1 => "ota_1",
        }
    }
}

/// Type category of a partition together with its subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    Data(DataSubtype),
    App(AppSubtype),
}

impl PartitionKind {
    /// Value of the `Type` column.
    pub fn type_field(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::App(_) => "0",
        }
    }

    /// Value of the `SubType` column.
    ///
    /// Storage subtypes are written as their decimal code, a bare factory
    /// slot as `0`.
    pub fn subtype_field(&self) -> String {
        match self {
            Self::Data(DataSubtype::Nvs) => "nvs".to_string(),
            Self::Data(DataSubtype::Storage(backend)) => backend.subtype_code().to_string(),
            Self::Data(DataSubtype::Phy) => "phy".to_string(),
            Self::Data(DataSubtype::Ota) => "ota".to_string(),
            Self::App(AppSubtype::Factory) => "0".to_string(),
            Self::App(slot) => slot.label().to_string(),
        }
    }
}

/// A single planned flash region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub label: &'static str,
    pub kind: PartitionKind,
    /// Bytes from the start of flash.
    pub offset: u32,
    pub size: u32,
}

impl Partition {
    pub fn is_app(&self) -> bool {
        matches!(self.kind, PartitionKind::App(_))
    }

    /// First byte past this partition.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

/// Space left between the last data partition and the first app partition
/// after aligning the app partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unused {
    pub offset: u32,
    pub size: u32,
}

/// One line of the layout in allocation order, including the unused gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEntry<'a> {
    Partition(&'a Partition),
    Unused(Unused),
}

impl LayoutEntry<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Partition(p) => p.label,
            Self::Unused(_) => "unused",
        }
    }

    pub fn offset(&self) -> u32 {
        match self {
            Self::Partition(p) => p.offset,
            Self::Unused(u) => u.offset,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            Self::Partition(p) => p.size,
            Self::Unused(u) => u.size,
        }
    }
}

/// The result of planning a [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Data partitions followed by app partitions, in flash order.
    pub partitions: Vec<Partition>,
    /// Size shared by every app partition, a multiple of [`APP_ALIGNMENT`].
    pub app_size: u32,
    pub app_count: u32,
    pub unused: Option<Unused>,
}

impl LayoutPlan {
    /// Offset of the first app partition.
    pub fn app_start(&self) -> Option<u32> {
        self.app_partitions().next().map(|p| p.offset)
    }

    pub fn data_partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter().filter(|p| !p.is_app())
    }

    pub fn app_partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter().filter(|p| p.is_app())
    }

    /// Iterate the layout in flash order with the unused gap, if any, placed
    /// between the data and the app partitions.
    pub fn entries(&self) -> impl Iterator<Item = LayoutEntry<'_>> {
        let split = self
            .partitions
            .iter()
            .position(Partition::is_app)
            .unwrap_or(self.partitions.len());
        let (data, apps) = self.partitions.split_at(split);

        data.iter()
            .map(LayoutEntry::Partition)
            .chain(self.unused.map(LayoutEntry::Unused))
            .chain(apps.iter().map(LayoutEntry::Partition))
    }

    /// Serialize the partition table and return the content as a `String`.
    ///
    /// The unused gap is not part of the table.
    pub fn to_csv(&self, title: &str) -> Result<String, Error> {
        crate::csv::writer::write_csv_content(self, title)
    }

    /// Write the partition table to `path`.
    ///
    /// The content is written to a temporary file next to `path` and moved
    /// into place once complete, so a failed write never leaves a truncated
    /// table behind.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P, title: &str) -> Result<(), Error> {
        crate::csv::writer::write_csv(self, path, title)
    }

    /// Render a human readable summary, including the unused gap.
    pub fn write_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        report::write_report(
            out,
            self.entries().map(|entry| ReportRow {
                label: entry.label(),
                offset: entry.offset(),
                size: entry.size(),
            }),
        )
    }
}
