//! ESP-IDF compatible flash partition table planner.
//!
//! Turns a handful of build options (flash size, table offset, reserved NVS
//! and storage sizes, OTA and PHY toggles) into a non-overlapping partition
//! layout. The layout can be written as an ESP-IDF partition table CSV and
//! rendered as a human readable report.
//!
//! ```no_run
//! use esp_partition_planner::{BuildOptions, DEFAULT_TABLE_TITLE};
//!
//! let config = BuildOptions {
//!     flash_size: Some(0x400000),
//!     table_offset: Some(0x9000),
//!     nvs_size: Some(0x6000),
//!     output: Some("partitions.csv".into()),
//!     ..Default::default()
//! }
//! .resolve()?;
//!
//! let plan = esp_partition_planner::plan(&config)?;
//! plan.write_report(&mut std::io::stderr())?;
//! plan.to_csv_file(config.output(), DEFAULT_TABLE_TITLE)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod report;

mod csv;

use std::fs;
use std::io::Write;
use std::path::Path;

pub use crate::csv::parser::parse_number;
pub use config::{
    AppLayout,
    BuildOptions,
    Config,
    StorageBackend,
    StorageConfig,
};
pub use error::{
    ConfigError,
    Error,
};
pub use layout::{
    AppSubtype,
    DataSubtype,
    LayoutEntry,
    LayoutPlan,
    Partition,
    PartitionKind,
    Unused,
};

/// Title written into the first comment line of generated tables.
pub const DEFAULT_TABLE_TITLE: &str = "Partition Table";

/// Plan the partition layout for a validated configuration.
///
/// Fails with [`Error::InsufficientCapacity`] when the data partitions leave
/// no room for 64K aligned app partitions.
pub fn plan(config: &Config) -> Result<LayoutPlan, Error> {
    layout::planner::plan_layout(config)
}

/// A single row of an existing partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    /// `Type` column as written, e.g. `data`, `app` or `0`.
    pub kind: String,
    /// `SubType` column as written.
    pub subtype: String,
    pub offset: u32,
    pub size: u32,
    /// Optional `Flags` column, empty if absent.
    pub flags: String,
}

/// A partition table read back from its CSV representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    /// Rows in the order they appear in the file.
    pub entries: Vec<TableEntry>,
}

impl PartitionTable {
    /// Parse partition table CSV content from a string.
    pub fn from_csv(content: &str) -> Result<Self, Error> {
        csv::parser::parse_csv(content)
    }

    /// Parse the partition table CSV file at `path`.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        csv::parser::parse_csv(&content)
    }

    /// Verify that all partitions are non-empty, in ascending order, do not
    /// overlap and, if `flash_size` is given, end within flash.
    pub fn check(&self, flash_size: Option<u32>) -> Result<(), Error> {
        layout::check::check_bounds(
            self.entries
                .iter()
                .map(|e| (e.name.as_str(), e.offset, e.size)),
            flash_size,
        )
    }

    /// Render the same summary as [`LayoutPlan::write_report`].
    pub fn write_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        report::write_report(
            out,
            self.entries.iter().map(|e| report::ReportRow {
                label: &e.name,
                offset: e.offset,
                size: e.size,
            }),
        )
    }
}
