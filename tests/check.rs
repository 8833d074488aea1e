use std::fs;

use esp_partition_planner::{
    Error,
    PartitionTable,
};
use tempfile::NamedTempFile;

#[test]
fn test_check_esp_idf_default_table() {
    let csv_content = r#"# ESP-IDF Partition Table
# Name,   Type, SubType, Offset,  Size, Flags
nvs,      data, nvs,     0x9000,  0x6000,
phy_init, data, phy,     0xf000,  0x1000,
factory,  app,  factory, 0x10000, 1M,
"#;

    let csv_file = NamedTempFile::new().unwrap();
    fs::write(csv_file.path(), csv_content).unwrap();

    let table = PartitionTable::from_csv_file(csv_file.path()).unwrap();
    assert_eq!(table.entries.len(), 3);
    assert_eq!(table.entries[1].name, "phy_init");
    assert_eq!(table.entries[2].offset, 0x10000);
    assert_eq!(table.entries[2].size, 0x100000);

    assert!(table.check(Some(0x400000)).is_ok());
    assert!(matches!(
        table.check(Some(0x100000)),
        Err(Error::ExceedsFlash { ref name, .. }) if name == "factory"
    ));
}

#[test]
fn test_check_overlapping_table() {
    let table = PartitionTable::from_csv(
        "nvs,data,nvs,0x9000,0x6000\n\
         otadata,data,ota,0xd000,0x2000\n",
    )
    .unwrap();

    let err = table.check(None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "partition 'otadata' overlaps or precedes partition 'nvs'"
    );
}

#[test]
fn test_report_lists_every_row() {
    let table = PartitionTable::from_csv(
        "nvs,data,nvs,0x9000,0x6000\n\
         factory,0,0,0x10000,0xf0000\n",
    )
    .unwrap();

    let mut out = Vec::new();
    table.write_report(&mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("nvs        0x00009000\t0x00006000     24K"));
    assert!(report.contains("factory    0x00010000\t0x000f0000    960K"));
}

#[test]
fn test_invalid_size_is_rejected() {
    let result = PartitionTable::from_csv("nvs,data,nvs,0x9000,lots\n");
    assert!(matches!(result, Err(Error::InvalidValue(_))));
}

#[test]
fn test_missing_file() {
    let result = PartitionTable::from_csv_file("does/not/exist.csv");
    assert!(matches!(result, Err(Error::IoError(_))));
}
