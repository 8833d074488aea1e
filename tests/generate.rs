use std::fs;

use esp_partition_planner::{
    BuildOptions,
    ConfigError,
    Error,
    PartitionTable,
    DEFAULT_TABLE_TITLE,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn options(output: std::path::PathBuf) -> BuildOptions {
    BuildOptions {
        flash_size: Some(0x400000),
        table_offset: Some(0x9000),
        nvs_size: Some(0x6000),
        output: Some(output),
        ..Default::default()
    }
}

#[test]
fn test_generate_single_factory() {
    let dir = tempdir().unwrap();
    let config = options(dir.path().join("partitions.csv")).resolve().unwrap();

    let plan = esp_partition_planner::plan(&config).unwrap();
    plan.to_csv_file(config.output(), "Test Partition Table").unwrap();

    let content = fs::read_to_string(config.output()).unwrap();
    assert_eq!(
        content,
        "# Test Partition Table\n\
         # Name,Type,SubType,Offset,Size\n\
         nvs,data,nvs,0xa000,0x6000\n\
         factory,0,0,0x10000,0x3f0000\n"
    );
}

#[test]
fn test_generate_ota_with_factory() {
    let dir = tempdir().unwrap();
    let mut opts = options(dir.path().join("partitions.csv"));
    opts.ota = true;
    opts.ota_factory = true;
    let config = opts.resolve().unwrap();

    let plan = esp_partition_planner::plan(&config).unwrap();
    plan.to_csv_file(config.output(), DEFAULT_TABLE_TITLE).unwrap();

    let content = fs::read_to_string(config.output()).unwrap();
    assert_eq!(
        content,
        "# Partition Table\n\
         # Name,Type,SubType,Offset,Size\n\
         nvs,data,nvs,0xa000,0x6000\n\
         otadata,data,ota,0x10000,0x2000\n\
         factory,0,0,0x40000,0x140000\n\
         ota_0,0,ota_0,0x180000,0x140000\n\
         ota_1,0,ota_1,0x2c0000,0x140000\n"
    );

    let mut report = Vec::new();
    plan.write_report(&mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.contains("unused     0x00012000\t0x0002e000    184K"));
}

#[test]
fn test_generate_is_deterministic() {
    let dir = tempdir().unwrap();
    let mut opts = options(dir.path().join("first.csv"));
    opts.storage = true;
    opts.spiffs = true;
    opts.storage_size = Some(0x80000);
    opts.phy_init = true;
    opts.ota = true;

    let first = opts.resolve().unwrap();
    esp_partition_planner::plan(&first)
        .unwrap()
        .to_csv_file(&first.output(), DEFAULT_TABLE_TITLE)
        .unwrap();

    opts.output = Some(dir.path().join("second.csv"));
    let second = opts.resolve().unwrap();
    esp_partition_planner::plan(&second)
        .unwrap()
        .to_csv_file(&second.output(), DEFAULT_TABLE_TITLE)
        .unwrap();

    assert_eq!(
        fs::read(&first.output()).unwrap(),
        fs::read(&second.output()).unwrap()
    );
}

#[test]
fn test_overwrites_existing_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partitions.csv");
    fs::write(&path, "stale content that is much longer than the table\n".repeat(20)).unwrap();

    let config = options(path.clone()).resolve().unwrap();
    let plan = esp_partition_planner::plan(&config).unwrap();
    plan.to_csv_file(&path, DEFAULT_TABLE_TITLE).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("stale"));
    assert_eq!(content, plan.to_csv(DEFAULT_TABLE_TITLE).unwrap());
}

#[test]
fn test_storage_without_backend_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partitions.csv");
    let mut opts = options(path.clone());
    opts.storage = true;
    opts.storage_size = Some(0x10000);

    let err = opts.resolve().unwrap_err();
    assert_eq!(err, ConfigError::InvalidStorageSubtype);
    assert_eq!(
        Error::from(err).to_string(),
        "invalid storage partition subtype"
    );
    assert!(!path.exists());
}

#[test]
fn test_write_failure_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("partitions.csv");
    let config = options(path.clone()).resolve().unwrap();

    let plan = esp_partition_planner::plan(&config).unwrap();
    let result = plan.to_csv_file(&path, DEFAULT_TABLE_TITLE);

    assert!(matches!(result, Err(Error::IoError(_))));
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_over_committed_flash_is_rejected() {
    let dir = tempdir().unwrap();
    let mut opts = options(dir.path().join("partitions.csv"));
    opts.flash_size = Some(0x100000);
    opts.storage = true;
    opts.lfs = true;
    opts.storage_size = Some(0x100000);
    let config = opts.resolve().unwrap();

    let result = esp_partition_planner::plan(&config);
    assert!(matches!(result, Err(Error::InsufficientCapacity { .. })));
    assert!(!config.output().exists());
}

#[test]
fn test_generated_table_passes_check() {
    let dir = tempdir().unwrap();
    let mut opts = options(dir.path().join("partitions.csv"));
    opts.storage = true;
    opts.lfs = true;
    opts.storage_size = Some(0x100000);
    opts.phy_init = true;
    opts.ota = true;
    opts.ota_factory = true;
    let config = opts.resolve().unwrap();

    let plan = esp_partition_planner::plan(&config).unwrap();
    plan.to_csv_file(config.output(), DEFAULT_TABLE_TITLE).unwrap();

    let table = PartitionTable::from_csv_file(config.output()).unwrap();
    assert_eq!(table.entries.len(), plan.partitions.len());
    for (entry, partition) in table.entries.iter().zip(&plan.partitions) {
        assert_eq!(entry.name, partition.label);
        assert_eq!(entry.kind, partition.kind.type_field());
        assert_eq!(entry.subtype, partition.kind.subtype_field());
        assert_eq!(entry.offset, partition.offset);
        assert_eq!(entry.size, partition.size);
    }
    table.check(Some(config.flash_size())).unwrap();
}

#[cfg(unix)]
#[test]
fn test_overwrite_keeps_table_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("partitions.csv");
    let config = options(path.clone()).resolve().unwrap();
    let plan = esp_partition_planner::plan(&config).unwrap();

    for mode in [0o644, 0o640] {
        fs::write(&path, "stale\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();

        plan.to_csv_file(&path, DEFAULT_TABLE_TITLE).unwrap();

        let written = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(written, mode, "mode {:o} was not kept", mode);
    }
}
