// Flash geometry
pub const FLASH_SECTOR_SIZE: u32 = 0x1000;

// The partition table occupies exactly one sector at its base offset.
pub const PARTITION_TABLE_SIZE: u32 = FLASH_SECTOR_SIZE;

// Fixed data partition sizes
pub const PHY_INIT_SIZE: u32 = 0x1000;
pub const OTA_DATA_SIZE: u32 = 0x2000;

// App partitions must start on a 64K boundary.
pub const APP_ALIGNMENT: u32 = 0x10000;
