use log::debug;

use super::check::check_bounds;
use super::consts::*;
use super::{
    AppSubtype,
    DataSubtype,
    LayoutPlan,
    Partition,
    PartitionKind,
    Unused,
};
use crate::config::{
    AppLayout,
    Config,
};
use crate::error::Error;

/// An optional data partition. `resolve` returns `None` when the partition is
/// disabled, otherwise its subtype and size.
struct DataRegion {
    label: &'static str,
    resolve: fn(&Config) -> Option<(DataSubtype, u32)>,
}

/// Data partitions in allocation order.
const DATA_REGIONS: [DataRegion; 4] = [
    DataRegion {
        label: "nvs",
        resolve: |config| Some((DataSubtype::Nvs, config.nvs_size)),
    },
    DataRegion {
        label: "storage",
        resolve: |config| {
            config
                .storage
                .map(|storage| (DataSubtype::Storage(storage.backend), storage.size))
        },
    },
    DataRegion {
        label: "phy_init",
        resolve: |config| config.phy_init.then_some((DataSubtype::Phy, PHY_INIT_SIZE)),
    },
    DataRegion {
        label: "otadata",
        resolve: |config| {
            config
                .app_layout
                .has_ota()
                .then_some((DataSubtype::Ota, OTA_DATA_SIZE))
        },
    },
];

fn app_slots(layout: AppLayout) -> &'static [AppSubtype] {
    match layout {
        AppLayout::Single => &[AppSubtype::Factory],
        AppLayout::Ota => &[AppSubtype::Ota0, AppSubtype::Ota1],
        AppLayout::OtaWithFactory => &[AppSubtype::Factory, AppSubtype::Ota0, AppSubtype::Ota1],
    }
}

fn align_down(value: u32, alignment: u32) -> u32 {
    value & !(alignment - 1)
}

/// Compute the partition layout for `config`.
///
/// Data partitions are packed right after the partition table sector. The app
/// partitions are sized equally, aligned down to 64K and anchored to the end
/// of flash. Whatever is left in between is reported as [`Unused`].
pub(crate) fn plan_layout(config: &Config) -> Result<LayoutPlan, Error> {
    let flash_size = config.flash_size;
    let app_count = config.app_layout.app_count();

    // Fails when the data partitions do not fit into flash at all.
    let end_of = |offset: u32, size: u32| -> Result<u32, Error> {
        let end = u64::from(offset) + u64::from(size);
        u32::try_from(end)
            .ok()
            .filter(|&end| end <= flash_size)
            .ok_or(Error::InsufficientCapacity {
                flash_size,
                data_end: end,
                app_count,
            })
    };

    let start = end_of(config.table_offset, PARTITION_TABLE_SIZE)?;

    let (mut partitions, cursor) = DATA_REGIONS
        .iter()
        .filter_map(|region| {
            (region.resolve)(config).map(|(subtype, size)| (region.label, subtype, size))
        })
        .try_fold(
            (Vec::new(), start),
            |(mut partitions, offset), (label, subtype, size)| {
                let next = end_of(offset, size)?;
                debug!("{label}: offset {offset:#x}, size {size:#x}");
                partitions.push(Partition {
                    label,
                    kind: PartitionKind::Data(subtype),
                    offset,
                    size,
                });
                Ok::<_, Error>((partitions, next))
            },
        )?;

    let app_size = align_down((flash_size - cursor) / app_count, APP_ALIGNMENT);
    if app_size == 0 {
        return Err(Error::InsufficientCapacity {
            flash_size,
            data_end: u64::from(cursor),
            app_count,
        });
    }

    // app_size * app_count <= flash_size - cursor, so this cannot underflow
    // and the app partitions never reach back into the data partitions.
    let app_start = flash_size - app_size * app_count;
    let unused = (app_start > cursor).then(|| Unused {
        offset: cursor,
        size: app_start - cursor,
    });
    if let Some(gap) = unused {
        debug!("unused: offset {:#x}, size {:#x}", gap.offset, gap.size);
    }

    let mut offset = app_start;
    for &slot in app_slots(config.app_layout) {
        debug!("{}: offset {offset:#x}, size {app_size:#x}", slot.label());
        partitions.push(Partition {
            label: slot.label(),
            kind: PartitionKind::App(slot),
            offset,
            size: app_size,
        });
        offset += app_size;
    }

    check_bounds(
        partitions.iter().map(|p| (p.label, p.offset, p.size)),
        Some(flash_size),
    )?;

    Ok(LayoutPlan {
        partitions,
        app_size,
        app_count,
        unused,
    })
}
