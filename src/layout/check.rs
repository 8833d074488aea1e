use crate::error::Error;

/// Verify that `regions`, given as `(name, offset, size)` in table order, are
/// non-empty, strictly ascending, non-overlapping and, if `flash_size` is
/// known, end within flash.
pub(crate) fn check_bounds<'a, I>(regions: I, flash_size: Option<u32>) -> Result<(), Error>
where
    I: IntoIterator<Item = (&'a str, u32, u32)>,
{
    let mut previous: Option<(&str, u64)> = None;

    for (name, offset, size) in regions {
        if size == 0 {
            return Err(Error::InvalidValue(format!(
                "partition '{}' has a size of zero",
                name
            )));
        }

        if let Some((previous_name, previous_end)) = previous {
            if u64::from(offset) < previous_end {
                return Err(Error::Overlap {
                    previous: previous_name.to_string(),
                    next: name.to_string(),
                });
            }
        }

        let end = u64::from(offset) + u64::from(size);
        if let Some(flash_size) = flash_size {
            if end > u64::from(flash_size) {
                return Err(Error::ExceedsFlash {
                    name: name.to_string(),
                    end,
                    flash_size,
                });
            }
        }

        previous = Some((name, end));
    }

    Ok(())
}
