//! Human readable layout summary.

use std::io::Write;

/// A single line of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow<'a> {
    pub label: &'a str,
    pub offset: u32,
    pub size: u32,
}

/// Write a fixed width table of `rows` to `out`.
///
/// Each row shows the label, offset and size in hex and the size in KiB
/// (rounded down).
pub fn write_report<'a, W, I>(out: &mut W, rows: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = ReportRow<'a>>,
{
    writeln!(out)?;
    writeln!(out, "Partition      Offset         Size    Size")?;
    writeln!(out, "------------------------------------------")?;

    for row in rows {
        writeln!(
            out,
            "{:<10} 0x{:08x}\t0x{:08x}  {:>5}K",
            row.label,
            row.offset,
            row.size,
            row.size / 1024
        )?;
    }

    writeln!(out)?;
    out.flush()
}
