use std::fs;
use std::io::Write;
use std::path::Path;

use csv::{
    Writer,
    WriterBuilder,
};
use log::info;
use tempfile::Builder;

use crate::error::Error;
use crate::layout::LayoutPlan;

/// Column header emitted as the second comment line of every table.
pub(crate) const COLUMNS_COMMENT: &str = "# Name,Type,SubType,Offset,Size";

/// Write the partition table of `plan` to `output_path`.
///
/// The table is first written to a temporary file in the destination
/// directory and then persisted over `output_path`. On failure the temporary
/// file is removed and `output_path` is left untouched.
///
/// An existing table keeps its permissions. A new table gets the usual
/// `0o666` minus umask, like a file created with `File::create`.
pub(crate) fn write_csv<P: AsRef<Path>>(
    plan: &LayoutPlan,
    output_path: P,
    title: &str,
) -> Result<(), Error> {
    let output_path = output_path.as_ref();
    let content = write_csv_content(plan, title)?;

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut file = builder.tempfile_in(dir)?;
    if let Ok(metadata) = fs::metadata(output_path) {
        file.as_file().set_permissions(metadata.permissions())?;
    }
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(output_path)?;

    info!(
        "Wrote {} partitions to {}",
        plan.partitions.len(),
        output_path.display()
    );
    Ok(())
}

/// Serialize the partition table of `plan` and return it as a `String`.
///
/// See [`write_csv`] for the file based variant.
pub(crate) fn write_csv_content(plan: &LayoutPlan, title: &str) -> Result<String, Error> {
    // A line break would end the comment and turn the rest into a record.
    if title.contains(['\n', '\r']) {
        return Err(Error::InvalidValue(format!(
            "table title must be a single line: {:?}",
            title
        )));
    }

    let mut header = Vec::new();
    writeln!(header, "# {}", title)?;
    writeln!(header, "{}", COLUMNS_COMMENT)?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(header);
    write_records(&mut wtr, plan)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidValue(format!("CSV output is not valid UTF-8: {}", e)))
}

fn write_records<W: Write>(wtr: &mut Writer<W>, plan: &LayoutPlan) -> Result<(), Error> {
    // The unused gap is only part of the report, never of the table.
    for partition in &plan.partitions {
        let subtype = partition.kind.subtype_field();
        let offset = format!("{:#x}", partition.offset);
        let size = format!("{:#x}", partition.size);
        wtr.write_record([
            partition.label,
            partition.kind.type_field(),
            subtype.as_str(),
            offset.as_str(),
            size.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
