use csv::{
    ReaderBuilder,
    Trim,
};

use crate::error::Error;
use crate::{
    PartitionTable,
    TableEntry,
};

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    subtype: String,
    offset: String,
    size: String,
    #[serde(default)]
    flags: String,
}

/// Parse partition table CSV content into a [`PartitionTable`].
///
/// Lines starting with `#` are comments. The optional trailing `Flags` column
/// is accepted.
pub(crate) fn parse_csv(content: &str) -> Result<PartitionTable, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        entries.push(parse_row(row)?);
    }

    Ok(PartitionTable { entries })
}

fn parse_row(row: CsvRow) -> Result<TableEntry, Error> {
    if row.name.is_empty() {
        return Err(Error::InvalidValue(
            "partition name must not be empty".to_string(),
        ));
    }

    let offset = parse_number(&row.offset).map_err(|e| {
        Error::InvalidValue(format!("offset of partition '{}': {}", row.name, e))
    })?;
    let size = parse_number(&row.size)
        .map_err(|e| Error::InvalidValue(format!("size of partition '{}': {}", row.name, e)))?;

    Ok(TableEntry {
        name: row.name,
        kind: row.kind,
        subtype: row.subtype,
        offset,
        size,
        flags: row.flags,
    })
}

/// Parse a `0x` prefixed hex number or a decimal number with an optional
/// `K` or `M` suffix.
///
/// This is the number syntax of partition table CSV files and of the
/// command line.
pub fn parse_number(s: &str) -> Result<u32, String> {
    if s.is_empty() {
        return Err("value must be given explicitly".to_string());
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|e| format!("'{}': {}", s, e));
    }

    let (digits, multiplier) = match s.as_bytes()[s.len() - 1] {
        b'K' | b'k' => (&s[..s.len() - 1], 1024),
        b'M' | b'm' => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };
    digits
        .parse::<u32>()
        .map_err(|e| format!("'{}': {}", s, e))?
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{}' does not fit into 32 bits", s))
}
