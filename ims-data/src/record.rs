use crate::{error::DataError, source::SourceTag};
use std::collections::HashMap;

/// Parses a single `|`-delimited `key=value` record line into a field map. This is the wire
/// shape shared by every batch feed in this system; per-source normalizers pull the fields they
/// need out of it and validate presence/type themselves.
pub fn parse_fields(source: SourceTag, line: &str) -> Result<HashMap<String, String>, DataError> {
    let fields: HashMap<String, String> = line
        .split('|')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();

    if fields.is_empty() {
        return Err(DataError::SchemaInvalid {
            source,
            reason: format!("record has no parseable key=value fields: '{line}'"),
        });
    }

    Ok(fields)
}

pub fn require<'a>(
    source: SourceTag,
    fields: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, DataError> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| DataError::SchemaInvalid {
            source,
            reason: format!("missing required field '{key}'"),
        })
}

pub fn require_decimal(
    source: SourceTag,
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<rust_decimal::Decimal, DataError> {
    require(source, fields, key)?
        .parse()
        .map_err(|_| DataError::SchemaInvalid {
            source,
            reason: format!("field '{key}' is not a valid decimal"),
        })
}

pub fn require_date(
    source: SourceTag,
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<chrono::NaiveDate, DataError> {
    chrono::NaiveDate::parse_from_str(require(source, fields, key)?, "%Y-%m-%d").map_err(|_| {
        DataError::SchemaInvalid {
            source,
            reason: format!("field '{key}' is not a valid date (expected YYYY-MM-DD)"),
        }
    })
}
