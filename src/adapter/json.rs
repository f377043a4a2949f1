//! Record-list extraction from JSON API responses

use super::error::ParseError;
use crate::record::RawRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Envelope keys tried, in order, when no explicit records field is set.
const ENVELOPE_KEYS: &[&str] = &["suppliers", "data", "results", "items", "records"];

/// Parse a JSON response body into raw records.
///
/// The record list is the `records_field` member when configured, otherwise
/// the first array found under a well-known envelope key, otherwise the body
/// itself if it is an array. Items that are not objects are skipped, as are
/// objects with no company name.
pub(crate) fn parse_records(
    body: &str,
    records_field: Option<&str>,
    source_id: &str,
    collected_at: DateTime<Utc>,
) -> Result<Vec<RawRecord>, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::EmptyPage);
    }
    let value: Value = serde_json::from_str(body)?;
    let items = record_list(value, records_field)?;

    let total = items.len();
    let mut records = Vec::with_capacity(total);
    for item in items {
        if !item.is_object() {
            debug!(source = source_id, "skipping non-object list item");
            continue;
        }
        let record = RawRecord::from_json(source_id, collected_at, item)?;
        if record.fields().company_name.is_some() {
            records.push(record);
        }
    }

    if total > 0 && records.is_empty() {
        return Err(ParseError::MissingField {
            selector: "company_name".to_string(),
            items: total,
        });
    }
    Ok(records)
}

fn record_list(value: Value, records_field: Option<&str>) -> Result<Vec<Value>, ParseError> {
    match (value, records_field) {
        (Value::Object(mut map), Some(field)) => match map.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(ParseError::NotARecordList(format!(" under '{}'", field))),
        },
        (Value::Object(mut map), None) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Array(_)) = map.get(*key) {
                    if let Some(Value::Array(items)) = map.remove(*key) {
                        return Ok(items);
                    }
                }
            }
            Err(ParseError::NotARecordList(String::new()))
        }
        (Value::Array(items), _) => Ok(items),
        _ => Err(ParseError::NotARecordList(String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str, field: Option<&str>) -> Result<Vec<RawRecord>, ParseError> {
        parse_records(body, field, "api", Utc::now())
    }

    #[test]
    fn finds_list_under_envelope_key() {
        let body = r#"{"total": 2, "data": [{"company_name": "A Co"}, {"company_name": "B Co"}]}"#;
        let records = parse(body, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].fields().company_name.as_deref(), Some("B Co"));
        assert_eq!(records[0].source_id(), "api");
    }

    #[test]
    fn explicit_field_and_top_level_array() {
        let body = r#"{"payload": [{"company_name": "A Co", "employee_count": "120"}]}"#;
        assert_eq!(parse(body, Some("payload")).unwrap().len(), 1);
        assert!(parse(r#"{"payload": null}"#, Some("payload")).unwrap().is_empty());
        assert_eq!(parse(r#"[{"company_name": "A"}, 7, "x"]"#, None).unwrap().len(), 1);
    }

    #[test]
    fn malformed_or_unexpected_shape_is_parse_error() {
        assert!(matches!(parse("{not json", None), Err(ParseError::Json(_))));
        assert!(matches!(parse(r#"{"count": 0}"#, None), Err(ParseError::NotARecordList(_))));
        assert!(matches!(
            parse(r#"{"payload": "x"}"#, Some("payload")),
            Err(ParseError::NotARecordList(_))
        ));
        assert!(matches!(
            parse(r#"[{"name": "renamed field"}]"#, None),
            Err(ParseError::MissingField { items: 1, .. })
        ));
    }

    #[test]
    fn empty_list_is_not_an_error() {
        assert!(parse(r#"{"results": []}"#, None).unwrap().is_empty());
    }
}
