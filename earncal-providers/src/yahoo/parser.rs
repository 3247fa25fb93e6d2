//! Visualization response normalizer.
//!
//! The interesting part of the response sits at
//! `finance.result[0].documents[0]`:
//!
//! ```json
//! {
//!   "columns": [{"id": "ticker", "type": "STRING"}, ...],
//!   "rows": [["AAPL", "Apple Inc.", 1712345678000, ...], ...]
//! }
//! ```
//!
//! Any level may be missing and any cell may hold junk; the normalizer
//! never fails on row content.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use earncal_core::json_path::{describe, lookup, Segment};
use earncal_core::{columns, EarningsRecord, ResultSet, EASTERN, STANDARD_COLUMNS};
use earncal_fetch::FetchError;
use serde_json::Value;
use tracing::debug;

use super::query::fields;

/// Stage name for errors raised here.
pub const NORMALIZE_STAGE: &str = "normalize";

/// Path from the response root to the first document.
const DOCUMENT_PATH: [Segment<'static>; 5] = [
    Segment::Key("finance"),
    Segment::Key("result"),
    Segment::Index(0),
    Segment::Key("documents"),
    Segment::Index(0),
];

/// Remote field id to output label, in output column order.
pub const RENAMES: [(&str, &str); 9] = [
    (fields::COMPANY, columns::COMPANY),
    (fields::TICKER, columns::SYMBOL),
    (fields::START_DATETIME, columns::EARNINGS_CALL_TIME),
    (fields::EVENT_NAME, columns::EVENT_NAME),
    (fields::EPS_ESTIMATE, columns::EPS_ESTIMATE),
    (fields::EPS_ACTUAL, columns::REPORTED_EPS),
    (fields::EPS_SURPRISE_PCT, columns::SURPRISE_PCT),
    (fields::MARKET_CAP, columns::MARKET_CAP),
    (fields::START_DATETIME_TYPE, columns::TIME_TYPE),
];

/// Returns the output label for a remote field id, if it has one.
pub fn label_for(id: &str) -> Option<&'static str> {
    RENAMES.iter().find(|(field, _)| *field == id).map(|(_, label)| *label)
}

/// Output name of a pass-through column.
///
/// An id that spells a standard label gets a `(raw)` suffix, otherwise
/// its values would hide behind the standard column of the same name.
pub fn extra_column_name(id: &str) -> String {
    if STANDARD_COLUMNS.contains(&id) {
        format!("{id} (raw)")
    } else {
        id.to_string()
    }
}

// ============================================================================
// Raw Document
// ============================================================================

/// Column metadata of a raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    /// Field id, if present.
    pub id: Option<String>,
    /// Declared type (e.g. `STRING`, `DATE`), if present.
    pub kind: Option<String>,
}

/// The first document of a visualization response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    /// Column metadata, in arrival order.
    pub columns: Vec<RawColumn>,
    /// Row values (rows that are not arrays are kept and skipped later).
    pub rows: Vec<Value>,
}

impl RawDocument {
    /// Extracts the first document from a response body.
    ///
    /// Missing levels yield an empty document; only a body that is not a
    /// JSON object is an error.
    pub fn from_response(body: &Value) -> Result<Self, FetchError> {
        if !body.is_object() {
            return Err(FetchError::malformed(
                NORMALIZE_STAGE,
                "response body is not a JSON object",
            ));
        }

        let Some(document) = lookup(body, &DOCUMENT_PATH) else {
            debug!(path = %describe(&DOCUMENT_PATH), "No document in response");
            return Ok(Self::default());
        };

        let columns = lookup(document, &[Segment::Key("columns")])
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .map(|col| RawColumn {
                        id: text_field(col, "id"),
                        kind: text_field(col, "type"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows = lookup(document, &[Segment::Key("rows")])
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(Self { columns, rows })
    }

    /// Returns true if the document has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column ids in arrival order; missing ids get a positional name.
    pub fn column_ids(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| col.id.clone().unwrap_or_else(|| format!("column_{i}")))
            .collect()
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalizes a raw document into a result set.
pub fn normalize(document: &RawDocument) -> ResultSet {
    let ids = document.column_ids();
    let extra_columns: Vec<String> = ids
        .iter()
        .filter(|id| label_for(id).is_none())
        .map(|id| extra_column_name(id))
        .collect();

    let mut records = Vec::with_capacity(document.rows.len());
    for (index, row) in document.rows.iter().enumerate() {
        let Some(values) = row.as_array() else {
            debug!(row = index, "Skipping row that is not an array");
            continue;
        };
        records.push(normalize_row(&ids, values));
    }

    debug!(rows = records.len(), extra = extra_columns.len(), "Normalized document");
    ResultSet::new(extra_columns, records)
}

/// Extracts and normalizes the first document of a response body.
pub fn normalize_response(body: &Value) -> Result<ResultSet, FetchError> {
    Ok(normalize(&RawDocument::from_response(body)?))
}

fn normalize_row(ids: &[String], values: &[Value]) -> EarningsRecord {
    let mut record = EarningsRecord::default();

    for (id, value) in ids.iter().zip(values) {
        match id.as_str() {
            fields::TICKER => record.symbol = parse_text(value),
            fields::COMPANY => record.company = parse_text(value),
            fields::EVENT_NAME => record.event_name = parse_text(value),
            fields::START_DATETIME => record.report_time = parse_report_time(value),
            fields::START_DATETIME_TYPE => record.time_type = parse_text(value),
            fields::EPS_ESTIMATE => record.eps_estimate = parse_number(value),
            fields::EPS_ACTUAL => record.reported_eps = parse_number(value),
            fields::EPS_SURPRISE_PCT => record.surprise_pct = parse_number(value),
            fields::MARKET_CAP => record.market_cap = parse_number(value),
            _ => record.extra.push((extra_column_name(id), value.clone())),
        }
    }

    record
}

// ============================================================================
// Value Coercion
// ============================================================================

/// Trimmed text; numbers are rendered, everything else is missing.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number from a JSON number or numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Shortest digit run a string needs before it is read as epoch millis.
const MIN_MILLIS_DIGITS: usize = 10;

/// Report time in Eastern time.
///
/// Accepts epoch milliseconds (number or numeric string of at least
/// [`MIN_MILLIS_DIGITS`] digits) and ISO-8601 strings. A timestamp without
/// an offset is taken as UTC, and a bare date as midnight UTC.
pub fn parse_report_time(value: &Value) -> Option<DateTime<Tz>> {
    let utc = match value {
        Value::Number(_) => from_millis(parse_number(value)?)?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<f64>() {
                Ok(ms) if ms.is_finite() && integer_digits(s) >= MIN_MILLIS_DIGITS => {
                    from_millis(ms)?
                }
                _ => parse_iso(s)?,
            }
        }
        _ => return None,
    };
    Some(utc.with_timezone(&EASTERN))
}

#[allow(clippy::cast_possible_truncation)]
fn from_millis(ms: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms as i64).single()
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .ok()
        .map(|naive| naive.and_utc())
}

fn integer_digits(s: &str) -> usize {
    s.split('.')
        .next()
        .map_or(0, |int| int.chars().filter(char::is_ascii_digit).count())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use earncal_core::{Cell, STANDARD_COLUMNS};
    use serde_json::json;

    fn response(columns: Value, rows: Value) -> Value {
        json!({
            "finance": {
                "result": [{"documents": [{"columns": columns, "rows": rows}]}],
                "error": null
            }
        })
    }

    #[test]
    fn test_labels_cover_include_fields() {
        for field in super::super::query::INCLUDE_FIELDS {
            assert!(label_for(field).is_some(), "{field} has no label");
        }
        let labels: Vec<&str> = RENAMES.iter().map(|(_, label)| *label).collect();
        assert_eq!(labels, STANDARD_COLUMNS);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!(2.5e12)), Some(2.5e12));
        assert_eq!(parse_number(&json!("2.10")), Some(2.10));
        assert_eq!(parse_number(&json!(" -2.38 ")), Some(-2.38));
        assert_eq!(parse_number(&json!("N/A")), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!({"raw": 1})), None);
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(&json!("  AAPL ")), Some("AAPL".to_string()));
        assert_eq!(parse_text(&json!("   ")), None);
        assert_eq!(parse_text(&json!(7203)), Some("7203".to_string()));
        assert_eq!(parse_text(&json!(null)), None);
    }

    #[test]
    fn test_parse_report_time_millis() {
        let expected = "2024-04-05T15:34:38-04:00";
        let from_number = parse_report_time(&json!(1_712_345_678_000_i64)).unwrap();
        let from_string = parse_report_time(&json!("1712345678000")).unwrap();

        assert_eq!(from_number.fixed_offset().to_rfc3339(), expected);
        assert_eq!(from_string, from_number);
        assert_eq!(from_number.timezone(), EASTERN);
    }

    #[test]
    fn test_parse_report_time_iso() {
        let t = parse_report_time(&json!("2025-08-14T04:00:00.000Z")).unwrap();
        assert_eq!(t.fixed_offset().to_rfc3339(), "2025-08-14T00:00:00-04:00");

        let naive = parse_report_time(&json!("2025-01-14T21:00:00")).unwrap();
        assert_eq!(naive.fixed_offset().to_rfc3339(), "2025-01-14T16:00:00-05:00");
    }

    #[test]
    fn test_parse_report_time_date_only_is_midnight_utc() {
        let t = parse_report_time(&json!("2024-04-05")).unwrap();
        assert_eq!(t.fixed_offset().to_rfc3339(), "2024-04-04T20:00:00-04:00");
    }

    #[test]
    fn test_short_numeric_string_is_not_millis() {
        assert!(parse_report_time(&json!("2024")).is_none());
        assert!(parse_report_time(&json!("1.5")).is_none());
        assert!(parse_report_time(&json!("1712345678000.0")).is_some());
    }

    #[test]
    fn test_parse_report_time_junk() {
        assert!(parse_report_time(&json!("soon")).is_none());
        assert!(parse_report_time(&json!(null)).is_none());
        assert!(parse_report_time(&json!([1])).is_none());
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        for body in [json!([]), json!("text"), json!(null), json!(42)] {
            let err = normalize_response(&body).unwrap_err();
            assert!(matches!(err, FetchError::MalformedResponse { .. }));
        }
    }

    #[test]
    fn test_missing_levels_yield_empty_set() {
        for body in [
            json!({}),
            json!({"finance": {}}),
            json!({"finance": {"result": []}}),
            json!({"finance": {"result": [{"documents": []}]}}),
            json!({"finance": {"result": null}}),
        ] {
            let set = normalize_response(&body).unwrap();
            assert!(set.is_empty());
            assert_eq!(set.columns(), STANDARD_COLUMNS.map(String::from).as_slice());
        }
    }

    #[test]
    fn test_row_zips_against_columns() {
        let body = response(
            json!([
                {"id": "ticker", "type": "STRING"},
                {"id": "companyshortname", "type": "STRING"},
                {"id": "startdatetime", "type": "DATE"},
                {"id": "epsestimate", "type": "NUMBER"},
                {"id": "epsactual", "type": "NUMBER"},
                {"id": "epssurprisepct", "type": "NUMBER"},
                {"id": "intradaymarketcap", "type": "NUMBER"}
            ]),
            json!([["AAPL", "Apple Inc.", 1_712_345_678_000_i64, "2.10", "2.05", "-2.38", 2_500_000_000_000_i64]]),
        );

        let set = normalize_response(&body).unwrap();
        assert_eq!(set.len(), 1);

        let record = &set.records()[0];
        assert_eq!(record.symbol.as_deref(), Some("AAPL"));
        assert_eq!(record.company.as_deref(), Some("Apple Inc."));
        assert_eq!(
            record.report_time.unwrap().fixed_offset().to_rfc3339(),
            "2024-04-05T15:34:38-04:00"
        );
        assert_eq!(record.eps_estimate, Some(2.10));
        assert_eq!(record.reported_eps, Some(2.05));
        assert_eq!(record.surprise_pct, Some(-2.38));
        assert_eq!(record.market_cap, Some(2.5e12));
        assert_eq!(record.event_name, None);
    }

    #[test]
    fn test_na_becomes_missing() {
        let body = response(
            json!([{"id": "ticker"}, {"id": "epsactual"}]),
            json!([["MSFT", "N/A"]]),
        );
        let set = normalize_response(&body).unwrap();
        assert_eq!(set.records()[0].reported_eps, None);
        assert_eq!(set.records()[0].cell(columns::REPORTED_EPS), Cell::Missing);
    }

    #[test]
    fn test_column_order_independent_of_arrival() {
        let body = response(
            json!([
                {"id": "intradaymarketcap"},
                {"id": "zzz_custom"},
                {"id": "ticker"},
                {"type": "STRING"},
                {"id": "aaa_custom"}
            ]),
            json!([[1000, "x", "IBM", "positional", "y"]]),
        );

        let set = normalize_response(&body).unwrap();
        assert_eq!(&set.columns()[..9], STANDARD_COLUMNS.map(String::from).as_slice());
        assert_eq!(&set.columns()[9..], ["zzz_custom", "column_3", "aaa_custom"]);

        let record = &set.records()[0];
        assert_eq!(record.symbol.as_deref(), Some("IBM"));
        assert_eq!(record.cell("column_3"), Cell::Raw(&json!("positional")));
    }

    #[test]
    fn test_extra_named_like_standard_label_is_renamed() {
        let body = response(
            json!([{"id": "companyshortname"}, {"id": "Company"}, {"id": "Symbol"}]),
            json!([["Apple Inc.", "raw company", "raw symbol"]]),
        );

        let set = normalize_response(&body).unwrap();
        assert_eq!(&set.columns()[9..], ["Company (raw)", "Symbol (raw)"]);

        let record = &set.records()[0];
        assert_eq!(record.cell(columns::COMPANY), Cell::Text("Apple Inc."));
        assert_eq!(record.cell(columns::SYMBOL), Cell::Missing);
        assert_eq!(record.cell("Company (raw)"), Cell::Raw(&json!("raw company")));
        assert_eq!(record.cell("Symbol (raw)"), Cell::Raw(&json!("raw symbol")));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let body = response(
            json!([{"id": "ticker"}, {"id": "epsestimate"}]),
            json!([{"not": "a row"}, ["GE"], ["F", 0.3, "extra"], null]),
        );

        let set = normalize_response(&body).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].symbol.as_deref(), Some("GE"));
        assert_eq!(set.records()[0].eps_estimate, None);
        assert_eq!(set.records()[1].eps_estimate, Some(0.3));
    }

    #[test]
    fn test_raw_document_keeps_column_types() {
        let body = response(json!([{"id": "ticker", "type": "STRING"}]), json!([]));
        let document = RawDocument::from_response(&body).unwrap();
        assert!(document.is_empty());
        assert_eq!(document.columns[0].kind.as_deref(), Some("STRING"));
    }
}
