//! Normalized earnings calendar types.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

// ============================================================================
// Columns
// ============================================================================

/// Output column labels.
pub mod columns {
    /// Company short name.
    pub const COMPANY: &str = "Company";
    /// Ticker symbol.
    pub const SYMBOL: &str = "Symbol";
    /// Scheduled report time in Eastern time.
    pub const EARNINGS_CALL_TIME: &str = "Earnings Call Time";
    /// Fiscal quarter/year label.
    pub const EVENT_NAME: &str = "Event Name";
    /// Consensus EPS estimate.
    pub const EPS_ESTIMATE: &str = "EPS Estimate";
    /// Reported EPS.
    pub const REPORTED_EPS: &str = "Reported EPS";
    /// EPS surprise in percent.
    pub const SURPRISE_PCT: &str = "Surprise (%)";
    /// Intraday market capitalization.
    pub const MARKET_CAP: &str = "Market Cap";
    /// Report timing code (e.g. `BMO`, `AMC`, `TAS`).
    pub const TIME_TYPE: &str = "Time Type";
}

/// Fixed leading columns of every [`ResultSet`], in output order.
pub const STANDARD_COLUMNS: [&str; 9] = [
    columns::COMPANY,
    columns::SYMBOL,
    columns::EARNINGS_CALL_TIME,
    columns::EVENT_NAME,
    columns::EPS_ESTIMATE,
    columns::REPORTED_EPS,
    columns::SURPRISE_PCT,
    columns::MARKET_CAP,
    columns::TIME_TYPE,
];

/// Timezone report times are expressed in.
pub const EASTERN: Tz = chrono_tz::America::New_York;

// ============================================================================
// Earnings Record
// ============================================================================

/// One normalized earnings calendar row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarningsRecord {
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Company short name.
    pub company: Option<String>,
    /// Scheduled report time in `America/New_York`.
    pub report_time: Option<DateTime<Tz>>,
    /// Fiscal quarter/year label.
    pub event_name: Option<String>,
    /// Report timing code.
    pub time_type: Option<String>,
    /// Consensus EPS estimate.
    pub eps_estimate: Option<f64>,
    /// Reported EPS.
    pub reported_eps: Option<f64>,
    /// EPS surprise in percent.
    pub surprise_pct: Option<f64>,
    /// Intraday market capitalization.
    pub market_cap: Option<f64>,
    /// Fields without a known label, in arrival order.
    pub extra: Vec<(String, Value)>,
}

impl EarningsRecord {
    /// Returns the value of `column` as a [`Cell`].
    ///
    /// Unknown columns are looked up in the pass-through fields.
    pub fn cell(&self, column: &str) -> Cell<'_> {
        match column {
            columns::COMPANY => Cell::text(self.company.as_deref()),
            columns::SYMBOL => Cell::text(self.symbol.as_deref()),
            columns::EARNINGS_CALL_TIME => self.report_time.as_ref().map_or(Cell::Missing, Cell::Time),
            columns::EVENT_NAME => Cell::text(self.event_name.as_deref()),
            columns::EPS_ESTIMATE => Cell::number(self.eps_estimate),
            columns::REPORTED_EPS => Cell::number(self.reported_eps),
            columns::SURPRISE_PCT => Cell::number(self.surprise_pct),
            columns::MARKET_CAP => Cell::number(self.market_cap),
            columns::TIME_TYPE => Cell::text(self.time_type.as_deref()),
            other => self
                .extra
                .iter()
                .find(|(name, _)| name == other)
                .map_or(Cell::Missing, |(_, value)| Cell::Raw(value)),
        }
    }
}

// ============================================================================
// Cell
// ============================================================================

/// A borrowed view of one value in an [`EarningsRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// A text field.
    Text(&'a str),
    /// A numeric field.
    Number(f64),
    /// A report time.
    Time(&'a DateTime<Tz>),
    /// A pass-through value.
    Raw(&'a Value),
    /// The explicit missing-value marker.
    Missing,
}

impl<'a> Cell<'a> {
    fn text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }

    /// Returns true for [`Cell::Missing`] and for pass-through nulls.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing | Self::Raw(Value::Null))
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Time(t) => f.write_str(&t.fixed_offset().to_rfc3339()),
            Self::Raw(Value::String(s)) => f.write_str(s),
            Self::Raw(Value::Null) | Self::Missing => Ok(()),
            Self::Raw(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Time(t) => serializer.serialize_str(&t.fixed_offset().to_rfc3339()),
            Self::Raw(v) => v.serialize(serializer),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

// ============================================================================
// Result Set
// ============================================================================

/// Ordered records with a stable column header list.
///
/// The header always starts with [`STANDARD_COLUMNS`], followed by
/// pass-through columns in the order they first arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    records: Vec<EarningsRecord>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ResultSet {
    /// Creates an empty result set with the standard header.
    pub fn empty() -> Self {
        Self {
            columns: STANDARD_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            records: Vec::new(),
        }
    }

    /// Creates a result set from records.
    ///
    /// `extra_columns` lists pass-through columns known up front (even when
    /// no record carries them); extras found on records are appended after.
    pub fn new(extra_columns: impl IntoIterator<Item = String>, records: Vec<EarningsRecord>) -> Self {
        let mut set = Self::empty();
        for column in extra_columns {
            set.push_column(column);
        }
        for record in records {
            set.push(record);
        }
        set
    }

    /// Appends a record, extending the header with any new pass-through
    /// columns it carries.
    pub fn push(&mut self, record: EarningsRecord) {
        for (name, _) in &record.extra {
            self.push_column(name.clone());
        }
        self.records.push(record);
    }

    /// Appends all records of `other`.
    pub fn merge(&mut self, other: ResultSet) {
        for column in other.columns {
            self.push_column(column);
        }
        self.records.extend(other.records);
    }

    fn push_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    /// Column header, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records, in arrival order.
    pub fn records(&self) -> &[EarningsRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps only the first `n` records.
    pub fn truncate(&mut self, n: usize) {
        self.records.truncate(n);
    }

    /// Iterates rows as cells aligned with [`ResultSet::columns`].
    pub fn rows(&self) -> impl Iterator<Item = Vec<Cell<'_>>> + '_ {
        self.records
            .iter()
            .map(|record| self.columns.iter().map(|c| record.cell(c)).collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = EarningsRecord;
    type IntoIter = std::vec::IntoIter<EarningsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

struct RecordView<'a> {
    columns: &'a [String],
    record: &'a EarningsRecord,
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column, &self.record.cell(column))?;
        }
        map.end()
    }
}

struct RecordsView<'a>(&'a ResultSet);

impl Serialize for RecordsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.records.len()))?;
        for record in &self.0.records {
            seq.serialize_element(&RecordView {
                columns: &self.0.columns,
                record,
            })?;
        }
        seq.end()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("columns", &self.columns)?;
        map.serialize_entry("records", &RecordsView(self))?;
        map.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
