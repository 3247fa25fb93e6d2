//! Visualization query builder.
//!
//! The endpoint takes a JSON body with paging, sorting, a field list and a
//! nested filter tree:
//!
//! ```json
//! {
//!   "offset": 0,
//!   "size": 250,
//!   "sortField": "intradaymarketcap",
//!   "sortType": "DESC",
//!   "entityIdType": "sp_earnings",
//!   "includeFields": ["ticker", "companyshortname", "..."],
//!   "query": {
//!     "operator": "and",
//!     "operands": [
//!       {"operator": "gte", "operands": ["startdatetime", "2024-04-05"]},
//!       {"operator": "lt", "operands": ["startdatetime", "2024-04-06"]},
//!       {"operator": "eq", "operands": ["region", "us"]},
//!       {"operator": "or", "operands": [
//!         {"operator": "eq", "operands": ["eventtype", "EAD"]},
//!         {"operator": "eq", "operands": ["eventtype", "ERA"]}
//!       ]}
//!     ]
//!   }
//! }
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Largest page the endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Default region filter.
pub const DEFAULT_REGION: &str = "us";

/// Entity type for earnings events.
pub const ENTITY_ID_TYPE: &str = "sp_earnings";

/// Largest market cap first.
pub const SORT_DESCENDING: &str = "DESC";

/// Event types that count as earnings reports.
pub const EVENT_TYPES: [&str; 2] = ["EAD", "ERA"];

/// Remote field identifiers.
pub mod fields {
    /// Ticker symbol.
    pub const TICKER: &str = "ticker";
    /// Company short name.
    pub const COMPANY: &str = "companyshortname";
    /// Fiscal quarter/year label.
    pub const EVENT_NAME: &str = "eventname";
    /// Report time (epoch milliseconds).
    pub const START_DATETIME: &str = "startdatetime";
    /// Report timing code.
    pub const START_DATETIME_TYPE: &str = "startdatetimetype";
    /// EPS estimate.
    pub const EPS_ESTIMATE: &str = "epsestimate";
    /// Reported EPS.
    pub const EPS_ACTUAL: &str = "epsactual";
    /// EPS surprise percent.
    pub const EPS_SURPRISE_PCT: &str = "epssurprisepct";
    /// Intraday market cap.
    pub const MARKET_CAP: &str = "intradaymarketcap";
    /// Region (filter only).
    pub const REGION: &str = "region";
    /// Event type (filter only).
    pub const EVENT_TYPE: &str = "eventtype";
}

/// Fields requested from the endpoint, in request order.
pub const INCLUDE_FIELDS: [&str; 9] = [
    fields::TICKER,
    fields::COMPANY,
    fields::EVENT_NAME,
    fields::START_DATETIME,
    fields::START_DATETIME_TYPE,
    fields::EPS_ESTIMATE,
    fields::EPS_ACTUAL,
    fields::EPS_SURPRISE_PCT,
    fields::MARKET_CAP,
];

// ============================================================================
// Filter Expression
// ============================================================================

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// All operands hold.
    And,
    /// Any operand holds.
    Or,
    /// Field is greater than or equal to the literal.
    Gte,
    /// Field is less than the literal.
    Lt,
    /// Field equals the literal.
    Eq,
}

/// One operand of a [`FilterExpression`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    /// A nested expression.
    Expression(FilterExpression),
    /// A field reference.
    Field(String),
    /// A literal value.
    Literal(Value),
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterExpression {
    operator: Operator,
    operands: Vec<Operand>,
}

impl FilterExpression {
    fn comparison(operator: Operator, field: &str, literal: impl Into<Value>) -> Self {
        Self {
            operator,
            operands: vec![Operand::Field(field.to_string()), Operand::Literal(literal.into())],
        }
    }

    /// `field >= literal`.
    pub fn gte(field: &str, literal: impl Into<Value>) -> Self {
        Self::comparison(Operator::Gte, field, literal)
    }

    /// `field < literal`.
    pub fn lt(field: &str, literal: impl Into<Value>) -> Self {
        Self::comparison(Operator::Lt, field, literal)
    }

    /// `field == literal`.
    pub fn eq(field: &str, literal: impl Into<Value>) -> Self {
        Self::comparison(Operator::Eq, field, literal)
    }

    /// Conjunction of `expressions`.
    pub fn and(expressions: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self {
            operator: Operator::And,
            operands: expressions.into_iter().map(Operand::Expression).collect(),
        }
    }

    /// Disjunction of `expressions`.
    pub fn or(expressions: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self {
            operator: Operator::Or,
            operands: expressions.into_iter().map(Operand::Expression).collect(),
        }
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The operands.
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

// ============================================================================
// Query Request
// ============================================================================

/// POST body of the visualization endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Row offset.
    pub offset: u32,
    /// Page size, never above [`MAX_PAGE_SIZE`].
    pub size: u32,
    /// Sort field.
    pub sort_field: String,
    /// Sort direction.
    pub sort_type: String,
    /// Entity type.
    pub entity_id_type: String,
    /// Requested fields.
    pub include_fields: Vec<String>,
    /// Filter tree.
    pub query: FilterExpression,
}

// ============================================================================
// Query Builder
// ============================================================================

/// Builds the [`QueryRequest`] for one calendar date.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    date: NaiveDate,
    region: String,
    size: u32,
    offset: u32,
}

impl QueryBuilder {
    /// Starts a query for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            region: DEFAULT_REGION.to_string(),
            size: MAX_PAGE_SIZE,
            offset: 0,
        }
    }

    /// Sets the region filter.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the page size. Values outside `1..=250` are clamped.
    pub fn size(mut self, size: u32) -> Self {
        self.size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Sets the row offset.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Builds the request body.
    ///
    /// Events on `[date, date + 1)` in the region, earnings event types
    /// only, largest market cap first.
    pub fn build(&self) -> QueryRequest {
        let next_day = self.date.succ_opt().unwrap_or(self.date);

        let query = FilterExpression::and([
            FilterExpression::gte(fields::START_DATETIME, format_date(self.date)),
            FilterExpression::lt(fields::START_DATETIME, format_date(next_day)),
            FilterExpression::eq(fields::REGION, self.region.as_str()),
            FilterExpression::or(
                EVENT_TYPES
                    .iter()
                    .map(|event| FilterExpression::eq(fields::EVENT_TYPE, *event)),
            ),
        ]);

        QueryRequest {
            offset: self.offset,
            size: self.size,
            sort_field: fields::MARKET_CAP.to_string(),
            sort_type: SORT_DESCENDING.to_string(),
            entity_id_type: ENTITY_ID_TYPE.to_string(),
            include_fields: INCLUDE_FIELDS.iter().map(|f| (*f).to_string()).collect(),
            query,
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Tests
// ============================================================================
