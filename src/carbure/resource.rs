use fake::Dummy;
use serde::{Deserialize, Serialize};

/// Paginated envelope returned by every list endpoint.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of pages needed to show `count` rows `limit` at a time.
    ///
    pub fn page_count(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.count.div_ceil(u64::from(limit))
    }
}

/// Defines a biofuel balance line, one per sector, biofuel and customs
/// category.
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub sector: String,
    pub biofuel: Option<String>,
    pub customs_category: Option<String>,
    pub initial_balance: f64,
    pub available_balance: f64,
    pub pending_teneur: f64,
}

/// Defines an operation on a balance (cession, transfer, export,
/// devaluation...).
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub sector: String,
    pub biofuel: Option<String>,
    pub customs_category: Option<String>,
    pub quantity: f64,
    pub credited_entity: Option<String>,
    pub debited_entity: Option<String>,
    pub created_at: String,
}

/// Defines a SAF ticket.
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub carbure_id: String,
    pub status: String,
    pub period: u32,
    pub feedstock: Option<String>,
    pub volume: f64,
    pub supplier: Option<String>,
    pub client: Option<String>,
    pub created_at: String,
}

/// A value a filter can take, with its display label.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilterOption")]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Filter options come either as bare strings or as labelled values.
///
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilterOption {
    Plain(String),
    Labelled { value: String, label: Option<String> },
}

impl From<RawFilterOption> for FilterOption {
    fn from(raw: RawFilterOption) -> Self {
        match raw {
            RawFilterOption::Plain(value) => FilterOption {
                label: value.clone(),
                value,
            },
            RawFilterOption::Labelled { value, label } => FilterOption {
                label: label.unwrap_or_else(|| value.clone()),
                value,
            },
        }
    }
}
