use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub item_count: u64,
}

/// Parameters of one `/catalog/search` call.
///
/// `query` and `category_id` are left out of the query string when unset, so a
/// cleared filter produces a request with neither parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub category_id: Option<i64>,
    pub limit: u32,
    pub offset: u64,
}

impl SearchQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Item {
    /// Date part of `created_at`; the server emits either `YYYY-MM-DD HH:MM:SS` or RFC 3339.
    pub fn created_date(&self) -> Option<&str> {
        let raw = self.created_at.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(raw.split(['T', ' ']).next().unwrap_or(raw))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<Item>,
    pub total: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ItemProperty {
    pub property: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EventStat {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ItemDetails {
    pub item: Item,
    #[serde(default)]
    pub properties: Vec<ItemProperty>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub event_stats: Vec<EventStat>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreatedUser {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    View,
    AddToCart,
    Transaction,
    Rate,
}

impl EventType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "view" => Some(Self::View),
            "addtocart" => Some(Self::AddToCart),
            "transaction" => Some(Self::Transaction),
            "rate" => Some(Self::Rate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::AddToCart => "addtocart",
            Self::Transaction => "transaction",
            Self::Rate => "rate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::View => "Viewed",
            Self::AddToCart => "Added to cart",
            Self::Transaction => "Purchased",
            Self::Rate => "Rated",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::View => "👁️",
            Self::AddToCart => "🛒",
            Self::Transaction => "💰",
            Self::Rate => "⭐",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /events/`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NewEvent {
    pub user_id: i64,
    pub item_id: i64,
    pub event_type: EventType,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SystemStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_events: u64,
    #[serde(default)]
    pub total_categories: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PopularItem {
    pub item_id: i64,
    pub event_count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActiveUser {
    pub user_id: i64,
    pub event_count: u64,
}

/// Event timestamps arrive as epoch milliseconds or as a formatted string
/// depending on which backend route produced them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => match Local.timestamp_millis_opt(*ms).single() {
                Some(dt) => write!(f, "{}", format_local(dt)),
                None => write!(f, "{ms}"),
            },
            Self::Text(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(dt) => write!(f, "{}", format_local(dt.with_timezone(&Local))),
                Err(_) => f.write_str(raw),
            },
        }
    }
}

fn format_local(dt: DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RecentEvent {
    pub event_type: String,
    pub user_id: i64,
    pub item_id: i64,
    pub timestamp: Timestamp,
}

impl RecentEvent {
    pub fn known_type(&self) -> Option<EventType> {
        EventType::parse(&self.event_type)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RecommendedItem {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub score: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(from = "RecommendationsWire")]
pub struct Recommendations {
    pub items: Vec<RecommendedItem>,
}

// `{items: [...]}` from the demo gateway, or the scoring router's bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecommendationsWire {
    Wrapped {
        #[serde(default)]
        items: Vec<RecommendedItem>,
    },
    Scored(Vec<ScoredItem>),
}

#[derive(Deserialize)]
struct ScoredItem {
    item_id: i64,
    score: f64,
}

impl From<RecommendationsWire> for Recommendations {
    fn from(wire: RecommendationsWire) -> Self {
        match wire {
            RecommendationsWire::Wrapped { items } => Self { items },
            RecommendationsWire::Scored(scored) => Self {
                items: scored
                    .into_iter()
                    .map(|s| RecommendedItem {
                        id: s.item_id,
                        name: None,
                        score: s.score,
                    })
                    .collect(),
            },
        }
    }
}

fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
