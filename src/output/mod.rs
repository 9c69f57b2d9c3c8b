pub mod json;
pub mod text;

use serde::Serialize;

use crate::api::{Category, ItemDetails, Item, RecommendedItem};
use crate::catalog::{DisplayRange, Layout, Pagination};
use crate::panels::analytics::{AnalyticsSnapshot, AnalyticsWidget};

pub use json::JsonView;
pub use text::TerminalView;

/// One widget repaint. Views decide how each one looks; the session only says what changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum Update {
    CatalogLoading,
    CatalogItems {
        items: Vec<Item>,
        layout: Layout,
    },
    CatalogError {
        message: String,
    },
    PageInfo {
        pagination: Pagination,
    },
    CatalogCount {
        range: DisplayRange,
    },
    LayoutChanged {
        layout: Layout,
    },
    Categories {
        categories: Vec<Category>,
    },
    ModalLoading {
        item_id: i64,
    },
    ModalDetails {
        details: ItemDetails,
    },
    ModalError {
        item_id: i64,
        message: String,
    },
    ModalClosed,
    Notice {
        message: String,
    },
    AnalyticsLoading,
    Analytics {
        snapshot: AnalyticsSnapshot,
    },
    AnalyticsError {
        widget: AnalyticsWidget,
        message: String,
    },
    UserCreating,
    UserCreated {
        user_id: i64,
    },
    UserError {
        message: String,
    },
    RecommendationsLoading {
        user_id: String,
    },
    Recommendations {
        user_id: String,
        items: Vec<RecommendedItem>,
    },
    RecommendationsError {
        message: String,
    },
    Message {
        text: String,
    },
}

pub trait View {
    fn render(&mut self, update: Update);
}

impl<V: View + ?Sized> View for Box<V> {
    fn render(&mut self, update: Update) {
        (**self).render(update)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}
