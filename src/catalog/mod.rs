//! Catalog browsing: search text, category filter, offset/limit paging and the
//! grid/list toggle over the remote `/catalog/search` endpoint.
//!
//! [`CatalogController`] is synchronous. Every state change that needs fresh
//! data hands back a [`SearchTicket`]; whoever owns the controller runs the
//! request and feeds the result to [`CatalogController::apply_search`]. Tickets
//! carry a sequence number, and only the most recently issued one is ever
//! rendered, so racing page clicks cannot paint an older page over a newer one.

pub mod pagination;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::api::{ApiError, CatalogApi, EventType, Item, ItemDetails, NewEvent, SearchPage, SearchQuery};
use crate::output::{Update, View};

pub use pagination::{DisplayRange, Pagination};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Grid,
    List,
}

/// What a visitor did to an item card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAction {
    View,
    Cart,
}

impl ItemAction {
    pub fn event_type(self) -> EventType {
        match self {
            Self::View => EventType::View,
            Self::Cart => EventType::AddToCart,
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::View => "viewed",
            Self::Cart => "added to cart",
        }
    }
}

/// Backend user created on the first tracked action. Clones share the cell,
/// so concurrent actions wait on one creation instead of making several users.
#[derive(Clone, Debug, Default)]
pub struct EphemeralUser(Arc<OnceCell<i64>>);

impl EphemeralUser {
    pub fn id(&self) -> Option<i64> {
        self.0.get().copied()
    }

    pub async fn get_or_create<A: CatalogApi + ?Sized>(&self, api: &A) -> Result<i64, ApiError> {
        self.0
            .get_or_try_init(|| async {
                let user = api.create_user().await?;
                let id = user.id.ok_or(ApiError::MissingField { field: "id" })?;
                tracing::info!(user_id = id, "created ephemeral user");
                Ok(id)
            })
            .await
            .copied()
    }
}

#[derive(Clone, Debug)]
pub struct CatalogState {
    query: String,
    category_id: Option<i64>,
    current_page: u32,
    limit: u32,
    total: u64,
    is_grid_view: bool,
    current_user: EphemeralUser,
    items: Vec<Item>,
}

impl CatalogState {
    pub fn new(limit: u32) -> Self {
        Self {
            query: String::new(),
            category_id: None,
            current_page: 1,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            total: 0,
            is_grid_view: true,
            current_user: EphemeralUser::default(),
            items: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_grid_view(&self) -> bool {
        self.is_grid_view
    }

    pub fn layout(&self) -> Layout {
        if self.is_grid_view {
            Layout::Grid
        } else {
            Layout::List
        }
    }

    pub fn current_user(&self) -> &EphemeralUser {
        &self.current_user
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.current_user.id()
    }

    /// The last batch the server returned, kept for re-rendering.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn offset(&self) -> u64 {
        pagination::page_offset(self.current_page, self.limit)
    }
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: SearchQuery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Rendered,
    Failed,
    /// A newer search was issued after this one; nothing was rendered.
    Stale,
    /// The total shrank below the current page. The page was moved back to
    /// the last one and this ticket must run in place of a render.
    Refetch(SearchTicket),
}

#[derive(Debug, Default)]
pub struct CatalogController {
    state: CatalogState,
    issued_seq: u64,
}

impl CatalogController {
    pub fn new(limit: u32) -> Self {
        Self {
            state: CatalogState::new(limit),
            issued_seq: 0,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn set_query(&mut self, text: &str) -> SearchTicket {
        self.state.query = text.trim().to_string();
        self.state.current_page = 1;
        self.refresh()
    }

    pub fn set_category(&mut self, category_id: Option<i64>) -> SearchTicket {
        self.state.category_id = category_id;
        self.state.current_page = 1;
        self.refresh()
    }

    pub fn clear_filters(&mut self) -> SearchTicket {
        self.state.query.clear();
        self.state.category_id = None;
        self.state.current_page = 1;
        self.refresh()
    }

    /// `None` when already on the last page.
    pub fn next_page(&mut self) -> Option<SearchTicket> {
        if self.pagination().next_disabled {
            return None;
        }
        self.state.current_page = self.state.current_page.checked_add(1)?;
        Some(self.refresh())
    }

    /// `None` when already on the first page.
    pub fn prev_page(&mut self) -> Option<SearchTicket> {
        if self.pagination().prev_disabled {
            return None;
        }
        self.state.current_page -= 1;
        Some(self.refresh())
    }

    /// Issues a search for the current state. Any ticket issued earlier is now stale.
    pub fn refresh(&mut self) -> SearchTicket {
        self.issued_seq += 1;
        SearchTicket {
            seq: self.issued_seq,
            query: self.current_query(),
        }
    }

    pub fn current_query(&self) -> SearchQuery {
        SearchQuery {
            query: Some(self.state.query.clone()).filter(|q| !q.is_empty()),
            category_id: self.state.category_id,
            limit: self.state.limit,
            offset: self.state.offset(),
        }
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued_seq
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::compute(self.state.current_page, self.state.limit, self.state.total)
    }

    pub fn display_range(&self) -> DisplayRange {
        DisplayRange::compute(self.state.current_page, self.state.limit, self.state.total)
    }

    pub fn apply_search<V: View + ?Sized>(
        &mut self,
        seq: u64,
        result: Result<SearchPage, ApiError>,
        view: &mut V,
    ) -> SearchOutcome {
        if !self.is_latest(seq) {
            tracing::debug!(seq, latest = self.issued_seq, "discarding stale search response");
            return SearchOutcome::Stale;
        }
        match result {
            Ok(page) => {
                tracing::info!(
                    items = page.items.len(),
                    total = page.total,
                    page = self.state.current_page,
                    "catalog search completed"
                );
                self.state.total = page.total;
                let last_page = pagination::total_pages(page.total, self.state.limit).max(1);
                if u64::from(self.state.current_page) > last_page {
                    tracing::info!(
                        page = self.state.current_page,
                        last_page,
                        "page out of range after total changed, reloading last page"
                    );
                    // last_page < current_page, so it fits in u32
                    self.state.current_page = u32::try_from(last_page).unwrap_or(1);
                    self.state.items.clear();
                    return SearchOutcome::Refetch(self.refresh());
                }
                self.state.items = page.items;
                view.render(Update::CatalogItems {
                    items: self.state.items.clone(),
                    layout: self.state.layout(),
                });
                view.render(Update::PageInfo {
                    pagination: self.pagination(),
                });
                view.render(Update::CatalogCount {
                    range: self.display_range(),
                });
                SearchOutcome::Rendered
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog search failed");
                // the error replaces the item list, so there is nothing left to re-render
                self.state.items.clear();
                view.render(Update::CatalogError {
                    message: format!("Failed to load items: {e}"),
                });
                SearchOutcome::Failed
            }
        }
    }

    /// Switches layout and repaints the retained batch without a request.
    pub fn toggle_view<V: View + ?Sized>(&mut self, layout: Layout, view: &mut V) {
        self.state.is_grid_view = layout == Layout::Grid;
        view.render(Update::LayoutChanged { layout });
        if !self.state.items.is_empty() {
            view.render(Update::CatalogItems {
                items: self.state.items.clone(),
                layout,
            });
        }
    }

    /// Runs a ticket to completion against `api`. The session spawns requests
    /// instead; this is the single-caller path used by library consumers.
    pub async fn fetch<A, V>(&mut self, ticket: SearchTicket, api: &A, view: &mut V) -> SearchOutcome
    where
        A: CatalogApi + ?Sized,
        V: View + ?Sized,
    {
        let mut ticket = ticket;
        loop {
            view.render(Update::CatalogLoading);
            let result = api.search(&ticket.query).await;
            match self.apply_search(ticket.seq, result, view) {
                SearchOutcome::Refetch(next) => ticket = next,
                outcome => return outcome,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedAction {
    pub user_id: i64,
    pub item_id: i64,
    pub action: ItemAction,
}

/// Posts an interaction event, creating the ephemeral user first if needed.
pub async fn record_action<A: CatalogApi + ?Sized>(
    api: &A,
    user: &EphemeralUser,
    action: ItemAction,
    item_id: i64,
) -> Result<RecordedAction, ApiError> {
    let user_id = user.get_or_create(api).await?;
    let event = NewEvent {
        user_id,
        item_id,
        event_type: action.event_type(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    api.record_event(&event).await?;
    tracing::info!(user_id, item_id, event_type = %event.event_type, "event recorded");
    Ok(RecordedAction {
        user_id,
        item_id,
        action,
    })
}

pub async fn item_details<A: CatalogApi + ?Sized>(
    api: &A,
    item_id: i64,
) -> Result<ItemDetails, ApiError> {
    api.item_details(item_id).await
}
