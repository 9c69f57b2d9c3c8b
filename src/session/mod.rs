pub mod action;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

use crate::api::{ApiError, CatalogApi, Category, ItemDetails, RecommendedItem, SearchPage};
use crate::catalog::{
    self, CatalogController, ItemAction, RecordedAction, SearchOutcome, SearchTicket,
};
use crate::output::{Update, View};
use crate::panels::analytics::{self, AnalyticsLimits, AnalyticsSnapshot};
use crate::panels::{self, recommendations};

pub use action::Action;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub page_size: u32,
    pub analytics: AnalyticsLimits,
    /// Wait before re-reading analytics after a write, so the backend can aggregate it.
    pub analytics_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: catalog::DEFAULT_PAGE_SIZE,
            analytics: AnalyticsLimits::default(),
            analytics_delay: Duration::from_millis(500),
        }
    }
}

/// A finished background request, waiting to be applied on the session task.
#[derive(Debug)]
pub enum Completion {
    Search {
        seq: u64,
        result: Result<SearchPage, ApiError>,
    },
    Categories(Result<Vec<Category>, ApiError>),
    ItemDetails {
        item_id: i64,
        result: Result<ItemDetails, ApiError>,
    },
    ItemAction {
        item_id: i64,
        action: ItemAction,
        result: Result<RecordedAction, ApiError>,
    },
    Analytics(Result<AnalyticsSnapshot, ApiError>),
    UserCreated(Result<i64, ApiError>),
    Recommendations {
        user_id: String,
        result: Result<Vec<RecommendedItem>, ApiError>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the catalog controller, the view and every in-flight request.
///
/// Actions spawn their requests onto a [`JoinSet`] and return immediately;
/// results come back as [`Completion`]s and are applied one at a time, so all
/// state mutation happens on the task driving the session.
pub struct Session<A: CatalogApi + 'static, V: View> {
    api: Arc<A>,
    view: V,
    catalog: CatalogController,
    modal: Option<i64>,
    recs_user_id: Option<String>,
    config: SessionConfig,
    jobs: JoinSet<Completion>,
}

impl<A: CatalogApi + 'static, V: View> Session<A, V> {
    pub fn new(api: Arc<A>, view: V, config: SessionConfig) -> Self {
        Self {
            api,
            view,
            catalog: CatalogController::new(config.page_size),
            modal: None,
            recs_user_id: None,
            config,
            jobs: JoinSet::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn open_item(&self) -> Option<i64> {
        self.modal
    }

    pub fn recommendation_user(&self) -> Option<&str> {
        self.recs_user_id.as_deref()
    }

    pub fn has_pending(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Initial load: analytics, categories and the first catalog page.
    pub fn start(&mut self) {
        self.refresh_analytics();
        self.load_categories();
        let ticket = self.catalog.refresh();
        self.spawn_search(ticket);
    }

    pub fn dispatch(&mut self, action: Action) -> Flow {
        tracing::debug!(?action, "dispatch");
        match action {
            Action::Search(text) => {
                let ticket = self.catalog.set_query(&text);
                self.spawn_search(ticket);
            }
            Action::Category(category_id) => {
                let ticket = self.catalog.set_category(category_id);
                self.spawn_search(ticket);
            }
            Action::ClearFilters => {
                let ticket = self.catalog.clear_filters();
                self.spawn_search(ticket);
            }
            Action::NextPage => match self.catalog.next_page() {
                Some(ticket) => self.spawn_search(ticket),
                None => tracing::debug!("already on the last page"),
            },
            Action::PrevPage => match self.catalog.prev_page() {
                Some(ticket) => self.spawn_search(ticket),
                None => tracing::debug!("already on the first page"),
            },
            Action::ToggleView(layout) => self.catalog.toggle_view(layout, &mut self.view),
            Action::OpenItem(item_id) => self.select_item(item_id),
            Action::CloseModal => {
                if self.modal.take().is_some() {
                    self.view.render(Update::ModalClosed);
                }
            }
            Action::Record { action, item_id } => match item_id.or(self.modal) {
                Some(item_id) => self.record_action(action, item_id),
                None => self.view.render(Update::Message {
                    text: "No item selected; pass an item id or open one first.".to_string(),
                }),
            },
            Action::RefreshAnalytics => self.refresh_analytics(),
            Action::LoadCategories => self.load_categories(),
            Action::CreateUser => self.create_user(),
            Action::Recommend(user_id) => self.recommend(user_id),
            Action::Help => self.view.render(Update::Message {
                text: format!(
                    "{}\n\nEvents: {}",
                    action::help_text(),
                    crate::output::text::event_legend()
                ),
            }),
            Action::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Search { seq, result } => {
                if let SearchOutcome::Refetch(ticket) =
                    self.catalog.apply_search(seq, result, &mut self.view)
                {
                    self.spawn_search(ticket);
                }
            }
            Completion::Categories(Ok(categories)) => {
                tracing::info!(count = categories.len(), "categories loaded");
                self.view.render(Update::Categories { categories });
            }
            Completion::Categories(Err(e)) => {
                tracing::warn!(error = %e, "failed to load categories");
            }
            Completion::ItemDetails { item_id, result } => {
                if self.modal != Some(item_id) {
                    tracing::debug!(item_id, "details arrived for an item no longer open");
                    return;
                }
                match result {
                    Ok(details) => self.view.render(Update::ModalDetails { details }),
                    Err(e) => {
                        tracing::warn!(item_id, error = %e, "failed to load item details");
                        self.view.render(Update::ModalError {
                            item_id,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Completion::ItemAction {
                item_id,
                action,
                result,
            } => match result {
                Ok(recorded) => {
                    self.view.render(Update::Notice {
                        message: format!("Item {} {}", recorded.item_id, action.past_tense()),
                    });
                    self.schedule_analytics();
                }
                // best effort: never surfaced to the user
                Err(e) => tracing::warn!(item_id, ?action, error = %e, "failed to record item action"),
            },
            Completion::Analytics(result) => analytics::render_result(&mut self.view, result),
            Completion::UserCreated(Ok(user_id)) => {
                self.recs_user_id = Some(user_id.to_string());
                self.view.render(Update::UserCreated { user_id });
                self.schedule_analytics();
            }
            Completion::UserCreated(Err(e)) => {
                tracing::warn!(error = %e, "user creation failed");
                self.view.render(Update::UserError {
                    message: e.to_string(),
                });
            }
            Completion::Recommendations { user_id, result } => match result {
                Ok(items) => self.view.render(Update::Recommendations { user_id, items }),
                Err(e) => self.view.render(Update::RecommendationsError {
                    message: e.to_string(),
                }),
            },
        }
    }

    /// Waits for the next finished request. `None` once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            match self.jobs.join_next().await? {
                Ok(completion) => return Some(completion),
                Err(e) => tracing::warn!(error = %e, "background request aborted"),
            }
        }
    }

    /// Applies completions until nothing is in flight, including follow-ups they schedule.
    pub async fn drain(&mut self) {
        while let Some(completion) = self.next_completion().await {
            self.apply(completion);
        }
    }

    /// Runs each action to quiescence before the next, so paging sees the previous total.
    pub async fn run_script<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = Action>,
    {
        self.drain().await;
        for action in actions {
            if self.dispatch(action) == Flow::Quit {
                break;
            }
            self.drain().await;
        }
        self.shutdown().await;
    }

    /// Reads actions line by line from `input` while applying completions as they land.
    pub async fn run_interactive<R>(&mut self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        // end of input: let in-flight requests land before leaving
                        self.drain().await;
                        break;
                    };
                    match Action::parse(&line) {
                        Ok(Some(action)) => {
                            if self.dispatch(action) == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(message) => self.view.render(Update::Message { text: message }),
                    }
                }
                Some(completion) = self.next_completion(), if self.has_pending() => {
                    self.apply(completion);
                }
            }
        }
        self.shutdown().await;
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        self.jobs.shutdown().await;
    }

    fn spawn_search(&mut self, ticket: SearchTicket) {
        self.view.render(Update::CatalogLoading);
        let api = Arc::clone(&self.api);
        self.jobs.spawn(async move {
            let result = api.search(&ticket.query).await;
            Completion::Search {
                seq: ticket.seq,
                result,
            }
        });
    }

    fn load_categories(&mut self) {
        let api = Arc::clone(&self.api);
        self.jobs
            .spawn(async move { Completion::Categories(api.categories().await) });
    }

    fn select_item(&mut self, item_id: i64) {
        self.modal = Some(item_id);
        self.view.render(Update::ModalLoading { item_id });
        let api = Arc::clone(&self.api);
        self.jobs.spawn(async move {
            Completion::ItemDetails {
                item_id,
                result: catalog::item_details(api.as_ref(), item_id).await,
            }
        });
    }

    fn record_action(&mut self, action: ItemAction, item_id: i64) {
        let api = Arc::clone(&self.api);
        let user = self.catalog.state().current_user().clone();
        self.jobs.spawn(async move {
            Completion::ItemAction {
                item_id,
                action,
                result: catalog::record_action(api.as_ref(), &user, action, item_id).await,
            }
        });
    }

    fn refresh_analytics(&mut self) {
        self.view.render(Update::AnalyticsLoading);
        self.spawn_analytics(Duration::ZERO);
    }

    fn schedule_analytics(&mut self) {
        self.spawn_analytics(self.config.analytics_delay);
    }

    fn spawn_analytics(&mut self, delay: Duration) {
        let api = Arc::clone(&self.api);
        let limits = self.config.analytics;
        self.jobs.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Completion::Analytics(analytics::load_analytics(api.as_ref(), limits).await)
        });
    }

    fn create_user(&mut self) {
        self.view.render(Update::UserCreating);
        let api = Arc::clone(&self.api);
        self.jobs
            .spawn(async move { Completion::UserCreated(panels::create_user(api.as_ref()).await) });
    }

    fn recommend(&mut self, user_id: Option<String>) {
        let raw = user_id.or_else(|| self.recs_user_id.clone());
        let user_id = match recommendations::validate_user_id(raw.as_deref()) {
            Ok(user_id) => user_id,
            Err(message) => {
                self.view.render(Update::RecommendationsError {
                    message: message.to_string(),
                });
                return;
            }
        };
        self.view.render(Update::RecommendationsLoading {
            user_id: user_id.clone(),
        });
        let api = Arc::clone(&self.api);
        self.jobs.spawn(async move {
            let result = recommendations::fetch(api.as_ref(), &user_id).await;
            Completion::Recommendations { user_id, result }
        });
    }
}
