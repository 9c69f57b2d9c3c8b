use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    ActiveUser, ApiError, CatalogApi, Category, CreatedUser, Item, ItemDetails, NewEvent,
    PopularItem, RecentEvent, Recommendations, RecommendedItem, SearchPage, SearchQuery,
    SystemStats, Timestamp,
};
use crate::output::{Update, View};

#[derive(Debug, Default)]
pub struct RecordingView {
    pub updates: Vec<Update>,
}

impl View for RecordingView {
    fn render(&mut self, update: Update) {
        self.updates.push(update);
    }
}

impl RecordingView {
    pub fn count(&self, pred: impl Fn(&Update) -> bool) -> usize {
        self.updates.iter().filter(|u| pred(u)).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Categories,
    Search(SearchQuery),
    ItemDetails(i64),
    CreateUser,
    RecordEvent(NewEvent),
    Stats,
    PopularItems(u32),
    ActiveUsers(u32),
    RecentEvents(u32),
    Recommendations(String),
}

/// In-memory backend: a catalog of `total` sequential item ids plus switches to fail routes.
#[derive(Debug)]
pub struct MockApi {
    pub total: AtomicU64,
    pub user_id: i64,
    pub fail_search: AtomicBool,
    pub fail_analytics: AtomicBool,
    pub fail_events: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            user_id: 77,
            fail_search: AtomicBool::new(false),
            fail_analytics: AtomicBool::new(false),
            fail_events: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn searches(&self) -> Vec<SearchQuery> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn boom() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: "backend unavailable".into(),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), ApiError> {
        if flag.load(Ordering::SeqCst) {
            Err(Self::boom())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogApi for MockApi {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.log(Call::Categories);
        Ok(vec![
            Category {
                id: 1,
                name: "Lamps".into(),
                item_count: 3,
            },
            Category {
                id: 4,
                name: "Shoes".into(),
                item_count: 9,
            },
        ])
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        self.log(Call::Search(query.clone()));
        Self::check(&self.fail_search)?;
        let total = self.total.load(Ordering::SeqCst);
        let end = (query.offset + u64::from(query.limit)).min(total);
        let items = (query.offset..end)
            .map(|i| Item {
                id: i as i64 + 1,
                created_at: Some("2015-06-02 05:02:12".into()),
            })
            .collect();
        Ok(SearchPage { items, total })
    }

    async fn item_details(&self, item_id: i64) -> Result<ItemDetails, ApiError> {
        self.log(Call::ItemDetails(item_id));
        Ok(ItemDetails {
            item: Item {
                id: item_id,
                created_at: None,
            },
            properties: Vec::new(),
            category: None,
            event_stats: Vec::new(),
        })
    }

    async fn create_user(&self) -> Result<CreatedUser, ApiError> {
        self.log(Call::CreateUser);
        // let concurrent callers overlap with the creation
        tokio::task::yield_now().await;
        Ok(CreatedUser {
            id: Some(self.user_id),
        })
    }

    async fn record_event(&self, event: &NewEvent) -> Result<(), ApiError> {
        self.log(Call::RecordEvent(event.clone()));
        Self::check(&self.fail_events)
    }

    async fn stats(&self) -> Result<SystemStats, ApiError> {
        self.log(Call::Stats);
        Self::check(&self.fail_analytics)?;
        Ok(SystemStats {
            total_users: 2,
            total_items: self.total.load(Ordering::SeqCst),
            total_events: 5,
            total_categories: 2,
        })
    }

    async fn popular_items(&self, limit: u32) -> Result<Vec<PopularItem>, ApiError> {
        self.log(Call::PopularItems(limit));
        Self::check(&self.fail_analytics)?;
        Ok(vec![PopularItem {
            item_id: 1,
            event_count: 4,
        }])
    }

    async fn active_users(&self, limit: u32) -> Result<Vec<ActiveUser>, ApiError> {
        self.log(Call::ActiveUsers(limit));
        Self::check(&self.fail_analytics)?;
        Ok(vec![ActiveUser {
            user_id: self.user_id,
            event_count: 5,
        }])
    }

    async fn recent_events(&self, limit: u32) -> Result<Vec<RecentEvent>, ApiError> {
        self.log(Call::RecentEvents(limit));
        Self::check(&self.fail_analytics)?;
        Ok(vec![RecentEvent {
            event_type: "view".into(),
            user_id: self.user_id,
            item_id: 1,
            timestamp: Timestamp::Millis(1_433_221_332_000),
        }])
    }

    async fn recommendations(&self, user_id: &str) -> Result<Recommendations, ApiError> {
        self.log(Call::Recommendations(user_id.to_string()));
        Ok(Recommendations {
            items: vec![RecommendedItem {
                id: 9,
                name: None,
                score: 0.5,
            }],
        })
    }
}
