use serde::Serialize;

use crate::api::{ActiveUser, ApiError, CatalogApi, PopularItem, RecentEvent, SystemStats};
use crate::output::{Update, View};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyticsLimits {
    pub popular_items: u32,
    pub active_users: u32,
    pub recent_events: u32,
}

impl Default for AnalyticsLimits {
    fn default() -> Self {
        Self {
            popular_items: 8,
            active_users: 8,
            recent_events: 15,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
    pub stats: SystemStats,
    pub popular_items: Vec<PopularItem>,
    pub active_users: Vec<ActiveUser>,
    pub recent_events: Vec<RecentEvent>,
}

/// Chart widgets that show their own error when the batch fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsWidget {
    PopularItems,
    ActiveUsers,
    RecentEvents,
}

impl AnalyticsWidget {
    pub const ALL: [AnalyticsWidget; 3] = [
        AnalyticsWidget::PopularItems,
        AnalyticsWidget::ActiveUsers,
        AnalyticsWidget::RecentEvents,
    ];

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::PopularItems => "Failed to load popular items",
            Self::ActiveUsers => "Failed to load active users",
            Self::RecentEvents => "Failed to load events",
        }
    }
}

/// Issues the four analytics requests concurrently. Any single failure fails the batch.
pub async fn load_analytics<A: CatalogApi + ?Sized>(
    api: &A,
    limits: AnalyticsLimits,
) -> Result<AnalyticsSnapshot, ApiError> {
    let (stats, popular_items, active_users, recent_events) = futures::try_join!(
        api.stats(),
        api.popular_items(limits.popular_items),
        api.active_users(limits.active_users),
        api.recent_events(limits.recent_events),
    )?;
    Ok(AnalyticsSnapshot {
        stats,
        popular_items,
        active_users,
        recent_events,
    })
}

pub fn render_result<V: View + ?Sized>(view: &mut V, result: Result<AnalyticsSnapshot, ApiError>) {
    match result {
        Ok(snapshot) => {
            tracing::info!(
                popular = snapshot.popular_items.len(),
                active = snapshot.active_users.len(),
                recent = snapshot.recent_events.len(),
                "analytics loaded"
            );
            view.render(Update::Analytics { snapshot });
        }
        Err(e) => {
            tracing::warn!(error = %e, "analytics refresh failed");
            for widget in AnalyticsWidget::ALL {
                view.render(Update::AnalyticsError {
                    widget,
                    message: widget.failure_message().to_string(),
                });
            }
        }
    }
}

/// Bar lengths as a share of the largest value, in `0.0..=1.0`.
pub fn bar_fractions(values: &[u64]) -> Vec<f64> {
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|v| if max == 0 { 0.0 } else { *v as f64 / max as f64 })
        .collect()
}
