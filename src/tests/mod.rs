pub(crate) mod support;


use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::api::EventType;
use crate::catalog::{ItemAction, Layout};
use crate::output::Update;
use crate::panels::recommendations::EMPTY_USER_ID;
use crate::session::{Action, Session, SessionConfig};

use support::{Call, MockApi, RecordingView};

fn session(api: &Arc<MockApi>) -> Session<MockApi, RecordingView> {
    let config = SessionConfig {
        analytics_delay: Duration::ZERO,
        ..SessionConfig::default()
    };
    Session::new(Arc::clone(api), RecordingView::default(), config)
}

async fn started(api: &Arc<MockApi>) -> Session<MockApi, RecordingView> {
    let mut s = session(api);
    s.start();
    s.drain().await;
    s
}

fn cart(item_id: Option<i64>) -> Action {
    Action::Record {
        action: ItemAction::Cart,
        item_id,
    }
}

#[tokio::test]
async fn start_loads_dashboard_categories_and_first_page() {
    let api = Arc::new(MockApi::new(25));
    let s = started(&api).await;

    assert_eq!(api.count(|c| *c == Call::Stats), 1);
    assert!(api.calls().contains(&Call::PopularItems(8)));
    assert!(api.calls().contains(&Call::ActiveUsers(8)));
    assert!(api.calls().contains(&Call::RecentEvents(15)));
    assert_eq!(api.count(|c| *c == Call::Categories), 1);

    let searches = api.searches();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].limit, 12);
    assert_eq!(searches[0].offset, 0);

    let view = s.view();
    assert_eq!(view.count(|u| matches!(u, Update::Analytics { .. })), 1);
    assert_eq!(view.count(|u| matches!(u, Update::Categories { .. })), 1);
    assert_eq!(
        view.count(|u| matches!(u, Update::CatalogItems { items, .. } if items.len() == 12)),
        1
    );
    assert_eq!(s.catalog().state().total(), 25);
}

#[tokio::test]
async fn cart_without_user_creates_user_then_event() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.run_script([cart(Some(5))]).await;

    let calls = api.calls();
    let created = calls.iter().position(|c| *c == Call::CreateUser).unwrap();
    let recorded = calls
        .iter()
        .position(|c| matches!(c, Call::RecordEvent(_)))
        .unwrap();
    assert!(created < recorded);
    match &calls[recorded] {
        Call::RecordEvent(event) => {
            assert_eq!(event.user_id, 77);
            assert_eq!(event.item_id, 5);
            assert_eq!(event.event_type, EventType::AddToCart);
            assert!(event.timestamp > 0);
        }
        other => panic!("unexpected call {other:?}"),
    }

    assert_eq!(s.catalog().state().current_user_id(), Some(77));
    assert!(s.view().updates.contains(&Update::Notice {
        message: "Item 5 added to cart".into()
    }));
    // the recorded event schedules an analytics refresh
    assert_eq!(api.count(|c| *c == Call::Stats), 1);
}

#[tokio::test]
async fn concurrent_actions_share_one_ephemeral_user() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.dispatch(cart(Some(1)));
    s.dispatch(Action::Record {
        action: ItemAction::View,
        item_id: Some(2),
    });
    s.drain().await;
    s.dispatch(cart(Some(3)));
    s.drain().await;

    assert_eq!(api.count(|c| *c == Call::CreateUser), 1);
    assert_eq!(
        api.count(|c| matches!(c, Call::RecordEvent(e) if e.user_id == 77)),
        3
    );
}

#[tokio::test]
async fn failed_event_is_not_surfaced() {
    let api = Arc::new(MockApi::new(25));
    api.fail_events.store(true, Ordering::SeqCst);
    let mut s = session(&api);
    s.run_script([cart(Some(5))]).await;

    assert_eq!(api.count(|c| matches!(c, Call::RecordEvent(_))), 1);
    assert!(s.view().updates.is_empty());
}

#[tokio::test]
async fn view_and_cart_default_to_open_item() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    s.dispatch(Action::OpenItem(8));
    s.drain().await;
    assert_eq!(s.open_item(), Some(8));
    assert!(s
        .view()
        .updates
        .iter()
        .any(|u| matches!(u, Update::ModalDetails { details } if details.item.id == 8)));

    s.dispatch(Action::Record {
        action: ItemAction::View,
        item_id: None,
    });
    s.drain().await;
    assert_eq!(
        api.count(|c| matches!(c, Call::RecordEvent(e) if e.item_id == 8 && e.event_type == EventType::View)),
        1
    );

    s.dispatch(Action::CloseModal);
    assert_eq!(s.view().updates.last(), Some(&Update::ModalClosed));
    s.dispatch(cart(None));
    assert!(matches!(s.view().updates.last(), Some(Update::Message { .. })));
    assert!(!s.has_pending());
}

#[tokio::test]
async fn details_for_a_replaced_item_are_dropped() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.dispatch(Action::OpenItem(3));
    s.dispatch(Action::OpenItem(4));
    s.drain().await;

    let shown: Vec<i64> = s
        .view()
        .updates
        .iter()
        .filter_map(|u| match u {
            Update::ModalDetails { details } => Some(details.item.id),
            _ => None,
        })
        .collect();
    assert_eq!(shown, vec![4]);
}

#[tokio::test]
async fn empty_recommendation_user_issues_no_request() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.run_script([Action::Recommend(None), Action::Recommend(Some("   ".into()))])
        .await;

    assert_eq!(api.count(|c| matches!(c, Call::Recommendations(_))), 0);
    assert_eq!(
        s.view().count(|u| *u
            == Update::RecommendationsError {
                message: EMPTY_USER_ID.into()
            }),
        2
    );
}

#[tokio::test]
async fn new_user_prefills_recommendations() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.run_script([Action::CreateUser, Action::Recommend(None)]).await;

    assert!(s.view().updates.contains(&Update::UserCreated { user_id: 77 }));
    assert_eq!(s.recommendation_user(), Some("77"));
    assert!(api.calls().contains(&Call::Recommendations("77".into())));
    assert!(s
        .view()
        .updates
        .iter()
        .any(|u| matches!(u, Update::Recommendations { user_id, items } if user_id == "77" && items.len() == 1)));
    // user creation refreshes analytics
    assert_eq!(api.count(|c| *c == Call::Stats), 1);
}

#[tokio::test]
async fn analytics_failure_marks_each_chart() {
    let api = Arc::new(MockApi::new(25));
    api.fail_analytics.store(true, Ordering::SeqCst);
    let s = started(&api).await;

    assert_eq!(
        s.view()
            .count(|u| matches!(u, Update::AnalyticsError { .. })),
        3
    );
    assert_eq!(s.view().count(|u| matches!(u, Update::Analytics { .. })), 0);
    // the catalog is unaffected
    assert_eq!(s.catalog().state().total(), 25);
}

#[tokio::test]
async fn failed_search_keeps_total() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    s.dispatch(Action::NextPage);
    s.drain().await;

    api.fail_search.store(true, Ordering::SeqCst);
    s.dispatch(Action::NextPage);
    s.drain().await;

    assert_eq!(s.catalog().state().total(), 25);
    assert!(matches!(
        s.view().updates.last(),
        Some(Update::CatalogError { message }) if message == "Failed to load items: backend unavailable"
    ));
}

#[tokio::test]
async fn shrinking_catalog_reloads_the_last_valid_page() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    s.dispatch(Action::NextPage);
    s.drain().await;

    api.total.store(10, Ordering::SeqCst);
    s.dispatch(Action::NextPage);
    s.drain().await;

    let offsets: Vec<u64> = api.searches().iter().map(|q| q.offset).collect();
    assert_eq!(offsets, vec![0, 12, 24, 0]);
    assert_eq!(s.catalog().state().current_page(), 1);
    assert!(matches!(
        s.view().updates.last(),
        Some(Update::CatalogCount { range }) if range.start == 1 && range.end == 10 && range.total == 10
    ));
    assert!(!s.view().updates.iter().any(
        |u| matches!(u, Update::CatalogCount { range } if range.start > range.end)
    ));
}

#[tokio::test]
async fn paging_walks_to_the_last_page_and_stops() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    s.run_script([
        Action::NextPage,
        Action::NextPage,
        Action::NextPage,
        Action::PrevPage,
    ])
    .await;

    let offsets: Vec<u64> = api.searches().iter().map(|q| q.offset).collect();
    // the third next is a no-op on page 3 of 3
    assert_eq!(offsets, vec![0, 12, 24, 12]);
    assert_eq!(s.catalog().state().current_page(), 2);
}

#[tokio::test]
async fn toggle_view_issues_no_request() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    let before = api.calls().len();

    s.dispatch(Action::ToggleView(Layout::List));
    assert!(!s.has_pending());
    assert_eq!(api.calls().len(), before);

    let updates = &s.view().updates;
    assert!(matches!(
        &updates[updates.len() - 1],
        Update::CatalogItems { items, layout: Layout::List } if items.len() == 12
    ));
}

#[tokio::test]
async fn clear_filters_sends_no_query_or_category() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    s.run_script([
        Action::Search("shoes".into()),
        Action::Category(Some(4)),
        Action::ClearFilters,
    ])
    .await;

    let searches = api.searches();
    let filtered = &searches[searches.len() - 2];
    assert_eq!(filtered.query.as_deref(), Some("shoes"));
    assert_eq!(filtered.category_id, Some(4));

    let cleared = &searches[searches.len() - 1];
    assert_eq!(cleared.query, None);
    assert_eq!(cleared.category_id, None);
    assert_eq!(cleared.offset, 0);
}

#[tokio::test]
async fn superseded_search_is_not_rendered() {
    let api = Arc::new(MockApi::new(25));
    let mut s = started(&api).await;
    let before = s.view().count(|u| matches!(u, Update::CatalogItems { .. }));

    s.dispatch(Action::Search("a".into()));
    s.dispatch(Action::Search("ab".into()));
    s.drain().await;

    assert_eq!(api.searches().len(), 3);
    let after = s.view().count(|u| matches!(u, Update::CatalogItems { .. }));
    assert_eq!(after - before, 1);
    assert_eq!(s.catalog().state().query(), "ab");
}

#[tokio::test]
async fn interactive_input_reports_bad_lines_and_drains_at_eof() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.run_interactive(&b"search lamp\n\nbogus 1\n"[..])
        .await
        .unwrap();

    assert_eq!(api.searches()[0].query.as_deref(), Some("lamp"));
    assert!(s
        .view()
        .updates
        .iter()
        .any(|u| matches!(u, Update::Message { text } if text.contains("unknown action 'bogus'"))));
    assert!(s
        .view()
        .updates
        .iter()
        .any(|u| matches!(u, Update::CatalogItems { .. })));
}

#[tokio::test]
async fn quit_stops_the_script() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.run_script([Action::Quit, Action::NextPage]).await;
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn help_lists_actions_and_event_legend() {
    let api = Arc::new(MockApi::new(25));
    let mut s = session(&api);
    s.dispatch(Action::Help);
    match s.view().updates.last() {
        Some(Update::Message { text }) => {
            assert!(text.contains("search [TEXT]"));
            assert!(text.contains("Added to cart"));
        }
        other => panic!("unexpected update {other:?}"),
    }
}
