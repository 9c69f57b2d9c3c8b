//! Fetches the first two catalog pages and the analytics dashboard without the CLI.
//!
//! ```text
//! cargo run --example browse -- http://localhost:8000/ lamp
//! ```

use std::time::Duration;

use storefront::api::HttpApi;
use storefront::catalog::{CatalogController, Layout};
use storefront::output::TerminalView;
use storefront::panels::analytics::{self, AnalyticsLimits};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:8000/".to_string());
    let query = args.next().unwrap_or_default();

    let api = HttpApi::new(&base_url, Some(Duration::from_secs(10)))?;
    let mut view = TerminalView::new(std::io::stdout());

    let result = analytics::load_analytics(&api, AnalyticsLimits::default()).await;
    analytics::render_result(&mut view, result);

    let mut catalog = CatalogController::default();
    catalog.toggle_view(Layout::List, &mut view);
    let ticket = catalog.set_query(&query);
    catalog.fetch(ticket, &api, &mut view).await;

    if let Some(ticket) = catalog.next_page() {
        catalog.fetch(ticket, &api, &mut view).await;
    }
    Ok(())
}
