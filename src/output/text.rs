use std::fmt::Write as _;
use std::io::Write;

use colored::{ColoredString, Colorize};

use super::{Update, View};
use crate::api::{Category, EventType, Item, ItemDetails, RecentEvent, RecommendedItem};
use crate::catalog::{DisplayRange, Layout, Pagination};
use crate::panels::analytics::{bar_fractions, AnalyticsSnapshot, AnalyticsWidget};

const GRID_COLUMNS: usize = 3;
const BAR_WIDTH: usize = 30;

/// Colored, human-readable rendering for an interactive terminal.
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: String) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, update: Update) {
        let text = render_update(&update);
        self.emit(text);
    }
}

fn tag(label: &str, color: fn(ColoredString) -> ColoredString) -> String {
    format!(
        "{}{}{}",
        "[".bold().white(),
        color(label.bold()),
        "]".bold().white()
    )
}

fn info(msg: &str) -> String {
    format!("{} {}\n", tag("INF", |s| s.blue()), msg)
}

fn error(msg: &str) -> String {
    format!("{} ❌ {}\n", tag("ERR", |s| s.red()), msg.red())
}

fn success(msg: &str) -> String {
    format!("{} ✅ {}\n", tag("OK", |s| s.green()), msg.green())
}

fn loading(msg: &str) -> String {
    format!("{} {}\n", tag("...", |s| s.yellow()), msg.dimmed())
}

fn heading(title: &str) -> String {
    format!("\n:: {} ::\n", title.bold().white())
}

pub(crate) fn render_update(update: &Update) -> String {
    match update {
        Update::CatalogLoading => loading("Searching items..."),
        Update::CatalogItems { items, layout } => render_items(items, *layout),
        Update::CatalogError { message } => error(message),
        Update::PageInfo { pagination } => render_pagination(pagination),
        Update::CatalogCount { range } => render_count(range),
        Update::LayoutChanged { layout } => info(&format!(
            "Layout: {}",
            match layout {
                Layout::Grid => "grid",
                Layout::List => "list",
            }
        )),
        Update::Categories { categories } => render_categories(categories),
        Update::ModalLoading { item_id } => {
            let mut out = heading(&format!("Item {item_id}"));
            out.push_str(&loading("Loading item details..."));
            out
        }
        Update::ModalDetails { details } => render_details(details),
        Update::ModalError { item_id, message } => {
            error(&format!("Failed to load details for item {item_id}: {message}"))
        }
        Update::ModalClosed => info("Item details closed"),
        Update::Notice { message } => success(message),
        Update::AnalyticsLoading => loading("Refreshing analytics..."),
        Update::Analytics { snapshot } => render_analytics(snapshot),
        Update::AnalyticsError { widget, message } => {
            let name = match widget {
                AnalyticsWidget::PopularItems => "Popular items",
                AnalyticsWidget::ActiveUsers => "Active users",
                AnalyticsWidget::RecentEvents => "Recent events",
            };
            error(&format!("{name}: {message}"))
        }
        Update::UserCreating => loading("Creating user..."),
        Update::UserCreated { user_id } => {
            success(&format!("User created with ID: {}", user_id.to_string().bold()))
        }
        Update::UserError { message } => error(message),
        Update::RecommendationsLoading { user_id } => {
            loading(&format!("Fetching recommendations for user {user_id}..."))
        }
        Update::Recommendations { user_id, items } => render_recommendations(user_id, items),
        Update::RecommendationsError { message } => error(message),
        Update::Message { text } => format!("{text}\n"),
    }
}

fn item_date(item: &Item) -> &str {
    item.created_date().unwrap_or("unknown")
}

fn render_items(items: &[Item], layout: Layout) -> String {
    if items.is_empty() {
        return format!("{}\n", "No items found".dimmed());
    }
    let mut out = String::new();
    match layout {
        Layout::Grid => {
            for row in items.chunks(GRID_COLUMNS) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|item| {
                        format!(
                            "{} {:<10}",
                            format!("#{:<8}", item.id).bold().blue(),
                            item_date(item)
                        )
                    })
                    .collect();
                let _ = writeln!(out, "  {}", cells.join("  │  "));
            }
        }
        Layout::List => {
            for item in items {
                let _ = writeln!(
                    out,
                    "  {}  Item {:<8} created {:<10}  [view {id}] [cart {id}]",
                    format!("#{:<8}", item.id).bold().blue(),
                    item.id,
                    item_date(item),
                    id = item.id
                );
            }
        }
    }
    out
}

fn render_pagination(p: &Pagination) -> String {
    let prev = if p.prev_disabled {
        "‹ prev".dimmed()
    } else {
        "‹ prev".bold().white()
    };
    let next = if p.next_disabled {
        "next ›".dimmed()
    } else {
        "next ›".bold().white()
    };
    format!(
        "  {prev}   Page {} of {}   {next}\n",
        p.current_page,
        p.total_pages.max(1)
    )
}

fn render_count(range: &DisplayRange) -> String {
    format!(
        "  Showing {}-{} of {} items\n",
        range.start, range.end, range.total
    )
}

fn render_categories(categories: &[Category]) -> String {
    let mut out = heading("Categories");
    if categories.is_empty() {
        out.push_str(&format!("  {}\n", "No categories".dimmed()));
        return out;
    }
    for c in categories {
        let _ = writeln!(
            out,
            "  {:>6}  {} ({})",
            c.id.to_string().bold().blue(),
            c.name,
            c.item_count
        );
    }
    out
}

fn render_details(details: &ItemDetails) -> String {
    let mut out = heading(&format!("Item {}", details.item.id));
    let _ = writeln!(out, "  ID:       {}", details.item.id);
    let _ = writeln!(
        out,
        "  Category: {}",
        details
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown")
    );
    if !details.properties.is_empty() {
        let _ = writeln!(out, "  {}", "Properties".bold());
        for prop in &details.properties {
            let _ = writeln!(out, "    {:<16} {}", prop.property.dimmed(), prop.value);
        }
    }
    if !details.event_stats.is_empty() {
        let _ = writeln!(out, "  {}", "Activity".bold());
        for stat in &details.event_stats {
            let _ = writeln!(out, "    {}: {} events", stat.kind, stat.count);
        }
    }
    out
}

fn render_bar_chart(out: &mut String, rows: &[(i64, u64)]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  {}", "No data to display".dimmed());
        return;
    }
    let values: Vec<u64> = rows.iter().map(|(_, v)| *v).collect();
    for ((id, value), fraction) in rows.iter().zip(bar_fractions(&values)) {
        let width = (fraction * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "  ID {:<8} {:<bw$} {}",
            id,
            "█".repeat(width).cyan(),
            value,
            bw = BAR_WIDTH
        );
    }
}

fn render_events(out: &mut String, events: &[RecentEvent]) {
    if events.is_empty() {
        let _ = writeln!(out, "  {}", "No events to display".dimmed());
        return;
    }
    for event in events {
        let (icon, name) = match event.known_type() {
            Some(t) => (t.icon(), t.label().to_string()),
            None => ("📝", event.event_type.clone()),
        };
        let _ = writeln!(
            out,
            "  {icon} {:<14} user {} → item {}  {}",
            name,
            event.user_id,
            event.item_id,
            event.timestamp.to_string().dimmed()
        );
    }
}

fn render_analytics(snapshot: &AnalyticsSnapshot) -> String {
    let mut out = heading("Analytics");
    let s = &snapshot.stats;
    let _ = writeln!(
        out,
        "  users {}  items {}  events {}  categories {}",
        s.total_users.to_string().bold(),
        s.total_items.to_string().bold(),
        s.total_events.to_string().bold(),
        s.total_categories.to_string().bold()
    );

    let _ = writeln!(out, "  {}", "Popular items".bold());
    let rows: Vec<(i64, u64)> = snapshot
        .popular_items
        .iter()
        .map(|p| (p.item_id, p.event_count))
        .collect();
    render_bar_chart(&mut out, &rows);

    let _ = writeln!(out, "  {}", "Active users".bold());
    let rows: Vec<(i64, u64)> = snapshot
        .active_users
        .iter()
        .map(|u| (u.user_id, u.event_count))
        .collect();
    render_bar_chart(&mut out, &rows);

    let _ = writeln!(out, "  {}", "Recent events".bold());
    render_events(&mut out, &snapshot.recent_events);
    out
}

fn render_recommendations(user_id: &str, items: &[RecommendedItem]) -> String {
    let mut out = heading(&format!("Recommendations for user {user_id}"));
    if items.is_empty() {
        let _ = writeln!(
            out,
            "  🤷 {}",
            "No recommendations for this user yet.".dimmed()
        );
        return out;
    }
    for item in items {
        let _ = writeln!(
            out,
            "  🛍️ {} (ID: {})  ⭐ score {:.4}",
            item.name.as_deref().unwrap_or("Item").bold(),
            item.id,
            item.score
        );
    }
    out
}

/// One-line description of an event type, for help text.
pub fn event_legend() -> String {
    [
        EventType::View,
        EventType::AddToCart,
        EventType::Transaction,
        EventType::Rate,
    ]
    .iter()
    .map(|t| format!("{} {}", t.icon(), t.label()))
    .collect::<Vec<_>>()
    .join("  ")
}
