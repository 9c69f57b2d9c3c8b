use crate::catalog::{ItemAction, Layout};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Search(String),
    Category(Option<i64>),
    ClearFilters,
    NextPage,
    PrevPage,
    ToggleView(Layout),
    OpenItem(i64),
    CloseModal,
    /// `item_id` of `None` targets the item open in the details modal.
    Record {
        action: ItemAction,
        item_id: Option<i64>,
    },
    RefreshAnalytics,
    LoadCategories,
    CreateUser,
    Recommend(Option<String>),
    Help,
    Quit,
}

pub struct ActionEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub about: &'static str,
    build: fn(&str) -> Result<Action, String>,
}

pub const ACTIONS: &[ActionEntry] = &[
    ActionEntry {
        name: "search",
        aliases: &["s", "find"],
        usage: "search [TEXT]",
        about: "Search items by text (empty text searches everything).",
        build: |args| Ok(Action::Search(args.to_string())),
    },
    ActionEntry {
        name: "category",
        aliases: &["cat"],
        usage: "category [ID|all]",
        about: "Filter by category id; no id or 'all' removes the filter.",
        build: parse_category,
    },
    ActionEntry {
        name: "clear",
        aliases: &[],
        usage: "clear",
        about: "Reset search text and category filter.",
        build: |args| no_args(args, Action::ClearFilters),
    },
    ActionEntry {
        name: "next",
        aliases: &["n"],
        usage: "next",
        about: "Go to the next page.",
        build: |args| no_args(args, Action::NextPage),
    },
    ActionEntry {
        name: "prev",
        aliases: &["p"],
        usage: "prev",
        about: "Go to the previous page.",
        build: |args| no_args(args, Action::PrevPage),
    },
    ActionEntry {
        name: "grid",
        aliases: &[],
        usage: "grid",
        about: "Show items as a grid.",
        build: |args| no_args(args, Action::ToggleView(Layout::Grid)),
    },
    ActionEntry {
        name: "list",
        aliases: &["ls"],
        usage: "list",
        about: "Show items as a list.",
        build: |args| no_args(args, Action::ToggleView(Layout::List)),
    },
    ActionEntry {
        name: "open",
        aliases: &["o", "details"],
        usage: "open ID",
        about: "Show item details.",
        build: |args| Ok(Action::OpenItem(parse_id(args, "item id")?)),
    },
    ActionEntry {
        name: "close",
        aliases: &[],
        usage: "close",
        about: "Close item details.",
        build: |args| no_args(args, Action::CloseModal),
    },
    ActionEntry {
        name: "view",
        aliases: &["v"],
        usage: "view [ID]",
        about: "Record a view of an item (defaults to the open item).",
        build: |args| parse_record(args, ItemAction::View),
    },
    ActionEntry {
        name: "cart",
        aliases: &["c"],
        usage: "cart [ID]",
        about: "Add an item to the cart (defaults to the open item).",
        build: |args| parse_record(args, ItemAction::Cart),
    },
    ActionEntry {
        name: "analytics",
        aliases: &["stats"],
        usage: "analytics",
        about: "Refresh the analytics panel.",
        build: |args| no_args(args, Action::RefreshAnalytics),
    },
    ActionEntry {
        name: "categories",
        aliases: &["cats"],
        usage: "categories",
        about: "List categories with item counts.",
        build: |args| no_args(args, Action::LoadCategories),
    },
    ActionEntry {
        name: "new-user",
        aliases: &["user"],
        usage: "new-user",
        about: "Create a user and remember its id for recommendations.",
        build: |args| no_args(args, Action::CreateUser),
    },
    ActionEntry {
        name: "recs",
        aliases: &["recommend"],
        usage: "recs [USER_ID]",
        about: "Fetch recommendations (defaults to the last created user).",
        build: |args| {
            Ok(Action::Recommend(
                Some(args.to_string()).filter(|a| !a.is_empty()),
            ))
        },
    },
    ActionEntry {
        name: "help",
        aliases: &["h", "?"],
        usage: "help",
        about: "Show this list.",
        build: |_| Ok(Action::Help),
    },
    ActionEntry {
        name: "quit",
        aliases: &["q", "exit"],
        usage: "quit",
        about: "Leave the session.",
        build: |args| no_args(args, Action::Quit),
    },
];

impl Action {
    /// Parses `name [args]` through [`ACTIONS`]. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Action>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };
        let name = name.to_lowercase();
        let entry = lookup(&name).ok_or_else(|| {
            format!("unknown action '{name}', type 'help' for the list")
        })?;
        (entry.build)(args)
            .map(Some)
            .map_err(|e| format!("{}: {e} (usage: {})", entry.name, entry.usage))
    }
}

pub fn lookup(name: &str) -> Option<&'static ActionEntry> {
    ACTIONS
        .iter()
        .find(|entry| entry.name == name || entry.aliases.contains(&name))
}

pub fn help_text() -> String {
    let width = ACTIONS.iter().map(|a| a.usage.len()).max().unwrap_or(0);
    ACTIONS
        .iter()
        .map(|a| format!("  {:<width$}  {}", a.usage, a.about))
        .collect::<Vec<_>>()
        .join("\n")
}

fn no_args(args: &str, action: Action) -> Result<Action, String> {
    if args.is_empty() {
        Ok(action)
    } else {
        Err(format!("unexpected argument '{args}'"))
    }
}

fn parse_id(raw: &str, what: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(format!("missing {what}"));
    }
    raw.parse::<i64>()
        .map_err(|_| format!("invalid {what} '{raw}'"))
}

fn parse_category(args: &str) -> Result<Action, String> {
    if args.is_empty() || args.eq_ignore_ascii_case("all") {
        return Ok(Action::Category(None));
    }
    Ok(Action::Category(Some(parse_id(args, "category id")?)))
}

fn parse_record(args: &str, action: ItemAction) -> Result<Action, String> {
    let item_id = if args.is_empty() {
        None
    } else {
        Some(parse_id(args, "item id")?)
    };
    Ok(Action::Record { action, item_id })
}
