use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "storefront",
    version,
    about = "terminal front end for the catalog, analytics and recommendations API",
    long_about = "Storefront browses a product catalog backend from the terminal: search and page through items, open item details, record views and cart adds, watch the analytics dashboard and fetch recommendations.\n\nExamples:\n  storefront -u http://localhost:8000/\n  storefront -u http://localhost:8000/ -e 'search lamp' -e next -e 'cart 42'\n  storefront --format json -e analytics\n\nTip: Use --init-config to write ~/.storefront/config.yml and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity on stderr (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'F',
        long = "fmt",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text or json (one JSON object per line)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Backend",
        help = "Base URL of the backend API (default http://localhost:8000/)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 't',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECS",
        help_heading = "Backend",
        help = "Per-request timeout in seconds (0 = wait forever)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.storefront/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'e',
        long = "ex",
        visible_alias = "exec",
        value_name = "ACTION",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Run an action and exit instead of reading stdin (repeatable, runs in order)."
    )]
    pub exec: Vec<String>,

    #[arg(
        short = 'p',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Catalog",
        help = "Items per catalog page (1-100, default 12)."
    )]
    pub page_size: Option<u32>,
}
