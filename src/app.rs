use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use thiserror::Error;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{ApiError, HttpApi};
use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{JsonView, OutputFormat, TerminalView, View};
use crate::panels::analytics::AnalyticsLimits;
use crate::session::action::{self, Action};
use crate::session::{Session, SessionConfig};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ANALYTICS_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        Self::Config(message)
    }
}

fn print_banner(base_url: &str) {
    const BANNER: &str = r#"
     _                 __                 _
 ___| |_ ___  _ __ ___ / _|_ __ ___  _ __ | |_
/ __| __/ _ \| '__/ _ \ |_| '__/ _ \| '_ \| __|
\__ \ || (_) | | |  __/  _| | | (_) | | | | |_
|___/\__\___/|_|  \___|_| |_|  \___/|_| |_|\__|
"#;
    eprint!("{BANNER}");
    eprintln!(
        "       v{} - catalog browser :: {}",
        env!("CARGO_PKG_VERSION"),
        base_url
    );
    eprintln!("       type 'help' for actions, 'quit' to leave");
    eprintln!();
}

/// `-p, --ps, --page-size <N>` style label for one flag.
fn flag_label(arg: &clap::Arg) -> String {
    let short = arg.get_short().map(|c| format!("-{c}"));
    let longs = arg
        .get_long()
        .into_iter()
        .chain(arg.get_visible_aliases().unwrap_or_default())
        .map(|l| format!("--{l}"));
    let mut label = short.into_iter().chain(longs).collect::<Vec<_>>().join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map_or("VALUE", |name| name.as_str());
        label.push_str(&format!(" <{value}>"));
    }
    label
}

/// Flags grouped under their help headings, followed by the session actions.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut groups: Vec<(&str, Vec<&clap::Arg>)> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        match groups.iter().position(|(h, _)| *h == heading) {
            Some(i) => groups[i].1.push(arg),
            None => groups.push((heading, vec![arg])),
        }
    }

    let name = cmd.get_name();
    let mut out = format!("{name} {}\n", env!("CARGO_PKG_VERSION"));
    for text in [cmd.get_about(), cmd.get_long_about()].into_iter().flatten() {
        out.push_str(&format!("{text}\n"));
    }
    out.push_str(&format!("\nUsage: {name} [OPTIONS]\n\n"));
    for (heading, args) in groups {
        out.push_str(&format!("{heading}:\n"));
        for arg in args {
            let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
            out.push_str(&format!("  {:<28} {}\n", flag_label(arg), help.trim()));
        }
        out.push('\n');
    }
    out.push_str(&format!("Actions (stdin or --exec):\n{}\n", action::help_text()));
    out
}

#[derive(Clone, Debug)]
struct RunConfig {
    base_url: String,
    timeout: Option<Duration>,
    page_size: u32,
    analytics: AnalyticsLimits,
    analytics_delay: Duration,
    format: OutputFormat,
    no_color: bool,
    exec: Vec<Action>,
}

impl RunConfig {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            page_size: self.page_size,
            analytics: self.analytics,
            analytics_delay: self.analytics_delay,
        }
    }
}

fn positive_limit(name: &str, value: Option<u32>, default: u32) -> Result<u32, String> {
    match value {
        Some(0) => Err(format!("invalid {name} in config, expected positive integer")),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    crate::api::parse_base_url(&base_url).map_err(|e| format!("invalid base_url: {e}"))?;

    let timeout_secs = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    let page_size =
        validation::validate_page_size(page_size).map_err(|e| format!("invalid page_size: {e}"))?;

    let defaults = AnalyticsLimits::default();
    let analytics = AnalyticsLimits {
        popular_items: positive_limit("popular_limit", cfg.popular_limit, defaults.popular_items)?,
        active_users: positive_limit("active_limit", cfg.active_limit, defaults.active_users)?,
        recent_events: positive_limit("recent_limit", cfg.recent_limit, defaults.recent_events)?,
    };
    let analytics_delay = Duration::from_millis(
        cfg.analytics_delay_ms
            .unwrap_or(DEFAULT_ANALYTICS_DELAY_MS),
    );

    let format = match args.format.or(cfg.output_format) {
        Some(raw) => validation::parse_format(&raw)?,
        None => OutputFormat::default(),
    };
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let mut exec = Vec::with_capacity(args.exec.len());
    for raw in &args.exec {
        if let Some(action) = Action::parse(raw)? {
            exec.push(action);
        }
    }

    Ok(RunConfig {
        base_url,
        timeout,
        page_size,
        analytics,
        analytics_delay,
        format,
        no_color,
        exec,
    })
}

/// Log level used when `RUST_LOG` is unset.
fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the global subscriber. Called once from [`run_cli`], before any logging.
fn init_tracing(verbose: u8) {
    let fallback = default_level(verbose);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

async fn run_async(run: RunConfig) -> Result<(), AppError> {
    let api = Arc::new(HttpApi::new(&run.base_url, run.timeout)?);
    tracing::info!(base_url = %api.base_url(), timeout = ?run.timeout, "client ready");

    let view: Box<dyn View> = match run.format {
        OutputFormat::Text => Box::new(TerminalView::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonView::new(io::stdout())),
    };

    let mut session = Session::new(api, view, run.session_config());
    let interactive = run.exec.is_empty();
    if interactive && run.format == OutputFormat::Text {
        print_banner(&run.base_url);
    }

    session.start();
    if interactive {
        session
            .run_interactive(BufReader::new(tokio::io::stdin()))
            .await
            .map_err(|source| AppError::Io {
                context: "failed to read stdin",
                source,
            })?;
    } else {
        session.run_script(run.exec).await;
    }

    io::stdout().flush().map_err(|source| AppError::Io {
        context: "failed to flush stdout",
        source,
    })?;
    Ok(())
}

fn init_config(path: PathBuf) -> Result<(), AppError> {
    if config::ensure_default_config_file(&path)? {
        println!("{} wrote {}", "::".bold().green(), path.display());
    } else {
        println!("{} {} already exists", "::".bold().yellow(), path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), AppError> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(AppError::Config(e.to_string())),
        },
    };

    init_tracing(args.verbose);

    let user_config_path = args.config.as_deref().map(config::expand_tilde);
    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| AppError::Config("cannot locate home directory, pass --config".into()))?;
        return init_config(path);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| AppError::Io {
            context: "failed to build runtime",
            source,
        })?;

    rt.block_on(run_async(run))
}
