use crate::catalog::MAX_PAGE_SIZE;
use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::session::Action;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(size) = args.page_size {
        validate_page_size(size).map_err(|e| format!("invalid --page-size: {e}"))?;
    }
    if let Some(raw) = args.format.as_deref() {
        parse_format(raw).map_err(|e| format!("invalid --format: {e}"))?;
    }
    if let Some(raw) = args.url.as_deref() {
        crate::api::parse_base_url(raw).map_err(|e| format!("invalid --url: {e}"))?;
    }
    for raw in &args.exec {
        if Action::parse(raw)?.is_none() {
            return Err("invalid --exec, expected a non-empty action".to_string());
        }
    }
    Ok(())
}

pub fn validate_page_size(size: u32) -> Result<u32, String> {
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!("expected 1..={MAX_PAGE_SIZE}, got {size}"))
    }
}

pub fn parse_format(raw: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(raw).ok_or_else(|| format!("unknown output format '{raw}', expected text or json"))
}
