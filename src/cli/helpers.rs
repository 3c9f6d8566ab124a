//! Shared helper functions for CLI commands

use chrono::{DateTime, Local, Utc};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::analysis::{AnalysisError, Inspector};
use crate::api::ReactorClient;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

/// Loaded configuration plus a ready inspector
pub struct Session {
    pub config: Config,
    pub inspector: Inspector<ReactorClient>,
}

impl Session {
    /// Load config and build the HTTP-backed inspector
    pub fn open() -> Result<Self> {
        let config = Config::load();
        let client_config = config
            .client_config()
            .map_err(|e| miette::miette!("{}", e))?;
        let client = ReactorClient::new(client_config).map_err(|e| miette::miette!("{}", e))?;
        let inspector = Inspector::with_settings(client, config.analysis_settings());
        Ok(Self { config, inspector })
    }

    /// Property from `--property`, falling back to config
    pub fn property(&self, global: &GlobalOpts) -> Result<String> {
        global
            .property
            .clone()
            .or_else(|| self.config.property.clone())
            .ok_or_else(|| {
                miette::miette!("No property selected; pass --property or set `property` in config")
            })
    }

    /// Company from `--company`, falling back to config
    pub fn company(&self, global: &GlobalOpts) -> Result<String> {
        global
            .company
            .clone()
            .or_else(|| self.config.company.clone())
            .ok_or_else(|| {
                miette::miette!("No company selected; pass --company or set `company` in config")
            })
    }

    /// `--format`, then `default_format` from config, then the command default
    pub fn format(&self, global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
        global
            .format
            .resolve(self.config.default_format.as_deref(), fallback)
    }

    /// Run an analysis under the configured overall deadline
    pub async fn run<T, F>(&self, analysis: F) -> Result<T>
    where
        F: Future<Output = Result<T, AnalysisError>>,
    {
        with_deadline(self.config.timeout_secs(), analysis).await
    }
}

/// Fail with [`AnalysisError::Timeout`] if `analysis` outlives `secs`
pub async fn with_deadline<T, F>(secs: u64, analysis: F) -> Result<T>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs.max(1)), analysis).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AnalysisError::Timeout { secs }.into()),
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a timestamp as a local date
pub fn format_date_local(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Write report content to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
