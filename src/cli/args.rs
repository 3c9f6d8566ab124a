//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, data_element::DeCommands,
    exec_order::ExecOrderArgs, library::LibCommands, rule::RuleCommands, scan::ScanArgs,
};

#[derive(Parser)]
#[command(name = "tagscope")]
#[command(author, version, about = "Tag-management property inspector")]
#[command(long_about = "Cross-reference the rules, rule components and data elements of a tag-management property, and infer the order its rules fire in.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log debug detail, including upstream HTTP status
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Property id (default: `property` from config)
    #[arg(long, short = 'p', global = true)]
    pub property: Option<String>,

    /// Company id (default: `company` from config)
    #[arg(long, short = 'c', global = true)]
    pub company: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List companies visible to the credentials
    Companies,

    /// List properties of a company
    Properties,

    /// Rule queries
    #[command(subcommand)]
    Rule(RuleCommands),

    /// Data element queries
    #[command(subcommand)]
    De(DeCommands),

    /// Library queries
    #[command(subcommand)]
    Lib(LibCommands),

    /// Scan a whole property
    Scan(ScanArgs),

    /// Infer the order a property's rules fire in
    ExecOrder(ExecOrderArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default, then the command default
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }

    /// Whether the format serializes whole records rather than a table
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}
