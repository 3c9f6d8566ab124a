//! `tagscope lib` command - library publish history

use clap::Subcommand;
use miette::Result;

use crate::analysis::PropertyLookup;
use crate::cli::helpers::Session;
use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum LibCommands {
    /// Libraries of the property, most recently published first
    History(HistoryArgs),
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Show only published libraries
    #[arg(long)]
    pub published: bool,

    /// Show at most this many libraries
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

const LIBRARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("state", "STATE", 12),
    ColumnDef::new("published", "PUBLISHED", 12),
];

pub async fn run(cmd: LibCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LibCommands::History(args) => run_history(args, global).await,
    }
}

async fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    let lookup = PropertyLookup::new(session.property(global)?);
    let mut libraries = session
        .run(session.inspector.library_history(&lookup))
        .await?;

    if args.published {
        libraries.retain(|l| l.attributes.published_at.is_some());
    }
    if let Some(limit) = args.limit {
        libraries.truncate(limit);
    }

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&libraries, format);
    }

    let rows: Vec<TableRow> = libraries
        .iter()
        .map(|l| {
            TableRow::new(&l.id)
                .cell("name", CellValue::Text(l.attributes.name.clone()))
                .cell("state", CellValue::State(l.attributes.state))
                .cell("published", CellValue::Date(l.attributes.published_at))
        })
        .collect();
    TableFormatter::new(LIBRARY_COLUMNS, "library").output(&rows, format)
}
