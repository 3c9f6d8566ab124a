//! `tagscope de` command - data element listing and usage analysis

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::analysis::{DataElementLookup, PropertyLookup};
use crate::cli::helpers::Session;
use crate::cli::output::{print_structured, warn_partial_failures};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum DeCommands {
    /// List live data elements of the property, sorted by name
    List,

    /// Rules whose components reference a data element
    WhereUsed(WhereUsedArgs),

    /// Reference counts, unused elements and unresolved references
    Usage(UsageArgs),
}

#[derive(clap::Args, Debug)]
pub struct WhereUsedArgs {
    /// Data element name, exactly as referenced (e.g., "Page Name")
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct UsageArgs {
    /// Show only data elements nothing references
    #[arg(long)]
    pub unused_only: bool,
}

const DATA_ELEMENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("descriptor", "DESCRIPTOR", 45),
    ColumnDef::new("enabled", "ENABLED", 8),
];

const HIT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("name", "NAME", 50),
];

const USAGE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("references", "REFS", 6),
    ColumnDef::new("rules", "RULES", 60),
    ColumnDef::new("data_elements", "DATA ELEMENTS", 40),
];

pub async fn run(cmd: DeCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    let property_id = session.property(global)?;
    match cmd {
        DeCommands::List => run_list(&session, property_id, global).await,
        DeCommands::WhereUsed(args) => run_where_used(&session, property_id, args, global).await,
        DeCommands::Usage(args) => run_usage(&session, property_id, args, global).await,
    }
}

async fn run_list(session: &Session, property_id: String, global: &GlobalOpts) -> Result<()> {
    let lookup = PropertyLookup::new(property_id);
    let data_elements = session
        .run(session.inspector.list_data_elements(&lookup))
        .await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&data_elements, format);
    }

    let rows: Vec<TableRow> = data_elements
        .iter()
        .map(|de| {
            TableRow::new(&de.id)
                .cell("name", CellValue::Text(de.attributes.name.clone()))
                .cell(
                    "descriptor",
                    de.attributes
                        .delegate_descriptor_id
                        .clone()
                        .map_or(CellValue::Empty, CellValue::Type),
                )
                .cell("enabled", CellValue::Enabled(de.attributes.enabled))
        })
        .collect();
    TableFormatter::new(DATA_ELEMENT_COLUMNS, "data element").output(&rows, format)
}

async fn run_where_used(
    session: &Session,
    property_id: String,
    args: WhereUsedArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let lookup = DataElementLookup::new(property_id, args.name);
    let found = session
        .run(session.inspector.find_rules_using_data_element(&lookup))
        .await?;
    warn_partial_failures(&found.failures);

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&found, format);
    }

    if format == OutputFormat::Tsv {
        if found.items.is_empty() {
            println!(
                "{} No rules reference {}",
                style("○").dim(),
                style(&found.data_element_name).cyan()
            );
            return Ok(());
        }
        println!(
            "{} {}\n",
            style("References to:").bold(),
            style(&found.data_element_name).cyan()
        );
    }

    let rows: Vec<TableRow> = found
        .items
        .iter()
        .map(|item| {
            TableRow::new(&item.id)
                .cell("type", CellValue::Type(item.resource_type.clone()))
                .cell("name", CellValue::Text(item.name().to_string()))
        })
        .collect();
    TableFormatter::new(HIT_COLUMNS, "referencing item").output(&rows, format)
}

async fn run_usage(
    session: &Session,
    property_id: String,
    args: UsageArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let lookup = PropertyLookup::new(property_id);
    let mut report = session
        .run(session.inspector.data_element_usage(&lookup))
        .await?;
    warn_partial_failures(&report.failures);

    if args.unused_only {
        report.usage.retain(|u| u.reference_count == 0);
    }

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&report, format);
    }

    let rows: Vec<TableRow> = report
        .usage
        .iter()
        .map(|u| {
            TableRow::new(&u.id)
                .cell("name", CellValue::Text(u.name.clone()))
                .cell("references", CellValue::Number(u.reference_count as i64))
                .cell("rules", CellValue::Tags(u.rule_ids.clone()))
                .cell(
                    "data_elements",
                    CellValue::Tags(u.referenced_by_data_elements.clone()),
                )
        })
        .collect();
    TableFormatter::new(USAGE_COLUMNS, "data element").output(&rows, format)?;

    if format == OutputFormat::Tsv && !report.unresolved.is_empty() {
        println!();
        println!(
            "{}",
            style("Referenced names with no matching data element:").yellow()
        );
        for unresolved in &report.unresolved {
            let mut sources = Vec::new();
            if !unresolved.component_ids.is_empty() {
                sources.push(format!("components: {}", unresolved.component_ids.join(", ")));
            }
            if !unresolved.data_element_ids.is_empty() {
                sources.push(format!(
                    "data elements: {}",
                    unresolved.data_element_ids.join(", ")
                ));
            }
            println!(
                "  {} ({})",
                style(&unresolved.name).yellow(),
                sources.join("; ")
            );
        }
    }
    Ok(())
}
