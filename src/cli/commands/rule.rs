//! `tagscope rule` command - rule listing and inspection

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::analysis::{PropertyLookup, RuleLookup};
use crate::cli::helpers::{format_date_local, Session};
use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List live rules of the property, sorted by name
    List,

    /// Show one rule
    Show(RuleIdArgs),

    /// List a rule's components in service order
    Components(RuleIdArgs),

    /// Data elements a rule references through its component settings
    Refs(RuleIdArgs),
}

#[derive(clap::Args, Debug)]
pub struct RuleIdArgs {
    /// Rule id (e.g., RLabc123...)
    pub id: String,
}

const RULE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 50),
    ColumnDef::new("enabled", "ENABLED", 8),
    ColumnDef::new("revision", "REV", 5),
    ColumnDef::new("updated", "UPDATED", 12),
];

const COMPONENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("kind", "KIND", 12),
    ColumnDef::new("extension", "EXTENSION", 24),
    ColumnDef::new("action", "ACTION", 30),
    ColumnDef::new("order", "ORDER", 6),
];

const REFERENCE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("data_element", "DATA ELEMENT", 40),
    ColumnDef::new("component", "COMPONENT", 30),
    ColumnDef::new("descriptor", "DESCRIPTOR", 40),
];

pub async fn run(cmd: RuleCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    match cmd {
        RuleCommands::List => run_list(&session, global).await,
        RuleCommands::Show(args) => run_show(&session, args, global).await,
        RuleCommands::Components(args) => run_components(&session, args, global).await,
        RuleCommands::Refs(args) => run_refs(&session, args, global).await,
    }
}

async fn run_list(session: &Session, global: &GlobalOpts) -> Result<()> {
    let lookup = PropertyLookup::new(session.property(global)?);
    let rules = session.run(session.inspector.list_rules(&lookup)).await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&rules, format);
    }

    let rows: Vec<TableRow> = rules
        .iter()
        .map(|r| {
            TableRow::new(&r.id)
                .cell("name", CellValue::Text(r.attributes.name.clone()))
                .cell("enabled", CellValue::Enabled(r.attributes.enabled))
                .cell("revision", CellValue::Number(r.attributes.revision_number))
                .cell("updated", CellValue::Date(r.attributes.updated_at))
        })
        .collect();
    TableFormatter::new(RULE_COLUMNS, "rule").output(&rows, format)
}

async fn run_show(session: &Session, args: RuleIdArgs, global: &GlobalOpts) -> Result<()> {
    let rule = session
        .run(session.inspector.get_rule(&RuleLookup::new(args.id)))
        .await?;

    let format = session.format(global, OutputFormat::Yaml);
    match format {
        OutputFormat::Id => {
            println!("{}", rule.id);
            Ok(())
        }
        OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Md => {
            let attrs = &rule.attributes;
            println!("{}: {}", style("ID").bold(), style(&rule.id).cyan());
            println!("{}: {}", style("Name").bold(), attrs.name);
            println!(
                "{}: {}",
                style("Enabled").bold(),
                match attrs.enabled {
                    Some(true) => "yes",
                    Some(false) => "no",
                    None => "-",
                }
            );
            println!("{}: {}", style("Revision").bold(), attrs.revision_number);
            if let Some(updated) = &attrs.updated_at {
                println!("{}: {}", style("Updated").bold(), format_date_local(updated));
            }
            Ok(())
        }
        _ => print_structured(&rule, format),
    }
}

async fn run_components(session: &Session, args: RuleIdArgs, global: &GlobalOpts) -> Result<()> {
    let components = session
        .run(session.inspector.list_rule_components(&RuleLookup::new(args.id)))
        .await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&components, format);
    }

    let rows: Vec<TableRow> = components
        .iter()
        .map(|c| {
            let row = TableRow::new(&c.id)
                .cell("name", CellValue::Text(c.attributes.name.clone()))
                .cell("order", CellValue::Number(c.attributes.order));
            match c.attributes.descriptor() {
                Some(d) => row
                    .cell("kind", CellValue::Type(d.category.to_string()))
                    .cell("extension", CellValue::Type(d.extension))
                    .cell("action", CellValue::Type(d.action)),
                // Unparseable ids are shown whole
                None => row.cell(
                    "action",
                    CellValue::Type(c.attributes.delegate_descriptor_id.clone()),
                ),
            }
        })
        .collect();
    TableFormatter::new(COMPONENT_COLUMNS, "rule component").output(&rows, format)
}

async fn run_refs(session: &Session, args: RuleIdArgs, global: &GlobalOpts) -> Result<()> {
    let found = session
        .run(
            session
                .inspector
                .find_data_elements_used_in_rule(&RuleLookup::new(args.id)),
        )
        .await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&found, format);
    }

    if format == OutputFormat::Tsv && found.references.is_empty() {
        println!(
            "{} {} references no data elements.",
            style("○").dim(),
            style(&found.rule.attributes.name).cyan()
        );
        return Ok(());
    }

    let rows: Vec<TableRow> = found
        .references
        .iter()
        .map(|r| {
            TableRow::new(&r.component_id)
                .cell("data_element", CellValue::Text(r.match_name.clone()))
                .cell("component", CellValue::Text(r.type_name.clone()))
                .cell(
                    "descriptor",
                    CellValue::Type(r.delegate_descriptor_id.clone()),
                )
        })
        .collect();
    TableFormatter::new(REFERENCE_COLUMNS, "reference").output(&rows, format)
}
