//! `tagscope scan` command - whole-property scan

use console::style;
use miette::Result;

use crate::analysis::ScanRequest;
use crate::cli::helpers::Session;
use crate::cli::output::{print_structured, warn_partial_failures};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Also list data elements
    #[arg(long)]
    pub data_elements: bool,

    /// Also fetch every rule's components and extract references
    #[arg(long)]
    pub components: bool,
}

const REFERENCE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("data_element", "DATA ELEMENT", 40),
    ColumnDef::new("component", "COMPONENT", 40),
];

pub async fn run(args: ScanArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;

    let mut request = ScanRequest::new(session.property(global)?);
    if args.data_elements {
        request = request.with_data_elements();
    }
    if args.components {
        request = request.with_rule_components();
    }

    let result = session.run(session.inspector.scan_property(&request)).await?;
    warn_partial_failures(&result.failures);

    let format = session.format(global, OutputFormat::Yaml);
    if format.is_structured() {
        return print_structured(&result, format);
    }

    if format == OutputFormat::Tsv {
        let summary = &result.summary;
        println!("{} {}", style("Property:").bold(), style(&result.property_id).cyan());
        println!("  Rules:           {}", summary.rules);
        if result.rule_components.is_some() {
            println!("  Rule components: {}", summary.rule_components);
            println!("  References:      {}", summary.references);
        }
        if result.data_elements.is_some() {
            println!("  Data elements:   {}", summary.data_elements);
        }
        if summary.failures > 0 {
            println!("  Failures:        {}", style(summary.failures).red());
        }
        if result.references.is_empty() {
            return Ok(());
        }
        println!();
    }

    let rows: Vec<TableRow> = result
        .references
        .iter()
        .map(|r| {
            TableRow::new(&r.component_id)
                .cell("data_element", CellValue::Text(r.match_name.clone()))
                .cell("component", CellValue::Text(r.type_name.clone()))
        })
        .collect();
    TableFormatter::new(REFERENCE_COLUMNS, "reference").output(&rows, format)
}
