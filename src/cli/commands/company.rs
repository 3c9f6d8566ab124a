//! `tagscope companies` / `tagscope properties` - scope discovery

use miette::Result;

use crate::analysis::CompanyLookup;
use crate::cli::helpers::Session;
use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

const COMPANY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("org_id", "ORG", 36),
];

const PROPERTY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("platform", "PLATFORM", 10),
    ColumnDef::new("enabled", "ENABLED", 8),
    ColumnDef::new("domains", "DOMAINS", 40),
];

pub async fn run_companies(global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    let companies = session.run(session.inspector.list_companies()).await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&companies, format);
    }

    let rows: Vec<TableRow> = companies
        .iter()
        .map(|c| {
            TableRow::new(&c.id)
                .cell("name", CellValue::Text(c.attributes.name.clone()))
                .cell(
                    "org_id",
                    c.attributes
                        .org_id
                        .clone()
                        .map_or(CellValue::Empty, CellValue::Text),
                )
        })
        .collect();
    TableFormatter::new(COMPANY_COLUMNS, "company").output(&rows, format)
}

pub async fn run_properties(global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    let lookup = CompanyLookup::new(session.company(global)?);
    let properties = session.run(session.inspector.list_properties(&lookup)).await?;

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&properties, format);
    }

    let rows: Vec<TableRow> = properties
        .iter()
        .map(|p| {
            TableRow::new(&p.id)
                .cell("name", CellValue::Text(p.attributes.name.clone()))
                .cell(
                    "platform",
                    p.attributes
                        .platform
                        .clone()
                        .map_or(CellValue::Empty, CellValue::Type),
                )
                .cell("enabled", CellValue::Enabled(p.attributes.enabled))
                .cell("domains", CellValue::Tags(p.attributes.domains.clone()))
        })
        .collect();
    TableFormatter::new(PROPERTY_COLUMNS, "property").output(&rows, format)
}
