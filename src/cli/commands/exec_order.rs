//! `tagscope exec-order` command - inferred rule firing order

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::{ExecutionOrderReport, PropertyLookup};
use crate::cli::helpers::{truncate_str, write_output, Session};
use crate::cli::output::{print_structured, warn_partial_failures};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ExecOrderArgs {
    /// Render a Markdown report instead of a listing
    #[arg(long)]
    pub report: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o', requires = "report")]
    pub output: Option<PathBuf>,

    /// Include empty buckets
    #[arg(long)]
    pub show_empty: bool,
}

const ORDER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("bucket", "BUCKET", 32),
    ColumnDef::new("name", "RULE", 50),
];

pub async fn run(args: ExecOrderArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open()?;
    let lookup = PropertyLookup::new(session.property(global)?);
    let report = session
        .run(session.inspector.execution_order(&lookup))
        .await?;
    warn_partial_failures(&report.failures);

    if args.report {
        return write_output(
            &render_markdown(&report, args.show_empty),
            args.output.as_deref(),
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    if format.is_structured() {
        return print_structured(&report, format);
    }

    if format == OutputFormat::Tsv {
        print_buckets(&report, args.show_empty);
        return Ok(());
    }

    let rows: Vec<TableRow> = report
        .order
        .buckets()
        .into_iter()
        .flat_map(|(label, rules)| {
            rules.iter().map(move |r| {
                TableRow::new(&r.id)
                    .cell("bucket", CellValue::Text(label.clone()))
                    .cell("name", CellValue::Text(r.attributes.name.clone()))
            })
        })
        .collect();
    TableFormatter::new(ORDER_COLUMNS, "placement").output(&rows, format)
}

fn print_buckets(report: &ExecutionOrderReport, show_empty: bool) {
    for (label, rules) in report.order.buckets() {
        if rules.is_empty() && !show_empty {
            continue;
        }
        println!("{} ({})", style(&label).bold(), rules.len());
        for rule in rules {
            println!("  {}  {}", style(&rule.id).cyan(), rule.attributes.name);
        }
        println!();
    }
    println!(
        "{} of {} rule(s) placed.",
        style(report.order.classified_count()).cyan(),
        report.order.all.len()
    );
}

/// Markdown report: one table per bucket plus a summary
pub fn render_markdown(report: &ExecutionOrderReport, show_empty: bool) -> String {
    let mut output = String::new();
    output.push_str("# Rule Execution Order\n\n");
    output.push_str(&format!("Property: `{}`\n\n", report.property_id));

    for (label, rules) in report.order.buckets() {
        if rules.is_empty() && !show_empty {
            continue;
        }
        output.push_str(&format!("## {}\n\n", label));
        if rules.is_empty() {
            output.push_str("_No rules._\n\n");
            continue;
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Rule ID", "Rule Name", "Enabled"]);
        for (position, rule) in rules.iter().enumerate() {
            builder.push_record([
                (position + 1).to_string(),
                rule.id.clone(),
                truncate_str(&rule.attributes.name, 60),
                if rule.attributes.is_disabled() { "no" } else { "yes" }.to_string(),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push_str("\n\n");
    }

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Total Rules:** {}\n", report.order.all.len()));
    output.push_str(&format!(
        "- **Placed in a bucket:** {}\n",
        report.order.classified_count()
    ));
    if !report.failures.is_empty() {
        output.push_str(&format!(
            "- **Rules with unreadable components:** {}\n",
            report.failures.len()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{component, rule};
    use crate::analysis::{classify, RuleWithComponents};

    fn report() -> ExecutionOrderReport {
        let rules = vec![
            RuleWithComponents::new(
                rule("RL1", "Global Pageview"),
                vec![component("RC1", "core::events::library-loaded", "")],
            ),
            RuleWithComponents::new(
                rule("RL2", "Checkout Click"),
                vec![component("RC2", "core::events::click", "")],
            ),
        ];
        ExecutionOrderReport {
            property_id: "PR1".to_string(),
            order: classify(&rules),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_report_lists_buckets() {
        let md = render_markdown(&report(), false);
        assert!(md.starts_with("# Rule Execution Order\n"));
        assert!(md.contains("## Library Loaded"));
        assert!(md.contains("Global Pageview"));
        assert!(md.contains("## Custom Event: click"));
        assert!(!md.contains("## Direct Call"));
        assert!(md.contains("- **Total Rules:** 2"));
    }

    #[test]
    fn test_markdown_report_shows_empty_buckets_on_request() {
        let md = render_markdown(&report(), true);
        assert!(md.contains("## Direct Call\n\n_No rules._"));
    }
}
