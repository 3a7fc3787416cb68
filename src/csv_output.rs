//! CSV output format for attribution tables
//!
//! One table per requested section, separated by a blank line and a
//! `# <table>` comment header so a spreadsheet import can split them.

use crate::assembler::AttributionReport;
use crate::ingest::ParseReport;

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The per-channel attribution table
pub fn attribution_csv(report: &AttributionReport) -> String {
    let mut output = String::from("channel,first_touch,last_touch,linear_touch,markov_model\n");
    for row in &report.channels {
        output.push_str(&format!(
            "{},{:.6},{:.6},{:.6},{:.6}\n",
            escape_field(&row.channel),
            row.first_touch,
            row.last_touch,
            row.linear_touch,
            row.markov_model
        ));
    }
    output
}

/// The removal-effect table, ascending by effect
pub fn removal_csv(report: &AttributionReport) -> String {
    let mut output = String::from("channel,baseline,removed,removal_effect\n");
    for row in &report.removal_effects {
        output.push_str(&format!(
            "{},{:.6},{:.6},{:.6}\n",
            escape_field(&row.channel),
            row.baseline,
            row.removed,
            row.effect
        ));
    }
    output
}

/// The diagnostic transition matrix
pub fn matrix_csv(report: &AttributionReport) -> String {
    let matrix = &report.transition_matrix;
    let mut output = String::from("from");
    for label in &matrix.labels {
        output.push(',');
        output.push_str(&escape_field(label));
    }
    output.push('\n');

    for (label, row) in matrix.labels.iter().zip(&matrix.rows) {
        output.push_str(&escape_field(label));
        for probability in row {
            output.push_str(&format!(",{:.6}", probability));
        }
        output.push('\n');
    }
    output
}

/// The Sankey edge list
pub fn sankey_csv(report: &AttributionReport) -> String {
    let mut output = String::from("first_touch,last_touch,conversions,non_conversions,total\n");
    for edge in &report.sankey {
        output.push_str(&format!(
            "{},{},{},{},{}\n",
            escape_field(&edge.first_touch),
            escape_field(&edge.last_touch),
            edge.conversions,
            edge.non_conversions,
            edge.total
        ));
    }
    output
}

/// Per-touch pivot table (first or last)
fn touch_summary_csv(rows: &[crate::aggregator::GroupedRow]) -> String {
    let mut output =
        String::from("channel,paths,conversions,non_conversions,conversion_pct,non_conversion_pct\n");
    for row in rows {
        output.push_str(&format!(
            "{},{},{},{},{:.3},{:.3}\n",
            escape_field(&row.key),
            row.paths,
            row.conversions,
            row.non_conversions,
            row.conversion_pct,
            row.non_conversion_pct
        ));
    }
    output
}

/// Render the requested tables as one CSV document
pub fn render(
    report: &AttributionReport,
    parse: &ParseReport,
    include_matrix: bool,
    include_sankey: bool,
    include_summary: bool,
) -> String {
    let mut output = String::from("# attribution\n");
    output.push_str(&attribution_csv(report));

    output.push_str("\n# removal_effects\n");
    output.push_str(&removal_csv(report));

    if include_matrix {
        output.push_str("\n# transition_matrix\n");
        output.push_str(&matrix_csv(report));
    }

    if include_sankey {
        output.push_str("\n# sankey\n");
        output.push_str(&sankey_csv(report));
    }

    if include_summary {
        output.push_str("\n# first_touch_summary\n");
        output.push_str(&touch_summary_csv(&report.first_touch_summary));
        output.push_str("\n# last_touch_summary\n");
        output.push_str(&touch_summary_csv(&report.last_touch_summary));
    }

    if parse.skipped_count() > 0 {
        output.push_str("\n# skipped_rows\n");
        output.push_str("row,str_path,reason\n");
        for skipped in &parse.skipped {
            output.push_str(&format!(
                "{},{},{}\n",
                skipped.row,
                escape_field(&skipped.str_path),
                escape_field(&skipped.reason.to_string())
            ));
        }
    }

    output
}
