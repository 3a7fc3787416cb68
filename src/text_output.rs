//! Human-readable text output for the terminal
//!
//! Fixed-width tables in the style of classic summary tools: header,
//! dashed separator, rows, totals line.

use crate::assembler::AttributionReport;
use crate::ingest::ParseReport;

/// Width of the channel-label column, stretched to the longest label
fn label_width(report: &AttributionReport) -> usize {
    report
        .channels
        .iter()
        .map(|c| c.channel.len())
        .chain(report.transition_matrix.labels.iter().map(String::len))
        .max()
        .unwrap_or(8)
        .max(8)
}

fn attribution_table(report: &AttributionReport, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<width$} {:>12} {:>12} {:>12} {:>12}\n",
        "channel",
        "first_touch",
        "last_touch",
        "linear_touch",
        "markov_model",
        width = width
    ));
    out.push_str(&format!(
        "{:-<width$} {:->12} {:->12} {:->12} {:->12}\n",
        "", "", "", "", "",
        width = width
    ));

    let mut totals = [0.0f64; 4];
    for row in &report.channels {
        out.push_str(&format!(
            "{:<width$} {:>12.2} {:>12.2} {:>12.2} {:>12.2}\n",
            row.channel,
            row.first_touch,
            row.last_touch,
            row.linear_touch,
            row.markov_model,
            width = width
        ));
        totals[0] += row.first_touch;
        totals[1] += row.last_touch;
        totals[2] += row.linear_touch;
        totals[3] += row.markov_model;
    }

    out.push_str(&format!(
        "{:-<width$} {:->12} {:->12} {:->12} {:->12}\n",
        "", "", "", "", "",
        width = width
    ));
    out.push_str(&format!(
        "{:<width$} {:>12.2} {:>12.2} {:>12.2} {:>12.2}\n",
        "total",
        totals[0],
        totals[1],
        totals[2],
        totals[3],
        width = width
    ));
    out
}

fn removal_table(report: &AttributionReport, width: usize) -> String {
    let mut out = String::from("\nRemoval effects (ascending):\n");
    out.push_str(&format!(
        "{:<width$} {:>10} {:>10} {:>10}\n",
        "channel",
        "baseline",
        "removed",
        "effect",
        width = width
    ));
    for effect in &report.removal_effects {
        out.push_str(&format!(
            "{:<width$} {:>10.4} {:>10.4} {:>10.4}\n",
            effect.channel,
            effect.baseline,
            effect.removed,
            effect.effect,
            width = width
        ));
    }
    out
}

fn matrix_table(report: &AttributionReport, width: usize) -> String {
    let matrix = &report.transition_matrix;
    let mut out = String::from("\nTransition matrix:\n");

    out.push_str(&format!("{:<width$}", "from \\ to", width = width));
    for label in &matrix.labels {
        out.push_str(&format!(" {:>width$}", label, width = width.min(14)));
    }
    out.push('\n');

    for (label, row) in matrix.labels.iter().zip(&matrix.rows) {
        out.push_str(&format!("{:<width$}", label, width = width));
        for probability in row {
            out.push_str(&format!(
                " {:>width$.3}",
                probability,
                width = width.min(14)
            ));
        }
        out.push('\n');
    }
    out
}

fn sankey_table(report: &AttributionReport, width: usize) -> String {
    let mut out = String::from("\nFirst touch → last touch flows:\n");
    out.push_str(&format!(
        "{:<width$} {:<width$} {:>12} {:>12} {:>12}\n",
        "first_touch",
        "last_touch",
        "conversions",
        "non_conv",
        "total",
        width = width
    ));
    for edge in &report.sankey {
        out.push_str(&format!(
            "{:<width$} {:<width$} {:>12} {:>12} {:>12}\n",
            edge.first_touch,
            edge.last_touch,
            edge.conversions,
            edge.non_conversions,
            edge.total,
            width = width
        ));
    }
    out
}

fn summary_tables(report: &AttributionReport, width: usize) -> String {
    let mut out = String::new();
    for (title, rows) in [
        ("first touch", &report.first_touch_summary),
        ("last touch", &report.last_touch_summary),
    ] {
        out.push_str(&format!("\nJourneys by {}:\n", title));
        out.push_str(&format!(
            "{:<width$} {:>8} {:>12} {:>12} {:>10} {:>10}\n",
            "channel",
            "paths",
            "conversions",
            "non_conv",
            "conv_pct",
            "nonc_pct",
            width = width
        ));
        for row in rows {
            out.push_str(&format!(
                "{:<width$} {:>8} {:>12} {:>12} {:>10.3} {:>10.3}\n",
                row.key,
                row.paths,
                row.conversions,
                row.non_conversions,
                row.conversion_pct,
                row.non_conversion_pct,
                width = width
            ));
        }
    }

    out.push_str("\nTouches per journey:\n");
    for bucket in &report.path_lengths.buckets {
        out.push_str(&format!(
            "{:>4} touches: {:>8} journeys ({} distinct paths)\n",
            bucket.touches, bucket.journeys, bucket.distinct_paths
        ));
    }
    out.push_str(&format!(
        "mean {:.2} touches per journey\n",
        report.path_lengths.mean_touches
    ));
    out
}

/// Render the report as aligned text tables
pub fn render(
    report: &AttributionReport,
    parse: &ParseReport,
    include_matrix: bool,
    include_sankey: bool,
    include_summary: bool,
) -> String {
    if report.is_empty() {
        return format!(
            "No journeys matched the '{}' filter.\n",
            report.filter
        );
    }

    let width = label_width(report);
    let mut out = format!(
        "Attribution report (filter: {})\n{} conversions / {} journeys ({:.3}% conversion rate)\n",
        report.filter,
        report.summary.converters,
        report.summary.total_journeys,
        report.summary.conversion_rate
    );
    out.push_str(&format!(
        "Baseline conversion probability: {:.4}\n\n",
        report.baseline_conversion_probability
    ));

    out.push_str(&attribution_table(report, width));
    out.push_str(&removal_table(report, width));

    if include_matrix {
        out.push_str(&matrix_table(report, width));
    }
    if include_sankey {
        out.push_str(&sankey_table(report, width));
    }
    if include_summary {
        out.push_str(&summary_tables(report, width));
    }

    if parse.skipped_count() > 0 {
        out.push_str(&format!(
            "\nExcluded {} of {} input rows:\n",
            parse.skipped_count(),
            parse.total_rows
        ));
        for skipped in &parse.skipped {
            out.push_str(&format!(
                "  row {}: {} ({})\n",
                skipped.row, skipped.str_path, skipped.reason
            ));
        }
    }

    out
}
