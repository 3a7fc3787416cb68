use anyhow::{Context, Result};
use atribuir::aggregator::TouchFilter;
use atribuir::channel_map::ChannelMap;
use atribuir::cli::{Cli, OutputFormat, TouchSelection};
use atribuir::pipeline::Pipeline;
use atribuir::{csv_output, ingest, json_output, text_output};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn touch_filter(selection: TouchSelection) -> TouchFilter {
    match selection {
        TouchSelection::All => TouchFilter::All,
        TouchSelection::Single => TouchFilter::SingleTouch,
        TouchSelection::Multi => TouchFilter::MultiTouch,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let map = ChannelMap::from_csv_path(&cli.mapping)?;
    let (dataset, parse_report) = ingest::load_dataset(&cli.input, &map)?;

    let mut pipeline = Pipeline::new(dataset, parse_report);
    let report = pipeline.report(touch_filter(cli.touch));
    let parse = pipeline.parse_report();

    let output = match cli.format {
        OutputFormat::Text => {
            text_output::render(&report, parse, cli.matrix, cli.sankey, cli.summary)
        }
        OutputFormat::Json => {
            json_output::JsonReport::build(&report, parse, cli.matrix, cli.sankey, cli.summary)
                .render()
                .context("failed to serialize report")?
        }
        OutputFormat::Csv => {
            csv_output::render(&report, parse, cli.matrix, cli.sankey, cli.summary)
        }
    };

    print!("{}", output);
    Ok(())
}
