use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use carquote::present::display_price;
use carquote::range::{ListingFilter, ValueRange};
use carquote::{
    csv_reader, render_chart, run_query, OutputFormat, QueryConfig, QueryOutput, QueryRequest,
    RecordTable, ViewMode,
};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliView {
    /// Average price per model year
    Year,
    /// Average price per mileage band
    Mileage,
}

impl From<CliView> for ViewMode {
    fn from(cli: CliView) -> Self {
        match cli {
            CliView::Year => ViewMode::ByYear,
            CliView::Mileage => ViewMode::ByMileageBand,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "carquote")]
#[command(about = "Look up average used-car prices by model year or mileage band", long_about = None)]
struct Args {
    /// Listings file (CSV, or a JSON array of objects); reads CSV from stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Manufacturer, e.g. 현대
    #[arg(short, long)]
    company: Option<String>,

    /// Model, e.g. 그랜저
    #[arg(short, long)]
    model: Option<String>,

    /// Grouping of the price statistics
    #[arg(long, value_enum, default_value_t = CliView::Year)]
    view: CliView,

    /// Model year range, e.g. 2010-2023
    #[arg(long)]
    years: Option<ValueRange>,

    /// Price range in 만원, e.g. 200-2000
    #[arg(long)]
    price: Option<ValueRange>,

    /// Mileage range in km, e.g. 0-200000
    #[arg(long)]
    mileage: Option<ValueRange>,

    /// JSON config file (bin width, defaults, column names, render options)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the bar chart to this file
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Chart format; overrides the config file
    #[arg(long, value_enum)]
    format: Option<CliFormat>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Logs go to stderr so stdout stays clean for results.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => QueryConfig::default(),
    };
    if let Some(format) = args.format {
        config.render.format = match format {
            CliFormat::Png => OutputFormat::Png,
            CliFormat::Svg => OutputFormat::Svg,
        };
    }

    let table = load_table(args.input.as_deref())?;
    info!("loaded {} rows", table.rows.len());

    let request = QueryRequest {
        company: args.company.clone(),
        model: args.model.clone(),
        view: args.view.into(),
        ranges: ListingFilter {
            year: args.years,
            price: args.price,
            mileage: args.mileage,
        },
    };
    debug!("request: {:?}", request);

    let output = run_query(&table, &request, &config).context("Failed to run query")?;

    if let Some(path) = &args.chart {
        if output.is_empty() {
            warn!("no listings to chart, skipping {}", path.display());
        } else {
            let bytes =
                render_chart(&output, &config.render).context("Failed to render chart")?;
            fs::write(path, bytes)
                .with_context(|| format!("Failed to write chart to '{}'", path.display()))?;
            info!("chart written to {}", path.display());
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut handle, &output).context("Failed to write JSON")?;
        writeln!(handle).context("Failed to write to stdout")?;
    } else {
        write_report(&mut handle, &output).context("Failed to write to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn load_config(path: &Path) -> Result<QueryConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    QueryConfig::from_json_str(&text)
        .with_context(|| format!("Invalid config '{}'", path.display()))
}

fn load_table(input: Option<&Path>) -> Result<RecordTable> {
    match input {
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin"),
        Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in '{}'", path.display()))?;
            RecordTable::from_json(&value)
        }
        Some(path) => csv_reader::read_csv_from_path(path),
    }
}

fn write_report<W: Write>(out: &mut W, output: &QueryOutput) -> io::Result<()> {
    if let Some(selection) = &output.selection {
        writeln!(out, "{} {}", selection.company, selection.model)?;
    }
    writeln!(out, "{}", output.summary_sentence)?;
    if !output.is_empty() {
        for point in &output.chart_series {
            writeln!(out, "  {:<16} {:>8}만원", point.label, display_price(point.value))?;
        }
        writeln!(out, "평균 연식: {:.1}", output.mean_year)?;
        writeln!(out, "평균 주행거리: {:.0}km", output.mean_mileage)?;
    }
    writeln!(out, "조회된 차량 수: {}대", output.listing_count)?;
    Ok(())
}
