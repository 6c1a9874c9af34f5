use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use fieldstat::app::{App, OfficeInfo};
use fieldstat::ces::CesHttpClient;
use fieldstat::config::{ConfigLoader, ResolvedConfig};
use fieldstat::domain::Dataset;
use fieldstat::error::FieldstatError;
use fieldstat::geography::Geography;
use fieldstat::laus::LausHttpClient;
use fieldstat::oews::OewsHttpClient;
use fieldstat::output::{JsonOutput, OutputMode, render_table};
use fieldstat::qcew::QcewHttpClient;
use fieldstat::registry::OfficeRegistry;

#[derive(Parser)]
#[command(name = "fieldstat")]
#[command(about = "Office-level labor-market statistics from published county/MSA extracts")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List regional and district office names")]
    Offices,
    #[command(about = "Resolve an office name to its entity")]
    Resolve(ResolveArgs),
    #[command(about = "Query a dataset for an office")]
    Query(QueryArgs),
}

#[derive(Args)]
struct ResolveArgs {
    name: String,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(value_enum)]
    dataset: Dataset,

    office: String,

    /// Sum constituent counties per period (LAUS only; LAUS default).
    #[arg(long)]
    aggregate: Option<bool>,

    /// Keep only the first N result rows.
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FieldstatError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FieldstatError) -> u8 {
    match error {
        FieldstatError::UnknownOffice { .. }
        | FieldstatError::InvalidDataset(_)
        | FieldstatError::UnsupportedAggregation(_)
        | FieldstatError::ConfigRead(_)
        | FieldstatError::ConfigParse(_) => 2,
        FieldstatError::LausHttp(_)
        | FieldstatError::LausStatus { .. }
        | FieldstatError::QcewHttp(_)
        | FieldstatError::QcewStatus { .. }
        | FieldstatError::OewsHttp(_)
        | FieldstatError::OewsStatus { .. }
        | FieldstatError::CesHttp(_)
        | FieldstatError::CesStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let geography =
        Geography::from_reference_files(&config.county_reference, &config.msa_reference)
            .into_diagnostic()?;

    match cli.command {
        Commands::Offices => run_offices(&geography, output_mode),
        Commands::Resolve(args) => run_resolve(args, &geography, output_mode),
        Commands::Query(args) => run_query(args, geography, &config, output_mode),
    }
}

fn run_offices(geography: &Geography, output_mode: OutputMode) -> miette::Result<()> {
    let registry = OfficeRegistry::new(geography).into_diagnostic()?;
    let listing = registry.list();
    match output_mode {
        OutputMode::Json => JsonOutput::print_offices(&listing).into_diagnostic(),
        OutputMode::Text => {
            println!("Regional offices:");
            for name in &listing.regional {
                println!("  {name}");
            }
            println!("District offices:");
            for name in &listing.district {
                println!("  {name}");
            }
            Ok(())
        }
    }
}

fn run_resolve(
    args: ResolveArgs,
    geography: &Geography,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let registry = OfficeRegistry::new(geography).into_diagnostic()?;
    let office = registry.resolve(&args.name).into_diagnostic()?;
    let info = OfficeInfo::from(&office);
    match output_mode {
        OutputMode::Json => JsonOutput::print_office(&info).into_diagnostic(),
        OutputMode::Text => {
            println!("{} ({} office)", info.name, info.kind);
            if let Some(region) = &info.region {
                println!("  region: {region}");
            }
            if !info.district_offices.is_empty() {
                println!("  district offices: {}", info.district_offices.join(", "));
            }
            println!("  counties: {}", info.counties);
            println!("  metro areas: {}", info.metro_areas);
            Ok(())
        }
    }
}

fn run_query(
    args: QueryArgs,
    geography: Geography,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let laus = LausHttpClient::new(&config.laus_url).into_diagnostic()?;
    let qcew = QcewHttpClient::new(&config.qcew_url).into_diagnostic()?;
    let oews =
        OewsHttpClient::new(&config.oews_series_url, &config.oews_data_url).into_diagnostic()?;
    let ces = CesHttpClient::new(&config.ces_series_url, &config.ces_data_url).into_diagnostic()?;
    let app = App::new(geography, laus, qcew, oews, ces).into_diagnostic()?;

    let mut table = app
        .query_by_name(args.dataset, &args.office, args.aggregate)
        .into_diagnostic()?;
    if let Some(limit) = args.limit {
        table.truncate(limit);
    }

    match output_mode {
        OutputMode::Json => JsonOutput::print_table(&table).into_diagnostic(),
        OutputMode::Text => {
            print!("{}", render_table(&table));
            Ok(())
        }
    }
}
