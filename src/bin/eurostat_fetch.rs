use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use eurostat_fetch::app::{App, FetchOptions};
use eurostat_fetch::client::BulkHttpClient;
use eurostat_fetch::config::Settings;
use eurostat_fetch::domain::{DatasetId, Frequency, TimeFormat};
use eurostat_fetch::error::FetchError;
use eurostat_fetch::output::TableOutput;

#[derive(Parser)]
#[command(name = "eurostat-fetch")]
#[command(about = "Fetch, cache, and reshape Eurostat bulk datasets")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a dataset as a tidy table")]
    Fetch(FetchArgs),
    #[command(about = "Remove cached dataset entries")]
    Clean(CleanArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Dataset code, e.g. road_eqs_busmot
    id: String,

    #[arg(long, value_enum, default_value_t = TimeFormat::Date)]
    time_format: TimeFormat,

    /// Keep only periods of this frequency before conversion
    #[arg(long, value_enum)]
    select_time: Option<Frequency>,

    #[arg(long)]
    no_cache: bool,

    #[arg(long)]
    force_update: bool,

    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,

    /// Leave dimension columns as plain strings instead of categoricals
    #[arg(long)]
    plain_columns: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CleanArgs {
    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::DatasetNotFound(_)
        | FetchError::InvalidDatasetId(_)
        | FetchError::InvalidPeriod(_)
        | FetchError::MixedFrequencies(_) => 2,
        FetchError::Http(_) | FetchError::Status { .. } => 3,
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
    let settings = Settings::from_env();

    match cli.command {
        Commands::Fetch(args) => {
            let id: DatasetId = args.id.parse().into_diagnostic()?;
            let client = BulkHttpClient::new().into_diagnostic()?;
            let app = App::new(client, settings);
            let options = FetchOptions {
                time_format: args.time_format,
                select_time: args.select_time,
                cache: !args.no_cache,
                force_update: args.force_update,
                cache_dir: args.cache_dir,
                typed_columns: !args.plain_columns,
            };
            let table = app.get_dataset(&id, &options).into_diagnostic()?;
            if args.json {
                TableOutput::print_json(&table).into_diagnostic()?;
            } else {
                TableOutput::print_tsv(&table).into_diagnostic()?;
            }
            Ok(())
        }
        Commands::Clean(args) => {
            let dir = eurostat_fetch::cache::resolve_cache_dir(args.cache_dir.as_deref(), &settings)
                .into_diagnostic()?;
            let removed = eurostat_fetch::cache::clean_cache_dir(&dir).into_diagnostic()?;
            eprintln!("removed {removed} cache entries");
            Ok(())
        }
    }
}
