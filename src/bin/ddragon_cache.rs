use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ddragon_cache::{
    CdnHttpClient, Config, Coordinator, DatasetType, DdragonError, Locale, Reader, TracingSink,
    Version,
};

#[derive(Parser)]
#[command(name = "ddragon-cache")]
#[command(about = "Local file-backed cache for Data Dragon static data")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch one dataset and print it as JSON")]
    Fetch(FetchArgs),
    #[command(about = "Download every missing version for a locale")]
    Update(LocaleArgs),
    #[command(about = "List versions available on the CDN")]
    Versions,
    #[command(about = "List versions downloaded locally")]
    List,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(value_enum)]
    dataset: DatasetType,

    #[arg(long)]
    version: Option<String>,

    #[arg(long, default_value = "en_US")]
    locale: String,
}

#[derive(Args)]
struct LocaleArgs {
    #[arg(long, default_value = "en_US")]
    locale: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<DdragonError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DdragonError) -> u8 {
    match error {
        DdragonError::NotFoundLocally(_)
        | DdragonError::FallbackExhausted(_)
        | DdragonError::NoLocalVersions => 2,
        DdragonError::CdnHttp(_) | DdragonError::CdnStatus { .. } => 3,
        _ => 1,
    }
}

#[tokio::main]
async fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::new()?,
    };

    let cdn = CdnHttpClient::new()?;
    let coordinator = Coordinator::new(config, Arc::new(cdn), Arc::new(TracingSink));
    let reader = Reader::new(coordinator.clone());

    match cli.command {
        Commands::Fetch(args) => {
            let version = args
                .version
                .as_deref()
                .map(str::parse::<Version>)
                .transpose()?;
            let locale: Locale = args.locale.parse()?;
            let value = reader.read(version, args.dataset, &locale).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&value).into_diagnostic()?
            );
        }
        Commands::Update(args) => {
            let locale: Locale = args.locale.parse()?;
            let downloaded = coordinator.update(&locale).await?;
            for version in &downloaded {
                println!("{version}");
            }
            tracing::info!("downloaded {} version(s) for {locale}", downloaded.len());
        }
        Commands::Versions => {
            for version in coordinator.versions().await? {
                println!("{version}");
            }
        }
        Commands::List => {
            let mut versions = coordinator.store().versions_on_disk()?;
            Version::sort_descending(&mut versions);
            for version in versions {
                println!("{version}");
            }
        }
    }
    Ok(())
}
