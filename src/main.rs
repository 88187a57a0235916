use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use council_scraper::app::discovery_use_case::DiscoveryUseCase;
use council_scraper::app::ports::{PageFetcher, RowStore};
use council_scraper::app::scrape_use_case::{ScrapeOptions, ScrapeStores, ScrapeUseCase};
use council_scraper::app::status_use_case::council_status;
use council_scraper::config::{Config, FetchBackend, DEFAULT_CONFIG_PATH};
use council_scraper::infra::csv_io::{export_worksheet, import_csv};
use council_scraper::infra::firecrawl::FirecrawlFetcher;
use council_scraper::infra::http_client::ReqwestFetcher;
use council_scraper::infra::pacing::Pacer;
use council_scraper::infra::sqlite_store::SqliteWorkbook;
use council_scraper::observability::{init_logging, metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "council_scraper")]
#[command(about = "Resumable scraper for council business directories")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Council to work on, overriding [council] name
    #[arg(long, global = true)]
    council: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the state page and record subcategories in the tracking worksheet
    Discover {
        /// State landing page, overriding [council] state_url
        #[arg(long)]
        state_url: Option<String>,
    },
    /// Scrape the council's remaining subcategories into its output worksheet
    Scrape,
    /// Show where the next scrape would resume
    Status,
    /// Write a worksheet to a CSV file
    Export {
        #[arg(value_enum)]
        sheet: Sheet,
        file: PathBuf,
    },
    /// Append the rows of a CSV file to a worksheet
    Import {
        #[arg(value_enum)]
        sheet: Sheet,
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sheet {
    Tracking,
    Output,
    Skipped,
}

struct Workbooks {
    tracking: Arc<dyn RowStore>,
    output: Arc<dyn RowStore>,
    skipped: Arc<dyn RowStore>,
}

impl Workbooks {
    fn open(config: &Config) -> anyhow::Result<Self> {
        let tracking_book = SqliteWorkbook::open(&config.workbook.tracking_path).with_context(|| {
            format!("opening tracking workbook {}", config.workbook.tracking_path.display())
        })?;
        let output_book = SqliteWorkbook::open(&config.workbook.output_path).with_context(|| {
            format!("opening output workbook {}", config.workbook.output_path.display())
        })?;
        Ok(Self {
            tracking: Arc::new(tracking_book.worksheet(&config.workbook.tracking_worksheet)),
            output: Arc::new(output_book.worksheet(&config.output_worksheet())),
            skipped: Arc::new(output_book.worksheet(&config.skipped_worksheet())),
        })
    }

    fn sheet(&self, sheet: Sheet) -> &dyn RowStore {
        match sheet {
            Sheet::Tracking => self.tracking.as_ref(),
            Sheet::Output => self.output.as_ref(),
            Sheet::Skipped => self.skipped.as_ref(),
        }
    }
}

fn build_fetcher(config: &Config) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let fetcher: Arc<dyn PageFetcher> = match config.fetch.backend {
        FetchBackend::Http => Arc::new(ReqwestFetcher::new(&config.fetch)?),
        FetchBackend::Firecrawl => Arc::new(FirecrawlFetcher::new(&config.firecrawl, &config.fetch)?),
    };
    Ok(fetcher)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(council) = &cli.council {
        config.council.name = council.clone();
    }

    let _log_guard = init_logging(&config.logging.dir);
    if let Some(listen) = config.metrics.listen {
        if let Err(e) = metrics::init(listen) {
            warn!("Metrics disabled: {}", e);
        }
    }

    let books = Workbooks::open(&config)?;
    let pacer = Pacer::from_config(&config.pacing);

    match cli.command {
        Commands::Discover { state_url } => {
            let state_url = state_url.unwrap_or_else(|| config.council.state_url.clone());
            let discovery = DiscoveryUseCase::new(
                build_fetcher(&config)?,
                Arc::clone(&books.tracking),
                &config.council.base_url,
                pacer,
            );
            let summary = discovery.run(&state_url, cli.council.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Scrape => {
            let scrape = ScrapeUseCase::new(
                build_fetcher(&config)?,
                ScrapeStores {
                    tracking: Arc::clone(&books.tracking),
                    output: Arc::clone(&books.output),
                    skipped: Arc::clone(&books.skipped),
                },
                ScrapeOptions {
                    council: config.council.name.clone(),
                    base_url: config.council.base_url.clone(),
                    detail_attempts: config.fetch.detail_attempts,
                    resolve_websites: config.fetch.resolve_websites,
                },
                pacer,
            );
            match scrape.run().await {
                Ok(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                Err(e) => {
                    error!("Scrape aborted: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Status => {
            let report = council_status(
                &config.council.name,
                books.tracking.as_ref(),
                books.output.as_ref(),
            )
            .await?;
            println!("{}", report);
        }
        Commands::Export { sheet, file } => {
            let rows = export_worksheet(books.sheet(sheet), &file).await?;
            info!("Export complete");
            println!("Wrote {} rows to {}", rows, file.display());
        }
        Commands::Import { sheet, file } => {
            let rows = import_csv(&file, books.sheet(sheet)).await?;
            println!("Imported {} rows from {}", rows, file.display());
        }
    }

    Ok(())
}
