use arcgis_scraper::{ArcGisScraper, ConfigLoader};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arcgis-scraper")]
#[command(version = "0.1.0")]
#[command(about = "Download ArcGIS feature layers to CSV, JSON or Parquet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every layer listed in a job file
    Run {
        /// Path to the job file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Show a progress bar (stderr); pass `--progress false` to disable
        #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
        progress: bool,
    },
    /// Print the metadata document of one layer
    Metadata {
        /// Path to the job file
        #[arg(short, long)]
        config: PathBuf,

        /// Layer path below the service URL, e.g. "0/query"
        #[arg(short, long)]
        layer: String,
    },
    /// Validate a job file
    Check {
        /// Path to the job file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = MultiProgress::new();

    match cli.command {
        Commands::Run { config, progress } => {
            if progress {
                indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init()?;
            } else {
                let level = logger.filter();
                log::set_boxed_logger(Box::new(logger))?;
                log::set_max_level(level);
            }

            log::info!("Loading config from {:?}", config);
            let job = ConfigLoader::load(&config)?;
            log::info!(
                "Loaded {} layer(s) from {}",
                job.layers.len(),
                job.service.base_url
            );

            let mut scraper = ArcGisScraper::new(&job.service)?;
            let mut progress_bar: Option<ProgressBar> = None;
            if progress {
                let pb = multi.add(ProgressBar::new(job.layers.len() as u64));
                pb.set_style(ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"));
                scraper = scraper.with_progress(pb.clone());
                progress_bar = Some(pb);
            }

            let outcomes = scraper.scrape_queries(&job.layers).await?;

            if let Some(pb) = progress_bar {
                pb.finish_with_message("done");
            }

            let metrics = scraper.metrics();
            let written = outcomes.iter().filter(|o| o.records() > 0).count();
            println!("\n✅ Scrape Completed:");
            println!("   Layers Exported: {}/{}", written, outcomes.len());
            println!("   Records Exported: {}", metrics.records_exported);
            println!("   Requests: {} ({} retries)", metrics.requests_total, metrics.retries);
            println!("   Success Rate: {:.1}%", metrics.success_rate);
            println!("   Average Duration: {}ms", metrics.avg_response_time_ms);
            println!("   Total Time: {:.1}s", metrics.elapsed_seconds);
        }
        Commands::Metadata { config, layer } => {
            log::set_boxed_logger(Box::new(logger))?;
            log::set_max_level(log::LevelFilter::Warn);

            let job = ConfigLoader::load(&config)?;
            let scraper = ArcGisScraper::new(&job.service)?;
            let metadata = scraper.fetch_metadata(&layer).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(job) => {
                    println!("✅ Config is valid:");
                    println!("   Base URL: {}", job.service.base_url);
                    println!("   Format: {}", job.service.export_format);
                    println!("   Export Directory: {}", job.service.export_directory.display());
                    for layer in &job.layers {
                        println!("   Layer: {} (where {})", layer.query.path, layer.query.where_clause);
                    }
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
