use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use locpage::config::LocpageConfig;
use locpage::content::ContentGenerationEngine;
use locpage::lexicon::Lexicon;
use locpage::location::LocationSeoData;
use locpage::logging::{init_logging, LoggingConfig};
use locpage::output::{FileGenerator, LocationStatus, RegistryManager};
use locpage::pipeline::{LocationPipeline, PipelineObserver, TracingObserver};
use locpage::research::{FileResearchProvider, ResearchProvider, StaticResearchProvider};
use locpage::seo::{ContentOptimizer, ScoringMode, SeoScorer};
use locpage::ui::{colors_enabled, ProgressObserver, ReportRenderer};

/// Scoring mode for the `score` command
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CliScoringMode {
    Basic,
    #[default]
    Advanced,
}

impl From<CliScoringMode> for ScoringMode {
    fn from(mode: CliScoringMode) -> Self {
        match mode {
            CliScoringMode::Basic => ScoringMode::Basic,
            CliScoringMode::Advanced => ScoringMode::Advanced,
        }
    }
}

/// Registry status accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliStatus {
    Draft,
    Active,
    Paused,
    Archived,
}

impl From<CliStatus> for LocationStatus {
    fn from(status: CliStatus) -> Self {
        match status {
            CliStatus::Draft => LocationStatus::Draft,
            CliStatus::Active => LocationStatus::Active,
            CliStatus::Paused => LocationStatus::Paused,
            CliStatus::Archived => LocationStatus::Archived,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "locpage")]
#[command(version)]
#[command(about = "Generate, score and publish local SEO pages for a women's health clinic")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Website root; overrides output.root from the configuration
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Disable colors (also respects NO_COLOR environment variable)
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where research comes from and how copy is seeded.
#[derive(clap::Args, Debug, Clone)]
struct ResearchArgs {
    /// City the locality belongs to
    #[arg(long, default_value = "Bangalore")]
    city: String,

    /// Directory of `<slug>.json` research files; defaults are used when omitted
    #[arg(long, value_name = "DIR")]
    research_dir: Option<PathBuf>,

    /// Seed for the opening phrase picker, for reproducible copy
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate, optimize, check and write the page for one location
    Generate {
        /// Location name, e.g. "Indira Nagar"
        location: String,

        #[command(flatten)]
        research: ResearchArgs,

        /// Render files without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the QA result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline for several locations, one after another
    Batch {
        /// Location names
        #[arg(required_unless_present = "locations_file")]
        locations: Vec<String>,

        /// File with one location per line; `#` starts a comment
        #[arg(long, value_name = "FILE")]
        locations_file: Option<PathBuf>,

        #[command(flatten)]
        research: ResearchArgs,

        /// Render files without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Delay between locations in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score generated content without writing anything
    Score {
        location: String,

        #[command(flatten)]
        research: ResearchArgs,

        /// Scoring mode
        #[arg(long, default_value = "advanced", value_enum)]
        mode: CliScoringMode,

        /// Run the optimizer before reporting the score
        #[arg(long)]
        optimize: bool,

        /// Print the score as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run quality assurance on a location without writing anything
    Qa {
        location: String,

        #[command(flatten)]
        research: ResearchArgs,

        /// Print the QA result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or edit the location registry
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
    /// Rebuild the locations sitemap from the registry
    Sitemap,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand, Debug)]
enum RegistryAction {
    /// List registered locations
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a location from the registry
    Remove { slug: String },
    /// Change the status of a location
    Status {
        slug: String,
        #[arg(value_enum)]
        status: CliStatus,
    },
}

/// Exit codes
mod exit_codes {
    use std::process::ExitCode;

    /// A location failed or a quality gate did not pass
    pub fn failed() -> ExitCode {
        ExitCode::from(1)
    }

    /// Registry entry not found
    pub fn not_found() -> ExitCode {
        ExitCode::from(3)
    }
}

fn load_config(cli: &Cli) -> Result<LocpageConfig, Box<dyn std::error::Error>> {
    let mut config = LocpageConfig::load_or_default(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.output.root = root.clone();
    }
    let seed = match &cli.command {
        Commands::Generate { research, .. }
        | Commands::Batch { research, .. }
        | Commands::Score { research, .. }
        | Commands::Qa { research, .. } => research.seed,
        _ => None,
    };
    if seed.is_some() {
        config.brand.seed = seed;
    }
    Ok(config)
}

/// Locations from the command line followed by those in the locations file.
fn batch_locations(
    locations: &[String],
    file: Option<&Path>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut names = locations.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        names.extend(
            content
                .lines()
                .map(|line| line.split('#').next().unwrap_or_default().trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    Ok(names)
}

fn research_provider(args: &ResearchArgs) -> Arc<dyn ResearchProvider> {
    match &args.research_dir {
        Some(dir) => Arc::new(FileResearchProvider::new(dir.clone())),
        None => Arc::new(StaticResearchProvider::new()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_flags(cli.verbose, cli.quiet));

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit_codes::failed()
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    let renderer = ReportRenderer::new().with_colors(colors_enabled(cli.no_color));

    match &cli.command {
        Commands::Generate {
            location,
            research,
            dry_run,
            json,
        } => {
            let mut config = config;
            config.output.dry_run |= *dry_run;
            let pipeline = LocationPipeline::new(config, research_provider(research))
                .with_observer(Arc::new(TracingObserver));
            let run = pipeline.run_location(location, &research.city).await?;

            if *json {
                print_json(&run.qa)?;
            } else if !cli.quiet {
                println!("{}", renderer.render_qa(&run.qa));
                for file in run.files.written() {
                    println!("wrote {}", file.path.display());
                }
                for warning in &run.files.warnings {
                    println!("warning: {warning}");
                }
            }
            if !run.qa.all_gates_passed() {
                return Ok(exit_codes::failed());
            }
        }
        Commands::Batch {
            locations,
            locations_file,
            research,
            dry_run,
            delay_ms,
            json,
        } => {
            let locations = batch_locations(locations, locations_file.as_deref())?;
            let mut config = config;
            config.output.dry_run |= *dry_run;
            if let Some(delay) = delay_ms {
                config.optimizer.batch_delay_ms = *delay;
            }
            let progress = if cli.quiet || *json {
                ProgressObserver::hidden(locations.len())
            } else {
                ProgressObserver::new(locations.len())
            };
            let observer: Arc<dyn PipelineObserver> = Arc::new(progress.clone());
            let pipeline =
                LocationPipeline::new(config, research_provider(research)).with_observer(observer);
            let report = pipeline
                .batch_optimize_locations(&locations, &research.city)
                .await;
            progress.finish();

            if *json {
                print_json(&report)?;
            } else if !cli.quiet {
                println!("{}", renderer.render_batch(&report));
            }
            if !report.all_succeeded() {
                return Ok(exit_codes::failed());
            }
        }
        Commands::Score {
            location,
            research,
            mode,
            optimize,
            json,
        } => {
            let facts = research_provider(research)
                .research(location, &research.city)
                .await?;
            let lexicon = Lexicon::default();
            let engine = ContentGenerationEngine::new(
                lexicon.clone(),
                config.clinic.clone(),
                config.brand.clone(),
            );
            let content = engine.generate_location_content(&facts, location);
            let data = LocationSeoData::assemble(&facts, &content, &config.clinic);
            let scorer = SeoScorer::new(lexicon, config.scoring.clone());

            let result = if *optimize {
                let mut optimizer_config = config.optimizer.clone();
                optimizer_config.mode = (*mode).into();
                ContentOptimizer::new(scorer, optimizer_config, config.clinic.name.clone())
                    .optimize(&content, &facts, Some(&data))
                    .result
            } else {
                scorer.score((*mode).into(), &content, &facts, Some(&data))
            };

            if *json {
                print_json(&result)?;
            } else if !cli.quiet {
                println!("{}", renderer.render_seo(location, &result));
            }
        }
        Commands::Qa {
            location,
            research,
            json,
        } => {
            let mut config = config;
            config.output.dry_run = true;
            let pipeline = LocationPipeline::new(config, research_provider(research))
                .with_observer(Arc::new(TracingObserver));
            let run = pipeline.run_location(location, &research.city).await?;

            if *json {
                print_json(&run.qa)?;
            } else if !cli.quiet {
                println!("{}", renderer.render_qa(&run.qa));
            }
            if !run.qa.all_gates_passed() {
                return Ok(exit_codes::failed());
            }
        }
        Commands::Registry { action } => {
            let registry = registry_manager(&config.output.root, config.output.backups);
            match action {
                RegistryAction::List { json } => {
                    let entries = registry.list()?;
                    if *json {
                        print_json(&entries)?;
                    } else {
                        println!("{}", renderer.render_registry(&entries));
                    }
                }
                RegistryAction::Remove { slug } => {
                    if !registry.remove(slug)? {
                        eprintln!("{slug} is not in the registry");
                        return Ok(exit_codes::not_found());
                    }
                    if !cli.quiet {
                        println!("removed {slug}");
                    }
                }
                RegistryAction::Status { slug, status } => {
                    if registry.get(slug)?.is_none() {
                        eprintln!("{slug} is not in the registry");
                        return Ok(exit_codes::not_found());
                    }
                    let entry = registry.update_status(slug, (*status).into())?;
                    if !cli.quiet {
                        println!("{} is now {}", entry.slug, entry.status);
                    }
                }
            }
        }
        Commands::Sitemap => {
            let registry = registry_manager(&config.output.root, config.output.backups);
            let entries = registry.list()?;
            let report =
                FileGenerator::from_config(&config.output).write_sitemap(&entries, &config.clinic)?;
            if !cli.quiet {
                for file in report.written() {
                    println!("wrote {} ({} locations)", file.path.display(), entries.len());
                }
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn registry_manager(root: &Path, backups: bool) -> RegistryManager {
    RegistryManager::new(root).with_backups(backups)
}
