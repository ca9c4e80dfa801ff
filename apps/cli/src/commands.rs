//! CLI command definitions, routing, and tracing setup.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use guidepress_artifacts::ArtifactWriter;
use guidepress_core::{
    BatchOptions, BatchProgress, BatchRunner, BuildProcessor, GhostClient, GuidePipeline,
    PipelineOptions, Publisher, assign, default_start, find_resume_point, load_build_list,
    published_names,
};
use guidepress_shared::{
    AppConfig, BatchItem, BatchReport, DEFAULT_CATEGORY, ItemResult, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const DEFAULT_BUILD: &str = "Storm Sorcerer";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// GuidePress: Korean BG3 build guides from a build name.
#[derive(Parser)]
#[command(
    name = "guidepress",
    version,
    about = "Generate, illustrate, and publish Korean Baldur's Gate 3 build guides.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Shorthand for -vv.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file (defaults to ~/.guidepress/guidepress.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate one guide.
    Generate {
        /// Build name. Asked for on stdin when omitted.
        #[arg(short, long)]
        build: Option<String>,

        /// Where to save the guide (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Save only, do not publish.
        #[arg(long)]
        no_post: bool,

        /// Use canned texts instead of the generation backends. Implies --no-post.
        #[arg(long)]
        test: bool,
    },

    /// Generate every build in a list file.
    Batch {
        #[command(flatten)]
        list: ListArgs,

        /// Seconds to wait between builds.
        #[arg(long)]
        delay: Option<u64>,

        /// Zero-based index of the first build.
        #[arg(long, default_value = "0")]
        start: usize,

        /// Maximum number of builds.
        #[arg(long)]
        max: Option<usize>,

        #[arg(long)]
        no_post: bool,
    },

    /// Continue a batch from the first build not yet published.
    Resume {
        #[command(flatten)]
        list: ListArgs,

        #[arg(long)]
        delay: Option<u64>,

        /// Print the status and stop.
        #[arg(long)]
        dry_run: bool,
    },

    /// Publish a list as scheduled posts.
    Schedule {
        #[command(flatten)]
        list: ListArgs,

        /// First publish time, RFC 3339. Defaults to now plus `schedule.lead_hours`.
        #[arg(long)]
        start_at: Option<String>,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        interval_hours: Option<u64>,

        #[arg(long)]
        break_hours: Option<u64>,

        #[arg(long, default_value = "0")]
        start: usize,

        #[arg(long)]
        max: Option<usize>,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct ListArgs {
    /// Build list file (defaults to `defaults.build_list`).
    #[arg(short, long)]
    list: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if cli.debug { cli.verbose.max(2) } else { cli.verbose };
    let filter = match level {
        0 => "guidepress=info",
        1 => "guidepress=debug",
        _ => "guidepress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate {
            build,
            output_dir,
            no_post,
            test,
        } => {
            let config = resolve_config(config_path)?;
            cmd_generate(&config, build, output_dir, no_post, test).await
        }
        Command::Batch {
            list,
            delay,
            start,
            max,
            no_post,
        } => {
            let config = resolve_config(config_path)?;
            let options = BatchOptions {
                delay: delay_or_default(delay, &config),
                start_index: start,
                max_items: max,
            };
            cmd_batch(&config, list.list, options, !no_post).await
        }
        Command::Resume {
            list,
            delay,
            dry_run,
        } => {
            let config = resolve_config(config_path)?;
            let delay = delay_or_default(delay, &config);
            cmd_resume(&config, list.list, delay, dry_run).await
        }
        Command::Schedule {
            list,
            start_at,
            batch_size,
            interval_hours,
            break_hours,
            start,
            max,
        } => {
            let mut config = resolve_config(config_path)?;
            if let Some(v) = batch_size {
                config.schedule.batch_size = v;
            }
            if let Some(v) = interval_hours {
                config.schedule.interval_hours = v;
            }
            if let Some(v) = break_hours {
                config.schedule.break_hours = v;
            }
            cmd_schedule(&config, list.list, start_at.as_deref(), start, max).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

fn delay_or_default(delay: Option<u64>, config: &AppConfig) -> Duration {
    Duration::from_secs(delay.unwrap_or(config.defaults.delay_secs))
}

fn list_path(list: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    list.unwrap_or_else(|| PathBuf::from(&config.defaults.build_list))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    build: Option<String>,
    output_dir: Option<PathBuf>,
    no_post: bool,
    test: bool,
) -> Result<()> {
    let build_name = match build {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => prompt_build_name()?,
    };

    let options = PipelineOptions {
        test_mode: test,
        publish: !no_post && !test,
        output_dir,
    };
    let pipeline = GuidePipeline::from_config(config, &options)?;

    info!(build = %build_name, test, publish = options.publish, "generating guide");

    let spinner = spinner(&format!("{build_name} 가이드 생성 중"));
    let outcome = pipeline
        .process(&BatchItem::new(&build_name, DEFAULT_CATEGORY))
        .await;
    spinner.finish_and_clear();

    let processed = outcome.wrap_err_with(|| format!("failed to generate '{build_name}'"))?;

    println!();
    println!("  Guide generated!");
    println!("  Build:  {build_name}");
    println!("  Images: {}", processed.stats.image_count);
    println!("  Chars:  {}", processed.stats.char_count);
    if let Some(url) = &processed.post_url {
        println!("  Post:   {url}");
    }
    println!();

    Ok(())
}

async fn cmd_batch(
    config: &AppConfig,
    list: Option<PathBuf>,
    options: BatchOptions,
    publish: bool,
) -> Result<()> {
    let items = load_build_list(&list_path(list, config))?;
    let pipeline = GuidePipeline::from_config(
        config,
        &PipelineOptions {
            publish,
            ..PipelineOptions::default()
        },
    )?;

    let report = run_batch(&pipeline, &items, &options).await;
    save_report(config, &report)
}

async fn cmd_resume(config: &AppConfig, list: Option<PathBuf>, delay: Duration, dry_run: bool) -> Result<()> {
    let items = load_build_list(&list_path(list, config))?;

    let ghost = GhostClient::from_config(&config.ghost)?;
    let posts = ghost.list_posts(Some(&config.ghost.batch_tag)).await?;
    let published = published_names(&posts);
    let resume_at = find_resume_point(&items, &published);

    println!();
    println!("  Builds:    {}", items.len());
    println!("  Published: {}", published.len());
    match items.get(resume_at) {
        Some(item) => println!("  Next:      #{resume_at} {}", item.name),
        None => println!("  Next:      (all done)"),
    }
    println!();

    if dry_run || resume_at >= items.len() {
        return Ok(());
    }

    let pipeline = GuidePipeline::from_config(config, &PipelineOptions::default())?
        .with_publisher(Box::new(ghost));

    let options = BatchOptions {
        delay,
        start_index: resume_at,
        max_items: None,
    };
    let report = run_batch(&pipeline, &items, &options).await;
    save_report(config, &report)
}

async fn cmd_schedule(
    config: &AppConfig,
    list: Option<PathBuf>,
    start_at: Option<&str>,
    start: usize,
    max: Option<usize>,
) -> Result<()> {
    let all = load_build_list(&list_path(list, config))?;
    let selection = BatchOptions {
        start_index: start,
        max_items: max,
        ..BatchOptions::default()
    };
    let mut items = guidepress_core::batch::select(&all, &selection).to_vec();

    let first = match start_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| eyre!("invalid --start-at '{raw}': {e}"))?
            .with_timezone(&Utc),
        None => default_start(Utc::now(), &config.schedule)?,
    };
    assign(&mut items, first, &config.schedule)?;

    if let (Some(head), Some(tail)) = (items.first(), items.last()) {
        info!(
            count = items.len(),
            first = %head.scheduled_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            last = %tail.scheduled_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            "publish times assigned"
        );
    }

    let pipeline = GuidePipeline::from_config(
        config,
        &PipelineOptions {
            publish: true,
            ..PipelineOptions::default()
        },
    )?;

    let options = BatchOptions {
        delay: Duration::from_secs(config.defaults.delay_secs),
        ..BatchOptions::default()
    };
    let report = run_batch(&pipeline, &items, &options).await;
    save_report(config, &report)
}

async fn run_batch(pipeline: &GuidePipeline, items: &[BatchItem], options: &BatchOptions) -> BatchReport {
    let progress = CliProgress::new();
    BatchRunner::new(pipeline, &progress).run(items, options).await
}

fn save_report(config: &AppConfig, report: &BatchReport) -> Result<()> {
    let artifact = ArtifactWriter::new(&config.defaults.output_dir).write_report(report)?;

    println!();
    println!("  Batch finished!");
    println!("  Completed: {}/{}", report.completed, report.total);
    println!("  Failed:    {}", report.failed);
    println!("  Success:   {:.1}%", report.success_rate);
    println!("  Time:      {:.1} min", report.total_time_minutes);
    println!("  Report:    {}", artifact.path.display());
    for failed in report.results.iter().filter(|r| !r.success) {
        println!(
            "  - {}: {}",
            failed.build_name,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn prompt_build_name() -> Result<String> {
    print!("Build name [{DEFAULT_BUILD}]: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim();
    Ok(if name.is_empty() {
        DEFAULT_BUILD.to_string()
    } else {
        name.to_string()
    })
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Batch progress bar using indicatif.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl BatchProgress for CliProgress {
    fn item_started(&self, index: usize, total: usize, item: &BatchItem) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(format!("{} ({})", item.name, item.category));
    }

    fn item_finished(&self, index: usize, _total: usize, result: &ItemResult) {
        self.bar.set_position(index as u64 + 1);
        let mark = if result.success { "ok" } else { "failed" };
        self.bar
            .println(format!("  [{mark}] {} ({:.1}s)", result.build_name, result.execution_time));
    }

    fn waiting(&self, delay: Duration) {
        self.bar.set_message(format!("waiting {}s", delay.as_secs()));
    }

    fn done(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}
