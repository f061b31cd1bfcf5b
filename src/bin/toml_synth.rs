use anyhow::Context;
use clap::Parser;
use synth_data::config::absolute_source;
use synth_data::core::samples;
use synth_data::domain::model::DataSource;
use synth_data::utils::error::ErrorSeverity;
use synth_data::utils::{logger, validation::Validate};
use synth_data::{LocalStorage, SynthEngine, SynthPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-synth")]
#[command(about = "Run a synthetic data job described in a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "synth-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the generation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Show what would be generated without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The config file may set the log level, so it is read before logging starts.
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    logger::init_cli_logger_with_level(args.verbose, config.log_level());

    tracing::info!("🚀 Starting TOML-based synthetic data job");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(seed) = args.seed {
        config.generation.seed = Some(seed);
        tracing::info!("🔧 Seed overridden to: {}", seed);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    config.source = absolute_source(config.source)?;

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = SynthPipeline::new(storage, config);
    let engine = SynthEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Generation completed successfully!");
            println!("✅ Generation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    if config.job.version.is_empty() {
        println!("  Job: {}", config.job.name);
    } else {
        println!("  Job: {} v{}", config.job.name, config.job.version);
    }
    if !config.job.description.is_empty() {
        println!("  Description: {}", config.job.description);
    }
    println!("  Source: {}", config.source);
    println!("  Output: {}", config.output.path);
    println!("  Format: {}", config.generation.format);
    println!("  Records: {}", config.generation.record_count);
    if let Some(seed) = config.generation.seed {
        println!("  Seed: {}", seed);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    let generation = &config.generation;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Data Source:");
    match &config.source {
        DataSource::File { path } => println!("  File: {}", path),
        DataSource::Url { url } => println!("  URL: {}", url),
        DataSource::Sample { id, records } => {
            println!("  Sample dataset: {} ({} source rows)", id, records);
            if let Some(sample) = samples::find_sample(id) {
                println!("  Columns: {}", sample.columns.join(", "));
            }
        }
    }

    println!();
    println!("⚙️ Generation:");
    println!("  Records: {}", generation.record_count);
    if generation.selected_columns.is_empty() {
        println!("  Columns: all source columns");
    } else {
        println!("  Columns: {}", generation.selected_columns.join(", "));
    }
    println!(
        "  Nulls: {}%  Outliers: {}%  Duplicates: {}%",
        generation.quality.null_percentage,
        generation.quality.outlier_percentage,
        generation.quality.duplicate_percentage
    );
    println!(
        "  Privacy: {:?} (anonymize: {}, k-anonymity label: {})",
        generation.privacy.level, generation.privacy.anonymize, generation.privacy.k_anonymity
    );

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output.path);
    match &config.output.bundle {
        Some(bundle) => println!(
            "  Bundle: {} (synthetic_data.{}, analysis.json, metadata.json)",
            bundle, generation.format
        ),
        None => println!("  File: synthetic_data.{}", generation.format),
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
