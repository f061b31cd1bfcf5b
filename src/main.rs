use clap::Parser;
use synth_data::config::{CliConfig, Command, GenerateArgs};
use synth_data::core::{analysis, parser, samples};
use synth_data::domain::model::DatasetAnalysis;
use synth_data::utils::error::{ErrorSeverity, SynthError};
use synth_data::utils::{logger, validation::Validate};
use synth_data::{LocalStorage, SynthEngine, SynthPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting synth-data CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let result = match config.command {
        Command::Analyze { input, json } => analyze(&input, json).await,
        Command::Generate(args) => generate(args, config.monitor).await,
        Command::Samples => {
            list_samples();
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
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

    Ok(())
}

async fn analyze(input: &str, as_json: bool) -> Result<(), SynthError> {
    let bytes = tokio::fs::read(input).await?;
    let dataset = parser::parse_bytes(input, &bytes)?;
    let report = analysis::analyze(&dataset)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_analysis(input, &report);
    }
    Ok(())
}

async fn generate(args: GenerateArgs, monitor_enabled: bool) -> Result<(), SynthError> {
    let job = args.into_job()?;
    job.validate()?;

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(job.output_path.clone());
    let pipeline = SynthPipeline::new(storage, job);
    let engine = SynthEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = engine.run().await?;
    tracing::info!("✅ Generation completed successfully!");
    println!("✅ Generation completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

fn list_samples() {
    println!("📚 Sample datasets:");
    for dataset in samples::SAMPLE_DATASETS {
        println!(
            "  {:<24} {:<18} {:>7} rows  {}",
            dataset.id, dataset.category, dataset.record_count, dataset.description
        );
        println!("  {:<24} columns: {}", "", dataset.columns.join(", "));
    }
}

fn print_analysis(input: &str, report: &DatasetAnalysis) {
    println!("📋 Analysis of {}", input);
    println!("  Records: {}", report.total_records);
    println!("  Columns: {}", report.total_columns);
    println!("  Nulls: {:.2}%", report.null_percentage);
    println!("  Duplicates: {:.2}%", report.duplicate_percentage);
    println!("  Outliers: {:.2}%", report.outlier_percentage);
    println!("  Quality score: {:.1}", report.quality_score);
    println!("  Privacy score: {:.1}", report.privacy_score);
    println!("  Bias score: {:.1}", report.bias_score);
    println!();
    for column in &report.columns {
        let mut line = format!(
            "  {:<20} {:<12} sensitivity={:?}",
            column.name,
            format!("{:?}", column.column_type).to_lowercase(),
            column.sensitivity
        );
        if let Some(d) = &column.distribution {
            line.push_str(&format!(
                " mean={:.2} sd={:.2} range=[{}, {}]",
                d.mean, d.standard_deviation, d.min, d.max
            ));
        }
        if let Some(patterns) = column.patterns.as_ref().filter(|p| !p.is_empty()) {
            line.push_str(&format!(" patterns={:?}", patterns));
        }
        println!("{}", line);
    }
}
