use crate::cli::args::{Cli, Commands, InputArgs, OutputArgs, PipelineArgs};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use crate::processors::{AnomalyPipeline, IntegrityChecker, SimpleAverager};
use crate::readers::{
    ConcurrentReader, DatasetLocator, DatasetPaths, InputPaths, InputTables, ObservationReader,
    ReferenceReader,
};
use crate::utils::filename::{
    generate_default_output_filename, generate_default_reference_filename,
    generate_default_simple_average_filename,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{read_series, OutputFormat, ParquetWriter, SeriesOutput, SeriesValue};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process {
            input,
            land_mask,
            pipeline,
            output,
        } => {
            let config = load_config(cli.config.as_deref(), &pipeline)?;
            config.log_config();

            let paths = InputPaths::new(resolve_dataset(&input)?, land_mask);
            println!("Computing global anomaly series...");
            println!("Data file: {}", paths.data.display());
            println!("Inventory file: {}", paths.inventory.display());
            println!("Land mask: {}", paths.land_mask.display());
            println!(
                "Reference period: {}-{}, workers: {}",
                config.baseline_start_year, config.baseline_end_year, config.max_workers
            );

            let progress = ProgressReporter::new_spinner("Reading input tables...", false);
            let tables = read_tables(&config, &paths).await?;

            let output_run = AnomalyPipeline::from_config(&config).run(&tables, Some(&progress))?;

            let checker = IntegrityChecker::new();
            println!("\n{}", checker.pipeline_summary(&output_run.report));

            let (format, path) = resolve_output(&output, generate_default_output_filename);
            SeriesOutput::new(format)
                .with_compression(&output.compression)
                .write(&output_run.series, &path)?;

            println!(
                "Wrote {} years to {} ({})",
                output_run.series.len(),
                path.display(),
                format
            );
            println!("Processing complete!");
        }

        Commands::Validate {
            input,
            land_mask,
            pipeline,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref(), &pipeline)?;
            let paths = InputPaths::new(resolve_dataset(&input)?, land_mask);

            println!("Validating GHCN input tables...");
            let progress = ProgressReporter::new_spinner("Reading input tables...", false);
            let tables = read_tables(&config, &paths).await?;
            progress.finish_with_message("Input tables loaded");

            let checker = IntegrityChecker::new();
            let integrity_report = checker.check_integrity(&tables);
            println!("\n{}", checker.generate_summary(&integrity_report));

            if dry_run {
                let progress = ProgressReporter::new_spinner("Running pipeline...", false);
                let output_run =
                    AnomalyPipeline::from_config(&config).run(&tables, Some(&progress))?;
                println!("{}", checker.pipeline_summary(&output_run.report));
            }

            if integrity_report.rejected_lines.total() == 0 {
                println!("✅ All input lines parsed");
            } else {
                println!(
                    "⚠️  {} input lines were rejected",
                    integrity_report.rejected_lines.total()
                );
            }
        }

        Commands::SimpleAverage {
            input,
            pipeline,
            output,
        } => {
            let config = load_config(cli.config.as_deref(), &pipeline)?;
            let data_file = resolve_data_file(&input)?;
            println!("Computing simple average from {}", data_file.display());

            let progress = ProgressReporter::new_spinner("Reading observations...", false);
            let outcome = ObservationReader::new()
                .with_strict_validation(config.strict)
                .with_mmap(config.use_mmap)
                .read_records(&data_file)?;

            progress.set_message("Averaging complete station-years...");
            let series = SimpleAverager::new(config.series_filter()).compute(&outcome.records);
            progress.finish_with_message(&format!("Averaged {} years", series.len()));

            let (format, path) = resolve_output(&output, generate_default_simple_average_filename);
            SeriesOutput::new(format)
                .with_compression(&output.compression)
                .with_value(SeriesValue::Temperature)
                .write(&series, &path)?;
            println!("Wrote {} years to {}", series.len(), path.display());
        }

        Commands::Reference {
            dataset,
            input_file,
            pipeline,
            output,
        } => {
            let config = load_config(cli.config.as_deref(), &pipeline)?;
            println!("Importing {} series from {}", dataset, input_file.display());

            let series = ReferenceReader::new(dataset).read_series(&input_file)?;
            let series = config.series_filter().apply(series);

            let (format, path) = resolve_output(&output, |format| {
                generate_default_reference_filename(dataset.name(), format)
            });
            SeriesOutput::new(format)
                .with_compression(&output.compression)
                .write(&series, &path)?;
            println!("Wrote {} years to {}", series.len(), path.display());
        }

        Commands::Info { file, sample } => {
            println!("Analyzing series file: {}", file.display());

            let series = read_series(&file)?;
            println!("\n{}", series_summary(&series));

            if OutputFormat::from_path(&file) == Some(OutputFormat::Parquet) {
                let file_info = ParquetWriter::new().get_file_info(&file)?;
                println!("\nFile Details:");
                println!("{}", file_info.summary());
            }

            let shown = if sample == 0 { series.len() } else { sample };
            if shown > 0 && !series.is_empty() {
                println!(
                    "\nSample Rows (showing {} of {}):",
                    shown.min(series.len()),
                    series.len()
                );
                for point in series.iter().take(shown) {
                    println!("  {}  {:+.3}", point.year, point.anomaly);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}

/// Config file and environment first, then command-line overrides
fn load_config(path: Option<&Path>, args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(path)?;

    if let Some(year) = args.baseline_start {
        config.baseline_start_year = year;
    }
    if let Some(year) = args.baseline_end {
        config.baseline_end_year = year;
    }
    if let Some(year) = args.first_year {
        config.first_year = year;
    }
    if args.last_year.is_some() {
        config.last_year = args.last_year;
    }
    if let Some(workers) = args.max_workers {
        config.max_workers = workers;
    }
    if args.strict {
        config.strict = true;
    }
    if args.no_mmap {
        config.use_mmap = false;
    }

    config.check()?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn resolve_dataset(input: &InputArgs) -> Result<DatasetPaths> {
    if let (Some(data), Some(inventory)) = (&input.data_file, &input.inventory_file) {
        return Ok(DatasetPaths {
            data: data.clone(),
            inventory: inventory.clone(),
        });
    }

    let dir = input.input_dir.as_deref().ok_or_else(|| {
        ProcessingError::Config(
            "Either --input-dir or both --data-file and --inventory-file are required".to_string(),
        )
    })?;

    let mut paths = DatasetLocator::locate(dir)?;
    if let Some(data) = &input.data_file {
        paths.data = data.clone();
    }
    if let Some(inventory) = &input.inventory_file {
        paths.inventory = inventory.clone();
    }
    Ok(paths)
}

fn resolve_data_file(input: &InputArgs) -> Result<PathBuf> {
    match (&input.data_file, &input.input_dir) {
        (Some(data), _) => Ok(data.clone()),
        (None, Some(dir)) => Ok(DatasetLocator::locate(dir)?.data),
        (None, None) => Err(ProcessingError::Config(
            "Either --input-dir or --data-file is required".to_string(),
        )),
    }
}

fn resolve_output(
    output: &OutputArgs,
    default_path: impl Fn(OutputFormat) -> PathBuf,
) -> (OutputFormat, PathBuf) {
    match &output.output_file {
        Some(path) => (OutputFormat::resolve(output.format, path), path.clone()),
        None => {
            let format = output.format.unwrap_or(OutputFormat::Csv);
            (format, default_path(format))
        }
    }
}

async fn read_tables(config: &PipelineConfig, paths: &InputPaths) -> Result<InputTables> {
    let tables = ConcurrentReader::new()
        .with_strict_validation(config.strict)
        .with_mmap(config.use_mmap)
        .read_inputs(paths)
        .await?;

    info!(rejected = tables.rejected.total(), "input tables ready");
    Ok(tables)
}

fn series_summary(series: &[GlobalAnnualAnomaly]) -> String {
    let mut summary = String::from("=== Series Summary ===\n");
    summary.push_str(&format!("Years: {}\n", series.len()));

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return summary;
    };
    summary.push_str(&format!("Span: {}-{}\n", first.year, last.year));

    let mean = series.iter().map(|p| p.anomaly).sum::<f64>() / series.len() as f64;
    summary.push_str(&format!("Mean: {:+.3}\n", mean));

    let coldest = series.iter().min_by(|a, b| a.anomaly.total_cmp(&b.anomaly));
    let warmest = series.iter().max_by(|a, b| a.anomaly.total_cmp(&b.anomaly));
    if let (Some(coldest), Some(warmest)) = (coldest, warmest) {
        summary.push_str(&format!(
            "Coldest: {} ({:+.3})\nWarmest: {} ({:+.3})\n",
            coldest.year, coldest.anomaly, warmest.year, warmest.anomaly
        ));
    }

    summary
}
