use align_cli::{init_thread_pool, BatchAligner, BatchConfig, DiagnosticsSink, PairStatus, PreviewWriter};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "photoalign", author, version, about = "Align photos onto a reference photo")]
struct Cli {
    /// TOML batch configuration (parameters and pairs).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Reference photo shared by every destination given on the command line.
    #[arg(short, long, value_name = "FILE")]
    reference: Option<PathBuf>,
    /// Photos to align onto the reference.
    #[arg(value_name = "DESTINATION")]
    destinations: Vec<PathBuf>,
    /// Maximum number of keypoints per image.
    #[arg(long)]
    max_features: Option<usize>,
    /// Fraction of the best matches kept, in (0, 1].
    #[arg(long)]
    retain_fraction: Option<f32>,
    /// RANSAC inlier tolerance in pixels.
    #[arg(long)]
    reproj_threshold: Option<f64>,
    /// Appended to the destination file name to name the output.
    #[arg(long)]
    suffix: Option<String>,
    /// Worker threads.
    #[arg(long)]
    threads: Option<usize>,
    /// Align pairs concurrently.
    #[arg(long)]
    parallel: bool,
    /// Write match and warp previews into this directory.
    #[arg(long, value_name = "DIR")]
    preview_dir: Option<PathBuf>,
    /// Write the JSON batch report to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    fn batch_config(&self) -> Result<BatchConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::load_toml(path)?,
            None => BatchConfig::default(),
        };

        if let Some(max_features) = self.max_features {
            config.detector.max_features = max_features;
        }
        if let Some(fraction) = self.retain_fraction {
            config.matching.retain_fraction = fraction;
        }
        if let Some(threshold) = self.reproj_threshold {
            config.ransac.reprojection_threshold = threshold;
        }
        if let Some(suffix) = &self.suffix {
            config.output_suffix = suffix.clone();
        }
        if let Some(threads) = self.threads {
            config.detector.n_threads = threads;
        }
        if self.parallel {
            config.parallel = true;
        }

        match (&self.reference, self.destinations.is_empty()) {
            (Some(reference), _) => config.add_destinations(reference, self.destinations.iter().cloned()),
            (None, false) => return Err("destinations given without --reference".into()),
            (None, true) => {}
        }
        if config.pairs.is_empty() {
            return Err("nothing to align: pass --reference with destinations or a --config with pairs".into());
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Seconds))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.batch_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::from(2);
        }
    };
    log::debug!("{}", config.align_config().summary());

    if let Err(err) = init_thread_pool(config.detector.n_threads) {
        log::warn!("thread pool already initialised: {}", err);
    }

    let aligner = match BatchAligner::new(&config) {
        Ok(aligner) => aligner,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::from(2);
        }
    };

    let previews = match cli.preview_dir.as_ref().map(PreviewWriter::new).transpose() {
        Ok(previews) => previews,
        Err(err) => {
            log::error!("cannot create preview directory: {}", err);
            return ExitCode::from(2);
        }
    };

    let report = aligner.run(&config.pairs, previews.as_ref().map(|p| p as &dyn DiagnosticsSink));

    for pair in &report.pairs {
        match (&pair.status, &pair.outcome) {
            (PairStatus::Aligned, Some(outcome)) => println!(
                "ok      {} -> {} ({} inliers / {} matches)",
                pair.destination.display(),
                outcome.output.display(),
                outcome.inliers,
                outcome.kept_matches
            ),
            _ => println!(
                "FAILED  {} [{}] {}",
                pair.destination.display(),
                pair.error_kind.as_deref().unwrap_or("unknown"),
                pair.error.as_deref().unwrap_or("")
            ),
        }
    }
    println!("{} aligned, {} failed", report.aligned(), report.failed());

    if let Some(path) = &cli.report {
        if let Err(err) = report.save_json(path) {
            log::error!("cannot write report {}: {}", path.display(), err);
            return ExitCode::from(2);
        }
    }

    if report.all_aligned() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
