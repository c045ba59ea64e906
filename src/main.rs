use clap::{ArgAction, Parser};
use constrain_img::config::{self, BatchConfig, ConfigError, ConfigLayer, PositionalArgs};
use constrain_img::output;
use constrain_img::process::{self, BatchError, BatchReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "constrain-img")]
#[command(about = "Shrink every image in a directory to fit a maximum width and height")]
#[command(long_about = "\
Shrink every image in a directory to fit a maximum width and height

Each .jpg, .jpeg, .png and .gif directly inside the source directory is
scaled down, aspect ratio preserved, so it fits inside the bounding box.
Images that already fit are re-encoded at the same size, never enlarged.
The output format always matches the input.

Positional arguments are read by count:

  constrain-img 800                    width, in the current directory
  constrain-img 800 600                width and height
  constrain-img raw/ web/ 800 [600]    source, output, width, height

Named flags win over positional arguments, which win over --config.
Writing into the source directory without --prefix or --suffix would
overwrite the originals and needs --force.")]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// Positional shorthand: [source out] width [height]
    #[arg(value_name = "ARGS", num_args = 0..=4)]
    positional: Vec<String>,

    /// Maximum output width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(short, long)]
    height: Option<u32>,

    /// Directory to read images from [default: current directory]
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory to write images to, created if missing [default: current directory]
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Text prepended to every output file name
    #[arg(long)]
    prefix: Option<String>,

    /// Text inserted before the extension of every output file name
    #[arg(long)]
    suffix: Option<String>,

    /// Encoder quality, 1-100 [default: 100]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Allow overwriting the source images
    #[arg(short, long)]
    force: bool,

    /// Suppress progress and completion output
    #[arg(long)]
    quiet: bool,

    /// Maximum parallel workers [default: one per CPU core]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Read defaults from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the batch report as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Log more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print help (-h is --height)
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Named flags as a config layer. Switches only count when given.
    fn flags_layer(&self) -> ConfigLayer {
        ConfigLayer {
            source: self.source.clone(),
            out: self.out.clone(),
            width: self.width,
            height: self.height,
            quality: self.quality,
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            force: self.force.then_some(true),
            quiet: self.quiet.then_some(true),
            jobs: self.jobs,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FAILED: {e}");
            return ExitCode::FAILURE;
        }
    };

    setup_logging(cli.verbose, config.quiet);
    init_thread_pool(config.jobs);

    let show_progress = !config.quiet && !cli.json;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if show_progress {
                for line in output::format_batch_event(&event) {
                    println!("{}", line);
                }
            }
        }
    });
    let result = process::run_batch(&config, Some(tx));
    if printer.join().is_err() {
        tracing::warn!("Progress printer panicked");
    }

    match result {
        Ok(report) => {
            if cli.json {
                print_json(&report);
            } else if show_progress {
                output::print_completion(&report);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let BatchError::JobsFailed(report) = &e {
                if cli.json {
                    print_json(report);
                } else if show_progress {
                    output::print_completion(report);
                }
            }
            output::print_batch_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Stack config file, positional arguments and flags into one config.
fn build_config(cli: &Cli) -> Result<BatchConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => ConfigLayer::default(),
    };
    let positional = PositionalArgs::from_args(&cli.positional)?.into_layer();
    let cwd = std::env::current_dir()?;

    file.merge(positional)
        .merge(cli.flags_layer())
        .into_config(&cwd)
}

fn print_json(report: &BatchReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("FAILED: cannot serialize report: {e}"),
    }
}

/// Logs go to stderr so stdout stays clean for progress and `--json`.
fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(jobs: Option<usize>) {
    let threads = config::effective_threads(jobs);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
