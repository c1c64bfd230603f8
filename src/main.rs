// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use slidecast::app_config::{self, Config};
use slidecast::transcript::{load_captions, sentences};
use slidecast::{BuildRequest, Controller};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a YouTube json3 caption dump into sentences with start times (JSON on stdout)
    Sentences {
        /// Caption file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Generate shell completions for slidecast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// slidecast - Build a video from PDF slides and a recorded talk
#[derive(Parser, Debug)]
#[command(name = "slidecast")]
#[command(version)]
#[command(about = "Build a slide video from a PDF, an audio track and a timeline")]
#[command(subcommand_negates_reqs = true)]
#[command(long_about = "slidecast renders every PDF page, removes cut intervals from the audio, \
moves the slide switches accordingly and muxes everything into an MP4.

EXAMPLES:
    slidecast -p talk.pdf -a talk.mp3 -t timeline.json -o talk.mp4
    slidecast -p talk.pdf -a talk.mp3 -t timeline.json -c cuts.json -o talk.mp4
    slidecast ... --keep-pdf --keep-audio          # Reuse slides and cleaned audio
    slidecast ... --dry-run -v                     # Print the plan, run nothing
    slidecast sentences captions.json3 > s.json    # Caption dump to sentences
    slidecast completions bash > slidecast.bash    # Generate bash completions

TIMELINE FORMAT:
    [0, 12.5, \"01:03.2\"]                   page n starts at entry n
    [{\"t\": 0, \"page\": 0}, {\"t\": 40, \"page\": 3}]

CUTS FORMAT:
    [[15, 25], [\"1:00\", \"1:30\"]]            half-open [start, end) in seconds")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Slides PDF
    #[arg(short, long, required = true)]
    pdf: Option<PathBuf>,

    /// Narration audio (wav, mp3, aac, m4a, flac, ogg)
    #[arg(short, long, required = true)]
    audio: Option<PathBuf>,

    /// Timeline JSON with slide switch times
    #[arg(short, long, required = true)]
    timeline: Option<PathBuf>,

    /// Cuts JSON with intervals to remove
    #[arg(short, long)]
    cuts: Option<PathBuf>,

    /// Output MP4 file
    #[arg(short, long = "out", required = true)]
    out: Option<PathBuf>,

    /// Work directory for intermediate files [default: ./_cast_build]
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// PDF render DPI (kept for compatibility, slides are scaled to a fixed height)
    #[arg(long)]
    dpi: Option<u32>,

    /// Output frame rate (kept for compatibility, slides are encoded at 1 fps)
    #[arg(long)]
    fps: Option<u32>,

    /// Seconds added to every slide switch and cut (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    skew: Option<f64>,

    /// Configuration file path
    #[arg(long = "config")]
    config_path: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Parse, validate and print the plan without rendering, cutting or encoding
    #[arg(long)]
    dry_run: bool,

    /// Reuse cleaned audio from the work directory
    #[arg(long)]
    keep_audio: bool,

    /// Reuse rendered slides from the work directory
    #[arg(long)]
    keep_pdf: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, tag, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() {
    // The logger accepts everything; the max level does the filtering
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let mut cli = CommandLineOptions::parse();

    let result = match cli.command.take() {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "slidecast", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Sentences { input }) => run_sentences(&input),
        None => run_build(cli).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        log::logger().flush();
        std::process::exit(1);
    }
}

fn run_sentences(input: &Path) -> Result<()> {
    let captions = load_captions(input)?;
    let result = sentences(&captions.events);
    info!("{} sentence(s) found", result.len());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Merge the optional config file with command line overrides
fn build_config(options: &CommandLineOptions) -> Result<Config> {
    let mut config = match &options.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(workdir) = &options.workdir {
        config.workdir = workdir.clone();
    }
    if let Some(dpi) = options.dpi {
        config.dpi = dpi;
    }
    if let Some(fps) = options.fps {
        config.fps = fps;
    }
    if let Some(skew) = options.skew {
        config.skew = skew;
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    } else if options.verbose {
        config.log_level = app_config::LogLevel::Debug;
    }

    Ok(config)
}

async fn run_build(options: CommandLineOptions) -> Result<()> {
    let config = build_config(&options)?;
    log::set_max_level(level_filter(&config.log_level));
    debug!("Configuration: {:?}", config);

    let (Some(pdf), Some(audio), Some(timeline), Some(output)) =
        (options.pdf, options.audio, options.timeline, options.out)
    else {
        return Err(anyhow!("--pdf, --audio, --timeline and --out are required"));
    };

    let request = BuildRequest {
        pdf,
        audio,
        timeline,
        cuts: options.cuts,
        output,
        dry_run: options.dry_run,
        keep_audio: options.keep_audio,
        keep_pdf: options.keep_pdf,
    };

    let controller = Controller::with_config(config)?;
    controller.run(&request).await?;
    Ok(())
}
