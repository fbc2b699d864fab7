// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{Result, anyhow};
use log::{LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod errors;
mod file_utils;
mod language_utils;
mod media;
mod providers;
mod retiming;
mod session;
mod subtitle_processor;
mod synthesis;
mod timeline;
mod translation;

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

impl From<app_config::LogLevel> for LevelFilter {
    fn from(level: app_config::LogLevel) -> Self {
        match level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dub a video into the target language (default command)
    #[command(alias = "dub")]
    Dub(DubArgs),

    /// Generate shell completions for dubwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct DubArgs {
    /// Input video file to dub
    #[arg(value_name = "INPUT_VIDEO")]
    input_video: PathBuf,

    /// Source-language SRT file (default: sidecar .srt, else extracted from the video)
    #[arg(long)]
    subtitle: Option<PathBuf>,

    /// Source URL the video came from; used to derive the session identifier
    #[arg(long)]
    source_url: Option<String>,

    /// Output directory for intermediate and final files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fa', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// TTS voice identifier
    #[arg(long)]
    voice: Option<String>,

    /// Translation model name
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the Gemini services
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,

    /// Merge consecutive cues in groups of this size before translation
    #[arg(long)]
    merge_count: Option<usize>,

    /// Mix the dubbed track over the attenuated original audio
    #[arg(short, long)]
    keep_original_audio: bool,

    /// Fraction of the original audio volume to keep (with -k)
    #[arg(long)]
    original_volume: Option<f32>,

    /// Skip cues whose clips already exist from a previous run
    #[arg(short, long)]
    resume: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// dubwai - Dubbing With AI
///
/// Turns a subtitled video into a dubbed one: cues are translated with an
/// LLM, spoken by a TTS voice, fitted into their time windows, and remuxed
/// against the original video stream.
#[derive(Parser, Debug)]
#[command(name = "dubwai")]
#[command(author = "dubwai Team")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered video dubbing tool")]
#[command(long_about = "dubwai translates a video's subtitles, synthesizes speech for every cue, \
retimes each clip into its cue window, and remuxes the assembled track against the source video.

EXAMPLES:
    dubwai movie.mkv                             # Dub using default config
    dubwai -t es movie.mkv                       # Dub into Spanish
    dubwai --subtitle movie.srt movie.mkv        # Use an explicit cue file
    dubwai --merge-count 4 movie.mkv             # Merge cue groups of 4 before translation
    dubwai -k --original-volume 0.2 movie.mkv    # Keep faint original audio under the dub
    dubwai -r movie.mkv                          # Resume an interrupted run
    dubwai completions bash > dubwai.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file to dub
    #[arg(value_name = "INPUT_VIDEO")]
    input_video: Option<PathBuf>,

    /// Source-language SRT file (default: sidecar .srt, else extracted from the video)
    #[arg(long)]
    subtitle: Option<PathBuf>,

    /// Source URL the video came from; used to derive the session identifier
    #[arg(long)]
    source_url: Option<String>,

    /// Output directory for intermediate and final files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fa', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// TTS voice identifier
    #[arg(long)]
    voice: Option<String>,

    /// Translation model name
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the Gemini services
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,

    /// Merge consecutive cues in groups of this size before translation
    #[arg(long)]
    merge_count: Option<usize>,

    /// Mix the dubbed track over the attenuated original audio
    #[arg(short, long)]
    keep_original_audio: bool,

    /// Fraction of the original audio volume to keep (with -k)
    #[arg(long)]
    original_volume: Option<f32>,

    /// Skip cues whose clips already exist from a previous run
    #[arg(short, long)]
    resume: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dubwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Dub(args)) => run_dub(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_video = cli
                .input_video
                .ok_or_else(|| anyhow!("INPUT_VIDEO is required when no subcommand is specified"))?;

            let args = DubArgs {
                input_video,
                subtitle: cli.subtitle,
                source_url: cli.source_url,
                output_dir: cli.output_dir,
                source_language: cli.source_language,
                target_language: cli.target_language,
                voice: cli.voice,
                model: cli.model,
                api_key: cli.api_key,
                merge_count: cli.merge_count,
                keep_original_audio: cli.keep_original_audio,
                original_volume: cli.original_volume,
                resume: cli.resume,
                force_overwrite: cli.force_overwrite,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_dub(args).await
        }
    }
}

/// Load config, apply CLI overrides, and run the pipeline
async fn run_dub(args: DubArgs) -> Result<()> {
    let mut config = Config::from_file_or_default(&args.config_path)?;

    // CLI overrides win over the config file
    if let Some(source_language) = args.source_language {
        config.source_language = source_language;
    }
    if let Some(target_language) = args.target_language {
        config.target_language = target_language;
    }
    if let Some(voice) = args.voice {
        config.tts.voice = voice;
    }
    if let Some(model) = args.model {
        config.translation.model = model;
    }
    if let Some(api_key) = args.api_key {
        config.translation.api_key = api_key.clone();
        config.tts.api_key = api_key;
    }
    if let Some(merge_count) = args.merge_count {
        config.merge_count = Some(merge_count);
    }
    if args.keep_original_audio {
        config.timeline.keep_original_audio = true;
    }
    if let Some(original_volume) = args.original_volume {
        config.timeline.original_volume = original_volume;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level.into();
    }

    // Re-apply the configured verbosity now that overrides are in
    log::set_max_level(config.log_level.clone().into());

    let controller = Controller::with_config(config)?;
    controller
        .run(
            args.input_video,
            args.subtitle,
            args.output_dir,
            args.source_url,
            args.resume,
            args.force_overwrite,
        )
        .await?;

    Ok(())
}
