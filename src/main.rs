//! Playtag CLI
//!
//! ```text
//! playtag read FILE
//! playtag write TAG FILE
//! playtag clear FILE
//! playtag play [--] [VLC_ARGS]... FILE
//! playtag parse TAG
//! ```
//!
//! Exit code 0 on success, 1 on any reported error. Diagnostics go to
//! stderr; only `read` and `parse` print to stdout.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playtag::core::{codec, player};
use playtag::{Config, clear_tag, read_tag, write_tag};

const CONFIG_ENV: &str = "PLAYTAG_CONFIG";
const DEBUG_ENV: &str = "PLAYTAG_DEBUG";

#[derive(Parser)]
#[command(name = "playtag")]
#[command(version, about = "Store playback options in media file metadata", long_about = None)]
struct Cli {
    /// Verbose diagnostics, and let mkvtoolnix print to the terminal
    #[arg(short, long, global = true)]
    debug: bool,

    /// Copy FILE to FILE.bak before modifying it
    #[arg(short, long, global = true)]
    backup: bool,

    /// TOML config file (defaults to $PLAYTAG_CONFIG)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the playtag stored in FILE
    Read { file: PathBuf },

    /// Store TAG in FILE, replacing any previous playtag
    Write { tag: String, file: PathBuf },

    /// Remove the playtag from FILE
    Clear { file: PathBuf },

    /// Play FILE in VLC with its playtag options
    ///
    /// -d, -b and -c are read as playtag flags until the first VLC argument.
    /// To pass one of them to VLC first, put `--` in front:
    /// `playtag play -- -b FILE`.
    #[command(visible_alias = "vlc")]
    Play {
        /// Extra VLC arguments, then the file to play (always last)
        #[arg(
            value_name = "VLC_ARGS... FILE",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },

    /// Show how TAG is understood and the VLC arguments it produces
    Parse { tag: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let debug = cli.debug || std::env::var(DEBUG_ENV).is_ok_and(|v| v == "1");
    init_tracing(debug);

    match run(cli, debug) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn run(cli: Cli, debug: bool) -> anyhow::Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    config.debug |= debug;
    config.backup |= cli.backup;
    tracing::debug!("Config: {config:?}");

    match cli.command {
        Commands::Read { file } => match read_tag(&file, &config)? {
            Some(tag) => {
                println!("{tag}");
                Ok(true)
            }
            None => Ok(false),
        },

        Commands::Write { tag, file } => {
            let ok = write_tag(&file, &tag, &config)?;
            if !ok {
                tracing::error!("Failed to write playtag to {}", file.display());
            }
            Ok(ok)
        }

        Commands::Clear { file } => {
            let ok = clear_tag(&file, &config)?;
            if !ok {
                tracing::error!("Failed to clear playtag from {}", file.display());
            }
            Ok(ok)
        }

        Commands::Play { mut args } => {
            let Some(file) = args.pop() else {
                bail!("missing file argument");
            };
            Ok(player::play(Path::new(&file), &args, &config)?)
        }

        Commands::Parse { tag } => {
            let options = codec::parse(Some(&tag), &config.flags);
            println!("{}", codec::serialize(&options));
            for arg in player::to_args(&options) {
                println!("{arg}");
            }
            Ok(true)
        }
    }
}
