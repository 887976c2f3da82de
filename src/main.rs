use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use qrstamp::capacity::ErrorCorrectionLevel;
use qrstamp::config::Config;
use qrstamp::helper::{encode_png, Studio};
use qrstamp::icon::IconLoader;

/// qrstamp: render text as a QR code with an optional logo
#[derive(Parser, Debug)]
#[command(name = "qrstamp", version, about)]
struct Cli {
    /// Configuration file (defaults to ./qrstamp.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics (payload sizes, chosen version)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a preview and export it at one or more sizes
    Generate {
        /// Text to encode, or '-' to read standard input
        text: String,

        /// Error correction level: L, M, Q or H
        #[arg(short, long)]
        level: Option<ErrorCorrectionLevel>,

        /// Logo to place in the middle of the symbol
        #[arg(short, long)]
        icon: Option<PathBuf>,

        /// Export size in pixels (1 to 16384); may be repeated
        #[arg(short, long = "size", value_parser = clap::value_parser!(u32).range(1..=16384))]
        sizes: Vec<u32>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> qrstamp::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            text,
            level,
            icon,
            sizes,
            out,
        } => {
            let pending = icon.or_else(|| config.icon.clone()).map(IconLoader::spawn);
            let text = read_text(text)?;
            let level = level.unwrap_or(config.error_correction);
            let out = out.unwrap_or_else(|| config.output_dir.clone());

            let mut studio = Studio::from_config(&config);
            if let Some(pending) = pending {
                studio.set_icon(Some(pending.wait()?));
            }

            let preview = studio.generate(&text, level)?;
            let preview_path = out.join("preview.png");
            let png = encode_png(&preview.image)?;
            std::fs::create_dir_all(&out).map_err(|source| qrstamp::Error::Io {
                path: out.clone(),
                source,
            })?;
            std::fs::write(&preview_path, png).map_err(|source| qrstamp::Error::Io {
                path: preview_path.clone(),
                source,
            })?;
            println!("{}", preview_path.display());

            for size in sizes {
                let path = studio.export(size)?.save_to(&out)?;
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn read_text(text: String) -> qrstamp::Result<String> {
    if text != "-" {
        return Ok(text);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|source| qrstamp::Error::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(buffer)
}
