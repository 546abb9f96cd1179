use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use mdnarrate::batch::{self, ConvertOptions, ConvertOptionsBuilder, ErrorPolicy};
use mdnarrate::engines::espeak::{EspeakConfig, EspeakEngine, DEFAULT_RATE};
use mdnarrate::transcode::lame::{LameTranscoder, DEFAULT_BITRATE_KBPS};

/// Narrate every markdown file in a folder into MP3 files.
#[derive(Debug, Parser)]
#[command(name = "mdnarrate", version, about)]
struct Cli {
    /// Directory containing the .md files to narrate
    input_dir: PathBuf,

    /// Directory to write the .mp3 files into (created if missing)
    output_dir: PathBuf,

    /// Speaking rate in words per minute
    #[arg(long, default_value_t = DEFAULT_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    rate: u32,

    /// espeak-ng voice name (e.g. en-us, en-gb)
    #[arg(long)]
    voice: Option<String>,

    /// Path to the espeak-ng executable
    #[arg(long, value_name = "PATH")]
    espeak: Option<PathBuf>,

    /// Directory containing espeak-ng-data
    #[arg(long, value_name = "PATH")]
    espeak_data: Option<PathBuf>,

    /// MP3 bitrate in kbps
    #[arg(long, default_value_t = DEFAULT_BITRATE_KBPS)]
    bitrate: u32,

    /// Keep converting the remaining files when one fails
    #[arg(long)]
    keep_going: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn espeak_config(&self) -> EspeakConfig {
        EspeakConfig {
            bin_path: self.espeak.clone(),
            data_path: self.espeak_data.clone(),
            voice: self.voice.clone(),
            rate: self.rate,
        }
    }

    fn convert_options(&self) -> mdnarrate::Result<ConvertOptions> {
        let on_error = if self.keep_going {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Abort
        };
        ConvertOptionsBuilder::default()
            .on_error(on_error)
            .build()
            .map_err(|e| mdnarrate::Error::InvalidOptions(e.to_string()))
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level())).init();
    ExitCode::from(exit_status(&run(&cli)))
}

/// 0 when every document converted, 1 otherwise.
fn exit_status(outcome: &mdnarrate::Result<bool>) -> u8 {
    match outcome {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            log::error!("{e}");
            1
        }
    }
}

/// Returns whether every document converted.
fn run(cli: &Cli) -> mdnarrate::Result<bool> {
    let mut engine = EspeakEngine::with_config(cli.espeak_config());
    if !engine.is_available() {
        return Err(mdnarrate::Error::EspeakNotFound);
    }
    let mut transcoder = LameTranscoder::new(cli.bitrate)?;
    let options = cli.convert_options()?;

    let report = batch::convert(
        &cli.input_dir,
        &cli.output_dir,
        &mut engine,
        &mut transcoder,
        &options,
    )?;

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        log::info!("Report written to {}", path.display());
    }

    for failed in &report.failed {
        log::error!("{}: {}", failed.source.display(), failed.error);
    }

    Ok(report.is_success())
}
