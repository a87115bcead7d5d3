use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use trmaker::naming::BookNumbering;
use trmaker::report::write_summary;
use trmaker::{FfmpegExtractor, LogOpts, Opts, OutputType, Pipeline, init_logging};

fn main() -> Result<()> {
    let params = Params::parse();
    init_logging(LogOpts {
        verbose: params.verbose,
        json: params.log_json,
    });

    let opts = params.opts()?;
    let extractor = FfmpegExtractor::new(&params.ffmpeg)
        .with_timeout(params.timeout_secs.map(Duration::from_secs));

    let summary = Pipeline::with_extractor(opts, extractor)
        .run()
        .context("run aborted")?;

    let stdout = io::stdout();
    write_summary(BufWriter::new(stdout.lock()), &summary, params.summary)?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "trmaker")]
#[command(about = "Make a translation-recorder project from chapter recordings and timing files")]
struct Params {
    /// Language code for the project (lowercased in paths).
    #[arg(short = 'l', long = "language-code")]
    language_code: String,

    /// Directory containing one timing file per chapter.
    #[arg(short = 't', long = "timing-dir")]
    timing_dir: PathBuf,

    /// Directory containing one subdirectory of chapter recordings per book.
    #[arg(short = 'm', long = "audio-dir")]
    audio_dir: PathBuf,

    /// Directory to receive the project (defaults to the current directory).
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Log every skipped clip and external command.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,

    /// Added to timing-file book numbers to get audio-directory book numbers.
    #[arg(long = "book-offset", default_value_t = BookNumbering::default().offset)]
    book_offset: u32,

    /// Trim tool to run.
    #[arg(long = "ffmpeg", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Kill a single trim after this many seconds.
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Plan clips and report them without writing anything.
    #[arg(long = "dry-run", default_value_t = false)]
    dry_run: bool,

    #[arg(long = "summary", value_enum, default_value_t = OutputType::Text)]
    summary: OutputType,

    /// Log JSON lines instead of text.
    #[arg(long = "log-json", default_value_t = false)]
    log_json: bool,
}

impl Params {
    fn opts(&self) -> Result<Opts> {
        let output_dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };

        let mut opts = Opts::new(
            &self.language_code,
            &self.timing_dir,
            &self.audio_dir,
            output_dir,
        );
        opts.numbering = BookNumbering::new(self.book_offset);
        opts.dry_run = self.dry_run;
        Ok(opts)
    }
}
