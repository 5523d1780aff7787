use clap::{Parser, Subcommand};
use serde::Serialize;
use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    time::{Duration, Instant},
};
use typescore::{
    attempt::AttemptResult,
    compute_metrics,
    config::{Config, ConfigStore, FileConfigStore, OutputFormat},
    evaluate,
    replay::{replay, write_samples_csv, KeystrokeLog, ReplayReport},
    Keystrokes,
};

/// typing test scoring: wpm, raw wpm and accuracy
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Scores typing test attempts. Words only count once they and the space after them are typed correctly; raw wpm counts every keystroke."
)]
pub struct Cli {
    /// print debug logging to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    /// config file to read defaults from
    #[clap(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// score a single snapshot of an attempt
    Score {
        /// target text
        #[clap(short = 't', long)]
        text: String,

        /// everything typed so far
        #[clap(short = 'y', long, default_value = "")]
        typed: String,

        /// milliseconds since the first keystroke; omit if not started
        #[clap(short = 'e', long)]
        elapsed_ms: Option<u64>,

        /// keystrokes pressed, correct or not
        #[clap(long, default_value_t = 0)]
        total: u64,

        /// keystrokes that were correct when pressed
        #[clap(long, default_value_t = 0)]
        correct: u64,

        /// treat this as the final evaluation of the attempt
        #[clap(long)]
        ended: bool,

        /// output format
        #[clap(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// replay a recorded keystroke log
    Replay {
        /// path to a keystroke log (json)
        path: PathBuf,

        /// milliseconds between wpm samples
        #[clap(long)]
        sample_interval_ms: Option<u64>,

        /// end the attempt after this many seconds
        #[clap(short = 's', long)]
        time_limit_secs: Option<u64>,

        /// output format; csv prints the wpm samples
        #[clap(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Serialize)]
struct ScoreRow {
    wpm: f64,
    raw_wpm: f64,
    accuracy: f64,
    correct_word_chars: usize,
    correct_spaces: usize,
}

impl Cli {
    fn load_config(&self) -> Config {
        let store = match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        store.load()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load_config();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Score {
            text,
            typed,
            elapsed_ms,
            total,
            correct,
            ended,
            format,
        } => {
            let row = score(&text, &typed, elapsed_ms, Keystrokes::new(total, correct), ended);
            print_score(&row, format.unwrap_or(config.format), &mut out)?;
        }
        Command::Replay {
            path,
            sample_interval_ms,
            time_limit_secs,
            format,
        } => {
            let mut log = KeystrokeLog::from_path(&path)?;
            log.time_limit_secs = time_limit_secs
                .or(log.time_limit_secs)
                .or(config.time_limit_secs);
            let interval = sample_interval_ms.unwrap_or(config.sample_interval_ms);
            let report = replay(&log, Duration::from_millis(interval))?;
            print_replay(&report, format.unwrap_or(config.format), &mut out)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

fn score(text: &str, typed: &str, elapsed_ms: Option<u64>, keystrokes: Keystrokes, ended: bool) -> ScoreRow {
    let start = Instant::now();
    let started_at = elapsed_ms.map(|_| start);
    let now = start + Duration::from_millis(elapsed_ms.unwrap_or(0));

    let metrics = compute_metrics(started_at, now, keystrokes, typed, text, ended);
    let credit = evaluate(typed, text, ended);
    ScoreRow {
        wpm: metrics.wpm,
        raw_wpm: metrics.raw_wpm,
        accuracy: metrics.accuracy,
        correct_word_chars: credit.correct_word_chars,
        correct_spaces: credit.correct_spaces,
    }
}

fn print_score<W: Write>(row: &ScoreRow, format: OutputFormat, out: &mut W) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "wpm       {:.2}", row.wpm)?;
            writeln!(out, "raw wpm   {:.2}", row.raw_wpm)?;
            writeln!(out, "accuracy  {}%", row.accuracy)?;
            writeln!(
                out,
                "credited  {} chars, {} spaces",
                row.correct_word_chars, row.correct_spaces
            )?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, row)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.serialize(row)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn print_replay<W: Write>(report: &ReplayReport, format: OutputFormat, out: &mut W) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Text => print_result(&report.result, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_samples_csv(&report.samples, out)?,
    }
    Ok(())
}

fn print_result<W: Write>(result: &AttemptResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "wpm          {:.2}", result.wpm)?;
    writeln!(out, "raw wpm      {:.2}", result.raw_wpm)?;
    writeln!(out, "accuracy     {}%", result.accuracy)?;
    writeln!(out, "consistency  {:.2}%", result.consistency)?;
    writeln!(out, "time         {:.2}s", result.elapsed_secs)?;
    writeln!(
        out,
        "keystrokes   {} ({} correct)",
        result.total_keystrokes, result.correct_keystrokes
    )?;
    writeln!(out, "words        {}", result.word_count)
}
