use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use colsys::compressor::options::{CompressorOptions, Mode};
use colsys::compressor::{Compressor, Solved};
use colsys::dot_writer::draw_grammar;
use colsys::grammar::text_format;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    None,
}

impl LogLevel {
    fn to_trace(&self) -> Option<tracing::Level> {
        Some(match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::None => return None,
        })
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Text to compress, given inline.
    #[arg(short, long, value_name = "TEXT", conflicts_with = "file")]
    text: Option<String>,

    /// Path to a file whose bytes are compressed.
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Rule system the grammar may use.
    #[arg(short, long, value_enum, default_value_t = Mode::Collage)]
    mode: Mode,

    /// Solve in all three rule systems and report each minimum size.
    #[arg(short, long)]
    compare: bool,

    /// Wall-clock budget for solving, in seconds. The best grammar found
    /// within the budget is kept.
    #[arg(long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,

    /// Where to store the DOT graph of the derivation tree.
    #[arg(short, long, value_name = "FILE.dot")]
    dot_path: Option<String>,

    /// Where to store the grammar in its text format.
    #[arg(short, long, value_name = "FILE.grammar")]
    grammar_path: Option<String>,

    /// Print timing and size statistics.
    #[arg(short, long)]
    print_statistics: bool,

    /// Verbosity level. See `tracing::Level` for more information.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    verbosity: LogLevel,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    if let Some(level) = args.verbosity.to_trace() {
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    let text: Vec<u8> = match (&args.text, &args.file) {
        (Some(text), None) => text.clone().into_bytes(),
        (None, Some(path)) => {
            std::fs::read(path).with_context(|| format!("could not read {path}"))?
        }
        _ => bail!("exactly one of --text and --file must be given"),
    };

    let timeout = args.timeout_secs.map(Duration::from_secs);

    if args.compare {
        for mode in [Mode::Slp, Mode::Rlslp, Mode::Collage] {
            let solved = solve(&text, mode, timeout)?;
            println!(
                "{mode}: {} rules ({} phrases, {} cuts)",
                solved.report.rule_count(),
                solved.report.phrase_count,
                solved.report.truncation_count,
            );
        }
        return Ok(());
    }

    let solved = solve(&text, args.mode, timeout)?;
    println!(
        "{} rules ({} phrases, {} cuts)",
        solved.report.rule_count(),
        solved.report.phrase_count,
        solved.report.truncation_count,
    );

    if args.print_statistics {
        println!("{}", solved.report.to_table());
    }

    write_to_file(args.dot_path.as_deref(), |writer| {
        draw_grammar(&solved.grammar).write(writer)
    })
    .map_err(anyhow::Error::msg)
    .context("could not write the DOT graph")?;

    write_to_file(args.grammar_path.as_deref(), |writer| {
        writer
            .write_all(text_format::serialize(&solved.grammar).as_bytes())
            .map_err(|err| err.to_string())
    })
    .map_err(anyhow::Error::msg)
    .context("could not write the grammar")?;

    Ok(())
}

fn solve(text: &[u8], mode: Mode, timeout: Option<Duration>) -> anyhow::Result<Solved> {
    let options = CompressorOptions::builder()
        .mode(mode)
        .maybe_timeout(timeout)
        .build();
    Compressor::new(options)
        .solve(text)
        .with_context(|| format!("solving in {mode} mode failed"))
}

fn write_to_file(
    path: Option<&str>,
    writer: impl Fn(&mut dyn std::io::Write) -> Result<(), String>,
) -> Result<(), String> {
    if let Some(path) = path {
        let f = File::create(path).map_err(|err| err.to_string())?;
        let mut b = BufWriter::new(f);
        writer(&mut b as &mut dyn std::io::Write)?;
    };

    Ok(())
}
