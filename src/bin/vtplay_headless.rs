//! vtplay headless runner
//!
//! Replays a ttyrec recording (or a raw byte capture) through the emulator
//! at the configured tick rate without sleeping, then prints the final
//! screen.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use vtplay::config::Config;
use vtplay::core::{DirtySpans, Scrollback};
use vtplay::replay::Replay;
use vtplay::ttyrec::{self, Record};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

struct Options {
    input: Option<String>,
    raw: bool,
    format: OutputFormat,
    frames: bool,
    scrollback: bool,
    cols: Option<usize>,
    rows: Option<usize>,
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        input: None,
        raw: false,
        format: OutputFormat::Text,
        frames: false,
        scrollback: false,
        cols: None,
        rows: None,
        config: None,
        help: false,
    };

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| format!("{arg} needs a value"))
        };
        match arg {
            "-c" | "--cols" => {
                let v = value()?;
                opts.cols = Some(v.parse().map_err(|_| format!("bad column count '{v}'"))?);
            }
            "-r" | "--rows" => {
                let v = value()?;
                opts.rows = Some(v.parse().map_err(|_| format!("bad row count '{v}'"))?);
            }
            "--config" => opts.config = Some(PathBuf::from(value()?)),
            "--raw" => opts.raw = true,
            "-j" | "--json" => opts.format = OutputFormat::Json,
            "--frames" => opts.frames = true,
            "--scrollback" => opts.scrollback = true,
            "-h" | "--help" => opts.help = true,
            _ if opts.input.is_none() && (arg == "-" || !arg.starts_with('-')) => {
                opts.input = Some(arg.to_string());
            }
            _ => return Err(format!("unexpected argument '{arg}'")),
        }
        i += 1;
    }
    Ok(opts)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if opts.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(opts: &Options) -> Result<Config, String> {
    let mut config = match &opts.config {
        Some(path) => Config::load(path).map_err(|e| format!("config '{}': {e}", path.display()))?,
        None => Config::load_or_default(),
    };
    if let Some(cols) = opts.cols {
        config.terminal.columns = cols;
    }
    if let Some(rows) = opts.rows {
        config.terminal.rows = rows;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn load_records(opts: &Options) -> Result<Vec<Record>, String> {
    let bytes = match opts.input.as_deref() {
        None => return Err("no input file given".to_string()),
        Some("-") => {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .map_err(|e| format!("reading stdin: {e}"))?;
            data
        }
        Some(path) => std::fs::read(path).map_err(|e| format!("reading '{path}': {e}"))?,
    };
    if opts.raw {
        return Ok(vec![Record::new(Duration::ZERO, bytes)]);
    }
    ttyrec::parse(&bytes).map_err(|e| e.to_string())
}

fn run(opts: &Options) -> Result<(), String> {
    let config = load_config(opts)?;
    let records = load_records(opts)?;

    let (cols, rows) = (config.terminal.columns, config.terminal.rows);
    let observer = (
        DirtySpans::new(cols, rows),
        Scrollback::new(config.terminal.scrollback_lines),
    );
    let mut replay = Replay::from_config(&config, records, observer);
    let tick = Duration::from_secs(1) / config.replay.tick_rate;

    let mut frame = 0usize;
    while !replay.is_finished() {
        replay.tick(tick).map_err(|e| e.to_string())?;
        frame += 1;
        let spans = replay.player_mut().emulator_mut().observer_mut().0.take();
        if opts.frames && !spans.is_empty() {
            let rows: Vec<String> = spans
                .iter()
                .map(|s| format!("{}[{}..={}]", s.row, s.min, s.max))
                .collect();
            println!("frame {frame}: {}", rows.join(" "));
        }
    }

    let emulator = replay.emulator();
    if opts.scrollback {
        print!("{}", emulator.observer().1.to_text());
        println!("--- scrollback end ---");
    }

    match opts.format {
        OutputFormat::Text => {
            let cursor = emulator.cursor();
            println!("Screen ({cols}x{rows}), cursor ({}, {}):", cursor.x, cursor.y);
            println!("---");
            println!("{}", emulator.screen_text());
            println!("---");
        }
        OutputFormat::Json => {
            let json = emulator.freeze().to_json().map_err(|e| e.to_string())?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_help() {
    println!("vtplay headless replay runner");
    println!();
    println!("Usage: vtplay-headless [OPTIONS] <FILE>");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>      Terminal width (default from config: 80)");
    println!("  -r, --rows <N>      Terminal height (default from config: 24)");
    println!("      --config <FILE> Read configuration from FILE");
    println!("      --raw           Treat input as raw terminal output, not ttyrec");
    println!("  -j, --json          Print the final snapshot as JSON");
    println!("      --frames        Print the rows repainted after each tick");
    println!("      --scrollback    Print lines that scrolled off the top");
    println!("  -h, --help          Show this help message");
    println!();
    println!("Use '-' as FILE to read from stdin.");
    println!();
    println!("Examples:");
    println!("  vtplay-headless session.ttyrec");
    println!("  printf 'Hello\\x1b[31mWorld' | vtplay-headless --raw -");
    println!("  vtplay-headless --json -c 132 -r 43 session.ttyrec > snapshot.json");
}
