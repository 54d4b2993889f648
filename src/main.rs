mod report;

use anyhow::{Context, Result, bail};
use clap::Parser;
use hypertape::{Definition, Options, SavedRun, Session};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HYPERTAPE_LOG";

/// Breadth-first run search for multi-tape automata.
///
/// Exit codes: 0 accepted, 1 rejected or undecided, 2 invalid input.
#[derive(Parser)]
#[command(name = "hypertape", version)]
#[command(about = "Breadth-first run search for multi-tape automata", long_about = None)]
struct Cli {
    /// Automaton definition (text format, or JSON when the file ends in .json)
    #[arg(required_unless_present = "load")]
    definition: Option<PathBuf>,

    /// One word per tape; replaces any `words:` line in the definition
    words: Vec<String>,

    /// Print the run as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Write the run to this file
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Resume a run written by --save
    #[arg(long, value_name = "PATH", conflicts_with_all = ["definition", "words"])]
    load: Option<PathBuf>,

    /// Give up after this many configurations and report the run as undecided
    #[arg(long, value_name = "N")]
    max_expansions: Option<usize>,

    /// Force ANSI color output
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable ANSI color output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = if cli.no_color {
        false
    } else {
        cli.color || io::stdout().is_terminal()
    };
    init_tracing(color);

    match execute(&cli, color) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(color: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(color && io::stderr().is_terminal())
        .without_time()
        .compact()
        .init();
}

/// Run the search (or restore a saved one) and report. Returns whether the
/// run is accepted.
fn execute(cli: &Cli, color: bool) -> Result<bool> {
    let options = Options { max_expansions: cli.max_expansions, collect_layers: true };

    let (source, session) = match (&cli.load, &cli.definition) {
        (Some(path), _) => (path.display().to_string(), load(path, options)?),
        (None, Some(path)) => (path.display().to_string(), search(path, &cli.words, options)?),
        (None, None) => bail!("either a definition or --load is required"),
    };

    if let Some(path) = &cli.save {
        let saved = SavedRun::from_session(&session, &source);
        std::fs::write(path, saved.to_json()?).with_context(|| format!("writing {}", path.display()))?;
    }

    if cli.json {
        println!("{}", SavedRun::from_session(&session, &source).to_json()?);
    } else {
        report::print_run(&source, &session, color);
    }
    Ok(session.is_accepted())
}

fn search(path: &Path, words: &[String], options: Options) -> Result<Session> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let (definition, file_words) = if path.extension().is_some_and(|ext| ext == "json") {
        let definition: Definition =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        (definition, Vec::new())
    } else {
        let parsed = Definition::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
        (parsed.definition, parsed.words)
    };
    let words = if words.is_empty() { file_words } else { words.to_vec() };

    let mut session = Session::new(definition, &words, options)?;
    session.start()?;
    Ok(session)
}

fn load(path: &Path, options: Options) -> Result<Session> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut session = SavedRun::from_json(&json)?.into_session(options)?;
    if session.history().is_empty() {
        session.start()?;
    }
    Ok(session)
}
