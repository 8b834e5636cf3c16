use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::collections::HashSet;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use jsonhand::config::Config;
use jsonhand::file::loader::{load_file, load_from_stdin};
use jsonhand::jsonpath::{find, normalize, Match, ResultMode};

/// jsonhand - query JSON and YAML documents with JSONPath expressions
#[derive(Parser)]
#[command(name = "jsonhand")]
#[command(version)]
#[command(about = "Query JSON and YAML documents with JSONPath expressions", long_about = None)]
struct Cli {
    /// Path expression, e.g. '$.data[?(@.year == 2018)].months[*].url'
    expression: String,

    /// Document to query (omit to read from stdin)
    file: Option<String>,

    /// Report matches as values, index paths or bracket paths
    #[arg(short, long, value_enum)]
    mode: Option<ResultMode>,

    /// Never evaluate [(expr)] and [?(expr)] selectors
    #[arg(long)]
    no_eval: bool,

    /// Log each trace step (repeat for per-child detail)
    #[arg(short, long, action = ArgAction::Count)]
    debug: u8,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Drop repeated matches, keeping the first
    #[arg(long)]
    unique: bool,

    /// Print the normalized token string and exit
    #[arg(long)]
    normalize: bool,
}

/// Installs a stderr subscriber. `RUST_LOG` wins over the `-d` level.
fn init_logging(debug: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match debug {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Removes repeated matches, keeping first occurrences in order.
fn dedupe(matches: Vec<Match<'_>>) -> Result<Vec<Match<'_>>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(matches.len());
    for found in matches {
        let key = serde_json::to_string(&found).context("Failed to serialize match")?;
        if seen.insert(key) {
            unique.push(found);
        }
    }
    Ok(unique)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    config.allow_eval &= !cli.no_eval;
    config.debug = config.debug.max(cli.debug);
    config.pretty &= !cli.compact;
    config.unique |= cli.unique;

    init_logging(config.debug);

    if cli.normalize {
        println!("{}", normalize(&cli.expression));
        return Ok(ExitCode::SUCCESS);
    }

    let tree = if let Some(file_path) = &cli.file {
        load_file(file_path)?
    } else if !io::stdin().is_terminal() {
        load_from_stdin()?
    } else {
        bail!("No input: pass a FILE or pipe a document on stdin");
    };

    let Some(mut matches) = find(&tree, &cli.expression, &config.find_options()) else {
        println!("false");
        return Ok(ExitCode::FAILURE);
    };
    tracing::debug!(count = matches.len(), "query matched");

    if config.unique {
        matches = dedupe(matches)?;
    }

    let output = if config.pretty {
        serde_json::to_string_pretty(&matches)
    } else {
        serde_json::to_string(&matches)
    }
    .context("Failed to serialize matches")?;
    println!("{}", output);

    Ok(ExitCode::SUCCESS)
}
