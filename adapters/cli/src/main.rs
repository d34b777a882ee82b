#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Geo Merge session in the terminal.

mod ascii;
mod session;

use std::{
    fs,
    io::{self, BufReader, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use geo_merge_core::GameConfig;
use geo_merge_world::{query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{ascii::TerminalBackend, session::Session};

#[derive(Parser, Debug)]
#[command(
    name = "geo-merge",
    version,
    about = "Collect and merge power-of-two tokens scattered over a map grid"
)]
struct Cli {
    /// TOML file overriding the default game configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Read session commands from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,
    /// Cells drawn north and south of the player by `map`
    #[arg(long, value_name = "CELLS", default_value_t = 3)]
    map_rows: u16,
    /// Cells drawn east and west of the player by `map`
    #[arg(long, value_name = "CELLS", default_value_t = 5)]
    map_columns: u16,
    /// Log world activity at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Geo Merge command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    let world = World::new(config).context("invalid game configuration")?;
    info!(
        position = ?query::player_position(&world),
        cells = query::cell_view(&world).len(),
        "session started"
    );

    let backend = TerminalBackend::new(io::stdout(), cli.map_rows, cli.map_columns);
    let mut session = Session::new(world, backend);
    let mut out = io::stdout();

    match &cli.script {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            session.run(BufReader::new(file), &mut out, false)
        }
        None => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            session.run(stdin.lock(), &mut out, prompt)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse_config(contents: &str) -> Result<GameConfig> {
    let config: GameConfig =
        toml::from_str(contents).context("failed to parse game config toml contents")?;
    config.validate()?;
    Ok(config)
}
