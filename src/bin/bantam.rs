//! Command driver: loads a database file (if present), executes a file of
//! statements against it line by line, then saves the (possibly newly
//! created) current database back out.
//!
//! Grounded on the source's `main()` + `CommandExecutor::executeCommandsFromFile`:
//! the driver aborts on the first *line* whose statements did not all
//! succeed — within a line, `;`-separated statements still run to
//! completion even if an earlier one in that line failed (see
//! [`bantam_db::sql::execute_line`]). The interactive password prompt and
//! console pretty-printer this source's `main()` also drives are out of
//! scope (SPEC_FULL.md §1) — this binary is invoked only after a caller has
//! already authenticated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use bantam_db::database::DatabaseManager;
use bantam_db::persistence::{self, Format};
use bantam_db::sql::execute_line;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

/// The database a loaded file's tables are installed under, and the name
/// saved back out at the end of a run — mirrors the source's hardcoded
/// `"TestDB"`.
const DEFAULT_DATABASE_NAME: &str = "TestDB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    V1,
    V2,
}

impl From<FormatArg> for Format {
    fn from(f: FormatArg) -> Format {
        match f {
            FormatArg::V1 => Format::V1,
            FormatArg::V2 => Format::V2,
        }
    }
}

/// Run a batch of statements against a persisted database.
#[derive(Debug, Parser)]
#[command(name = "bantam", version)]
struct Cli {
    /// Path to the file of `;`-separated statements to execute, one line at a time.
    commands: PathBuf,

    /// Path to the database binary file to load (if it exists) and save to.
    database: PathBuf,

    /// On-disk format to assume when reading an existing database file.
    #[arg(long, value_enum, default_value = "v2")]
    format: FormatArg,

    /// Raise the logging level from `info` to `debug`.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    bantam_db::logging::init_with_level(if cli.verbose { "debug" } else { "info" });

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut mgr = DatabaseManager::new();

    if cli.database.exists() {
        let file = File::open(&cli.database).map_err(|e| format!("opening {:?}: {e}", cli.database))?;
        let mut reader = BufReader::new(file);
        let db = persistence::load_database(&mut reader, cli.format.into())
            .map_err(|e| format!("loading {:?}: {e}", cli.database))?;
        info!(path = ?cli.database, "loaded database");
        mgr.insert(DEFAULT_DATABASE_NAME, db);
        mgr.select_database(DEFAULT_DATABASE_NAME);
    } else {
        info!(path = ?cli.database, "no existing database file, starting empty");
    }

    let file = File::open(&cli.commands).map_err(|e| format!("opening {:?}: {e}", cli.commands))?;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("reading {:?}: {e}", cli.commands))?;
        if line.trim().is_empty() {
            continue;
        }
        if !execute_line(&mut mgr, &line) {
            return Err(format!("line {} failed: {line}", line_no + 1));
        }
    }

    match mgr.current() {
        Some(db) => {
            let file =
                File::create(&cli.database).map_err(|e| format!("creating {:?}: {e}", cli.database))?;
            let mut writer = BufWriter::new(file);
            persistence::save_database(db, &mut writer)
                .map_err(|e| format!("saving {:?}: {e}", cli.database))?;
            info!(path = ?cli.database, "saved database");
        }
        None => warn!("no database selected at end of run; nothing saved"),
    }

    Ok(())
}
