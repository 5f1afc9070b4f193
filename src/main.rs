//! Loyalty Ledger CLI
//!
//! Replays a CSV file of invoke/query requests against the ledger and prints
//! one result line per request.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv [state.json] > results.csv
//! ```
//!
//! When a state file is given, the store is loaded from it before the batch
//! (a missing file starts empty) and written back afterwards.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `LOYALTY_DEFAULT_PERCENTAGE`, `LOYALTY_DEFAULT_PRICE`: creation defaults
//! - `LOYALTY_ID_POLICY`: `strict` or `legacy` identifier validation
//! - `LOYALTY_ACCESS_POLICY`: `role-gated` or `open`

use loyalty_ledger::{BatchRunner, Config, Dispatcher, LoyaltyError, MemoryStore, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LoyaltyError::MissingArgument);
    }

    let config = Config::from_env()?;
    let state_path = args.get(2).map(PathBuf::from);
    let store = match &state_path {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    };

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut runner = BatchRunner::new(Dispatcher::new(store, config));
    runner.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    runner.write_output(handle)?;

    if let Some(path) = state_path {
        runner.into_dispatcher().into_store().save(&path)?;
    }

    Ok(())
}
