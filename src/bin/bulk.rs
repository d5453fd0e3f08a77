use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use dass_score::config::AppConfig;
use dass_score::store::{save_with_retry, FileStore, RetryPolicy};
use dass_score::{read_bulk, telemetry, Error, Graded};
use tracing::{info, warn};

/// Score a CSV of DASS-42 answer rows.
#[derive(Parser)]
struct Args {
    /// CSV file: id column followed by 42 answers
    path: PathBuf,
    /// Store complete rows as results, using the id column as user id
    #[arg(long)]
    import: bool,
    /// Result store directory (defaults to DASS_STORE_DIR)
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut store = match args.import {
        true => Some(FileStore::open(
            args.store.as_ref().unwrap_or(&config.store.dir),
        )?),
        false => None,
    };
    let policy = RetryPolicy::from(&config.store);

    let reader = BufReader::new(File::open(&args.path)?);
    let (mut scored, mut imported, mut rejected) = (0usize, 0usize, 0usize);
    for (line, row) in read_bulk(reader).enumerate() {
        let (id, responses) = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = line + 1, error = %e, "skipping unreadable row");
                rejected += 1;
                continue;
            }
        };
        let scores = responses.scores()?;
        let levels = scores.levels();
        scored += 1;
        println!(
            "id = {}, scores = {:?}, levels = ({}, {}, {}), answered = {}/42",
            id,
            scores.scores(),
            levels.depression,
            levels.anxiety,
            levels.stress,
            responses.answered()
        );

        if let Some(store) = store.as_mut() {
            match responses.submit(id.as_str(), Utc::now()) {
                Ok(result) => match save_with_retry(store, &result, policy) {
                    Ok(()) => imported += 1,
                    Err(e) => warn!(id = %id, error = %e, "failed to import result"),
                },
                Err(e) => warn!(id = %id, error = %e, "not importing incomplete row"),
            }
        }
    }
    info!(scored, imported, rejected, "bulk scoring finished");
    Ok(())
}
