// Batch uploader.
//
// Pushes the appointment export into the remote appointments table in
// batches of 100 with a one-second pause between batches to stay under the
// backend's rate limits. A failed batch is logged and the run continues.
use anyhow::{Context, Result};
use laundry_insights::{fetch, loader, logging};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

const BATCH_SIZE: usize = 100;
const BATCH_DELAY: Duration = Duration::from_secs(1);

fn run() -> Result<()> {
    let base_url = std::env::var("SUPABASE_URL").context("SUPABASE_URL is not set")?;
    let api_key = std::env::var("SUPABASE_KEY").context("SUPABASE_KEY is not set")?;
    let source =
        std::env::var(fetch::FILE_ENV).unwrap_or_else(|_| fetch::DEFAULT_FILE.to_string());

    let (appointments, _) = loader::load_dataset_file(Path::new(&source))?;
    info!(
        "Starting to upload {} appointments in batches of {}",
        appointments.len(),
        BATCH_SIZE
    );

    let endpoint = format!("{}/rest/v1/appointments", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("cannot build HTTP client")?;

    let total_batches = appointments.len().div_ceil(BATCH_SIZE);
    for (i, batch) in appointments.chunks(BATCH_SIZE).enumerate() {
        info!(
            "Uploading batch {}/{} ({} records)",
            i + 1,
            total_batches,
            batch.len()
        );
        let result = client
            .post(&endpoint)
            .header("apikey", &api_key)
            .bearer_auth(&api_key)
            .header("Prefer", "return=minimal")
            .json(batch)
            .send()
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => info!("Batch {} uploaded", i + 1),
            Err(e) => error!("Error uploading batch {}: {e}", i + 1),
        }
        if i + 1 < total_batches {
            std::thread::sleep(BATCH_DELAY);
        }
    }

    info!("Upload completed");
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        error!("upload failed: {e:#}");
        std::process::exit(1);
    }
}
