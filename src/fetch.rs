// Dataset acquisition.
//
// Preference order: configured backend, local export file, synthetic sample
// data. The last step never fails, so the console always has something to
// render, a deliberate availability-over-correctness choice for a reporting
// tool.
use crate::config::CityDirectory;
use crate::loader;
use crate::sample;
use crate::types::Appointment;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Env var naming the backend endpoint that serves the appointment array.
pub const API_URL_ENV: &str = "APPOINTMENTS_API_URL";

/// Env var overriding the local export path.
pub const FILE_ENV: &str = "APPOINTMENTS_FILE";

/// Default local export path.
pub const DEFAULT_FILE: &str = "appointments.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the records actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOrigin {
    Backend,
    LocalFile,
    Sample,
}

impl std::fmt::Display for DatasetOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetOrigin::Backend => write!(f, "backend"),
            DatasetOrigin::LocalFile => write!(f, "local file"),
            DatasetOrigin::Sample => write!(f, "sample data"),
        }
    }
}

/// Fetch the appointment array from the backend.
pub fn fetch_remote(url: &str) -> Result<Vec<Appointment>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("cannot build HTTP client")?;
    let text = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("GET {} failed", url))?
        .text()
        .context("cannot read response body")?;
    let (appointments, _) = loader::parse_dataset(&text)?;
    Ok(appointments)
}

/// Load the dataset from the first source that works.
///
/// Failures along the way are logged and swallowed; the returned origin says
/// which source won.
pub fn load_dataset(
    cities: &CityDirectory,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> (Vec<Appointment>, DatasetOrigin) {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        match fetch_remote(&url) {
            Ok(appointments) => {
                info!("loaded {} records from {}", appointments.len(), url);
                return (appointments, DatasetOrigin::Backend);
            }
            Err(e) => warn!("backend fetch failed, falling back to file: {e:#}"),
        }
    }

    let path = std::env::var(FILE_ENV).unwrap_or_else(|_| DEFAULT_FILE.to_string());
    match loader::load_dataset_file(Path::new(&path)) {
        Ok((appointments, _)) => {
            info!("loaded {} records from {}", appointments.len(), path);
            (appointments, DatasetOrigin::LocalFile)
        }
        Err(e) => {
            warn!("cannot load {path}, using sample data: {e:#}");
            let appointments = sample::sample_appointments(sample::SAMPLE_SIZE, cities, today, rng);
            (appointments, DatasetOrigin::Sample)
        }
    }
}
