// Data preparation script.
//
// Reads the appointment export and writes the two public artifacts:
// aggregated_data.json (full aggregate) and revenue_data.json (reduced).
// A missing or unparseable source file is fatal; a build must not ship
// artifacts derived from nothing.
use anyhow::Result;
use laundry_insights::artifacts::{build_aggregated_data, build_revenue_data};
use laundry_insights::config::CityDirectory;
use laundry_insights::util::format_int;
use laundry_insights::{fetch, loader, logging, output};
use std::path::Path;
use tracing::{error, info};

const AGGREGATED_FILE: &str = "public/aggregated_data.json";
const REVENUE_FILE: &str = "public/revenue_data.json";

fn run() -> Result<()> {
    let source =
        std::env::var(fetch::FILE_ENV).unwrap_or_else(|_| fetch::DEFAULT_FILE.to_string());
    info!("Starting data preparation from {}", source);

    let (appointments, parse_errors) = loader::load_dataset_file(Path::new(&source))?;
    info!(
        "Loaded {} appointments ({} undecodable records skipped)",
        format_int(appointments.len() as u64),
        format_int(parse_errors as u64)
    );

    let cities = CityDirectory::builtin();
    let aggregated = build_aggregated_data(&appointments, &cities);
    let revenue = build_revenue_data(&aggregated);

    output::write_json(Path::new(AGGREGATED_FILE), &aggregated)?;
    info!("Aggregated data written to {}", AGGREGATED_FILE);

    output::write_json(Path::new(REVENUE_FILE), &revenue)?;
    info!("Revenue data written to {}", REVENUE_FILE);

    info!("Data preparation complete");
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        error!("data preparation failed: {e:#}");
        std::process::exit(1);
    }
}
