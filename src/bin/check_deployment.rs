// Deployment smoke check.
//
// Fetches the deployed revenue_data.json and compares the total against the
// audited constant. Purely informational: it prints a verdict and the city
// breakdown, and always exits 0. Wiring it into CI is a separate decision.
use anyhow::{Context, Result};
use chrono::Utc;
use laundry_insights::artifacts::{RevenueData, VERIFIED_TOTAL_REVENUE};
use laundry_insights::logging;
use laundry_insights::util::format_number;
use std::time::Duration;
use tracing::error;

const DEFAULT_LIVE_URL: &str = "https://geomindai.com/1stop/dashboard/revenue_data.json";

/// Env var overriding the deployed artifact URL.
const LIVE_URL_ENV: &str = "DEPLOYED_REVENUE_URL";

fn run() -> Result<()> {
    let base = std::env::var(LIVE_URL_ENV).unwrap_or_else(|_| DEFAULT_LIVE_URL.to_string());
    // Timestamp query defeats CDN caching.
    let url = format!("{}?t={}", base, Utc::now().timestamp_millis());

    println!("Checking deployment at {}...", base);
    println!("Expected total revenue: {}", VERIFIED_TOTAL_REVENUE);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("cannot build HTTP client")?;
    let response = client.get(&url).send().context("request failed")?;
    println!("Status code: {}", response.status());

    let data: RevenueData = response
        .error_for_status()
        .context("unexpected status")?
        .json()
        .context("response is not valid revenue data")?;

    println!("Total revenue: {}", data.total_revenue);
    if data.total_revenue == VERIFIED_TOTAL_REVENUE {
        println!("SUCCESS: revenue amount is correct");
    } else {
        println!(
            "ERROR: revenue amount is wrong. Expected {}, got {}",
            VERIFIED_TOTAL_REVENUE, data.total_revenue
        );
    }

    println!("\nCity breakdown:");
    for city in data.cities.values() {
        println!(
            "- {}: ${} ({}%)",
            city.name,
            format_number(city.revenue, 2),
            format_number(city.percentage, 1)
        );
    }
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        error!("deployment check failed: {e:#}");
    }
}
