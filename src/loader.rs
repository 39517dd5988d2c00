// Dataset loading and cleaning.
//
// The appointment export is a single JSON array. Individual records are
// decoded leniently (a bad record is counted and skipped, never fatal); only
// a missing file or a non-array top level is an error, and only the CLI
// entry points decide whether that is fatal.
use crate::fields::has_city_field;
use crate::types::Appointment;
use crate::util::{parse_date_safe, same_month};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, warn};

/// Seller-side cancellations carry no service and are excluded everywhere.
pub const CANCELLED_BY_SELLER: &str = "CANCELLED_BY_SELLER";

/// Counters describing what happened to the raw export during load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_records: usize,
    pub parse_errors: usize,
    pub dropped_incomplete: usize,
    pub dropped_cancelled: usize,
    pub dropped_current_month: usize,
    pub valid_records: usize,
}

/// Decode a JSON dataset string into appointments, counting undecodable
/// elements instead of failing on them.
pub fn parse_dataset(text: &str) -> Result<(Vec<Appointment>, usize)> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("dataset is not valid JSON")?;
    let items = value
        .as_array()
        .context("dataset is not a top-level JSON array")?;

    let mut appointments = Vec::with_capacity(items.len());
    let mut parse_errors = 0usize;
    for item in items {
        match serde_json::from_value::<Appointment>(item.clone()) {
            Ok(a) => appointments.push(a),
            Err(e) => {
                parse_errors += 1;
                debug!("skipping undecodable record: {e}");
            }
        }
    }
    if parse_errors > 0 {
        warn!("{parse_errors} records could not be decoded and were skipped");
    }
    Ok((appointments, parse_errors))
}

/// Read and decode a dataset file.
pub fn load_dataset_file(path: &Path) -> Result<(Vec<Appointment>, usize)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read dataset file {}", path.display()))?;
    parse_dataset(&text)
}

/// Keep only the records the aggregators should see.
///
/// A record qualifies when it carries a city field, a customer type, a
/// pickup section and a cleaning section, was not cancelled by the seller,
/// and its pickup service date is not in the current (incomplete) calendar
/// month. Records without a parseable pickup date stay in; the date-bucketed
/// views exclude them on their own.
pub fn filter_valid(
    appointments: &[Appointment],
    today: NaiveDate,
    report: &mut LoadReport,
) -> Vec<Appointment> {
    let mut valid = Vec::with_capacity(appointments.len());
    for a in appointments {
        let complete = has_city_field(a)
            && a.customer_type.is_some()
            && a.pickup.is_some()
            && a.cleaning.is_some();
        if !complete {
            report.dropped_incomplete += 1;
            continue;
        }
        if a.status.as_deref() == Some(CANCELLED_BY_SELLER) {
            report.dropped_cancelled += 1;
            continue;
        }
        let pickup_date = a
            .pickup
            .as_ref()
            .and_then(|p| parse_date_safe(p.service_date.as_deref()));
        if let Some(d) = pickup_date {
            if same_month(d, today) {
                report.dropped_current_month += 1;
                continue;
            }
        }
        valid.push(a.clone());
    }
    report.valid_records = valid.len();
    valid
}

/// Load, decode and filter a dataset file in one step, reporting counts the
/// way the console prints them.
pub fn load_and_clean(path: &Path, today: NaiveDate) -> Result<(Vec<Appointment>, LoadReport)> {
    let (appointments, parse_errors) = load_dataset_file(path)?;
    let mut report = LoadReport {
        total_records: appointments.len() + parse_errors,
        parse_errors,
        ..LoadReport::default()
    };
    let valid = filter_valid(&appointments, today, &mut report);
    Ok((valid, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn complete_record(service_date: &str) -> serde_json::Value {
        json!({
            "cityId": "LYGRRATQ7EGG2",
            "customerId": "c1",
            "customerType": "Residential",
            "pickup": {"serviceDate": service_date},
            "cleaning": {"cleaner": "Tommy Suds"}
        })
    }

    #[test]
    fn rejects_non_array_datasets() {
        assert!(parse_dataset("{\"not\": \"an array\"}").is_err());
        assert!(parse_dataset("definitely not json").is_err());
    }

    #[test]
    fn counts_undecodable_elements_without_failing() {
        let text = json!([complete_record("2023-05-01"), 42, "nope"]).to_string();
        let (apps, parse_errors) = parse_dataset(&text).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(parse_errors, 2);
    }

    #[test]
    fn filter_drops_incomplete_cancelled_and_current_month() {
        let records: Vec<Appointment> = [
            complete_record("2023-05-01"),
            // current month
            complete_record("2024-03-02"),
            // cancelled by seller
            {
                let mut r = complete_record("2023-05-01");
                r["status"] = json!(CANCELLED_BY_SELLER);
                r
            },
            // no cleaning section
            json!({
                "cityId": "LYGRRATQ7EGG2",
                "customerType": "Residential",
                "pickup": {"serviceDate": "2023-05-01"}
            }),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect();

        let mut report = LoadReport::default();
        let valid = filter_valid(&records, today(), &mut report);
        assert_eq!(valid.len(), 1);
        assert_eq!(report.dropped_current_month, 1);
        assert_eq!(report.dropped_cancelled, 1);
        assert_eq!(report.dropped_incomplete, 1);
        assert_eq!(report.valid_records, 1);
    }

    #[test]
    fn load_and_clean_reads_filters_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        let text = json!([
            complete_record("2023-05-01"),
            complete_record("2024-03-02"),
            "garbage"
        ])
        .to_string();
        std::fs::write(&path, text).unwrap();

        let (valid, report) = load_and_clean(&path, today()).unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(report.total_records, 3);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(report.dropped_current_month, 1);

        assert!(load_and_clean(&dir.path().join("missing.json"), today()).is_err());
    }

    #[test]
    fn records_without_a_pickup_date_stay_in() {
        let record = json!({
            "cityId": "LYGRRATQ7EGG2",
            "customerType": "Commercial",
            "pickup": {},
            "cleaning": {}
        });
        let records = vec![serde_json::from_value(record).unwrap()];
        let mut report = LoadReport::default();
        let valid = filter_valid(&records, today(), &mut report);
        assert_eq!(valid.len(), 1);
    }
}
