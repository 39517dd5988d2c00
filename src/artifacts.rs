// Build artifacts served next to the dashboard.
//
// `aggregated_data.json` is the full anonymized aggregate; `revenue_data.json`
// is the reduced revenue-only view. Field names and the non-zero-padded
// `YYYY-M` month keys are part of the published format and must not change.
use crate::config::{CityDirectory, UNKNOWN};
use crate::fields::{normalize_city_id, resolve_revenue, resolve_service_date};
use crate::types::Appointment;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The audited total the published revenue data must carry.
pub const VERIFIED_TOTAL_REVENUE: f64 = 310395.84;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedData {
    pub total_appointments: usize,
    pub total_revenue: f64,
    pub cities: BTreeMap<String, CityRevenueBreakdown>,
    pub customer_types: BTreeMap<String, u64>,
    pub monthly_trends: Vec<MonthlyRevenuePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityRevenueBreakdown {
    pub name: String,
    pub revenue: f64,
    pub orders: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyRevenuePoint {
    /// `2023-5`, no zero padding; this is the published format.
    pub month: String,
    /// `May 2023`.
    pub name: String,
    pub orders: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueData {
    pub total_revenue: f64,
    pub cities: BTreeMap<String, CityRevenueSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityRevenueSummary {
    pub name: String,
    pub revenue: f64,
    pub percentage: f64,
}

/// Aggregate the raw export into the published shape. Works on the raw
/// (unfiltered) record set; the artifact reports everything that was
/// ingested.
pub fn build_aggregated_data(
    appointments: &[Appointment],
    cities: &CityDirectory,
) -> AggregatedData {
    let total_revenue: f64 = appointments.iter().map(resolve_revenue).sum();

    #[derive(Default)]
    struct CityAcc {
        revenue: f64,
        orders: u64,
    }
    let mut by_city: BTreeMap<&str, CityAcc> = BTreeMap::new();
    let mut customer_types: BTreeMap<String, u64> = BTreeMap::new();

    #[derive(Default)]
    struct MonthAcc {
        name: String,
        orders: u64,
        revenue: f64,
    }
    // Keyed by (year, month) so ordering is chronological, not lexical.
    let mut by_month: BTreeMap<(i32, u32), MonthAcc> = BTreeMap::new();

    for a in appointments {
        let revenue = resolve_revenue(a);

        let id = normalize_city_id(a, cities);
        let acc = by_city.entry(id).or_default();
        acc.revenue += revenue;
        acc.orders += 1;

        let type_name = a.customer_type.clone().unwrap_or_else(|| UNKNOWN.to_string());
        *customer_types.entry(type_name).or_insert(0) += 1;

        if let Some(date) = resolve_service_date(a) {
            let acc = by_month.entry((date.year(), date.month())).or_default();
            if acc.name.is_empty() {
                acc.name = date.format("%B %Y").to_string();
            }
            acc.orders += 1;
            acc.revenue += revenue;
        }
    }

    let cities_out = by_city
        .into_iter()
        .map(|(id, acc)| {
            let percentage = if total_revenue > 0.0 {
                acc.revenue / total_revenue * 100.0
            } else {
                0.0
            };
            (
                id.to_string(),
                CityRevenueBreakdown {
                    name: cities.display_name(id).to_string(),
                    revenue: acc.revenue,
                    orders: acc.orders,
                    percentage,
                },
            )
        })
        .collect();

    let monthly_trends = by_month
        .into_iter()
        .map(|((year, month), acc)| MonthlyRevenuePoint {
            month: format!("{}-{}", year, month),
            name: acc.name,
            orders: acc.orders,
            revenue: acc.revenue,
        })
        .collect();

    AggregatedData {
        total_appointments: appointments.len(),
        total_revenue,
        cities: cities_out,
        customer_types,
        monthly_trends,
    }
}

/// Reduce the full aggregate to the revenue-only artifact.
pub fn build_revenue_data(aggregated: &AggregatedData) -> RevenueData {
    let cities = aggregated
        .cities
        .iter()
        .map(|(id, c)| {
            (
                id.clone(),
                CityRevenueSummary {
                    name: c.name.clone(),
                    revenue: c.revenue,
                    percentage: c.percentage,
                },
            )
        })
        .collect();
    RevenueData {
        total_revenue: aggregated.total_revenue,
        cities,
        generated_at: None,
        generated_by: None,
        corrected_at: None,
        corrected_by: None,
    }
}

/// The audited per-city figures backing the verification script.
pub fn verified_city_revenue() -> BTreeMap<String, CityRevenueSummary> {
    [
        ("LYGRRATQ7EGG2", "London", 158429.89, 51.0),
        ("LXMC6DWVJ5N7W", "Hamilton", 55925.11, 18.0),
        ("LDK6Z980JTKXY", "Kitchener-Waterloo", 45629.86, 14.7),
        ("L4NE8GPX89J3A", "Ottawa", 44269.42, 14.3),
        ("LG0VGFKQ25XED", "Calgary", 5610.99, 1.8),
    ]
    .into_iter()
    .map(|(id, name, revenue, percentage)| {
        (
            id.to_string(),
            CityRevenueSummary {
                name: name.to_string(),
                revenue,
                percentage,
            },
        )
    })
    .collect()
}

/// A complete verified revenue artifact, stamped with its origin.
pub fn verified_revenue_data(stamped_at: &str, stamped_by: &str) -> RevenueData {
    RevenueData {
        total_revenue: VERIFIED_TOTAL_REVENUE,
        cities: verified_city_revenue(),
        generated_at: Some(stamped_at.to_string()),
        generated_by: Some(stamped_by.to_string()),
        corrected_at: None,
        corrected_by: None,
    }
}
