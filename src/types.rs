// Record and view types.
//
// `Appointment` mirrors the wire shape of the appointment export: every
// field is optional because no two ingestion paths produced the same set of
// fields, and amounts arrive as numbers or numeric strings interchangeably.
// The view structs are what the aggregators return; the `*Row` structs at
// the bottom are their formatted table/CSV renderings.
use crate::util::{format_number, lenient_f64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::Tabled;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Appointment {
    #[serde(rename = "appointmentId")]
    pub appointment_id: Option<String>,
    #[serde(rename = "cityId")]
    pub city_id: Option<String>,
    /// Older exports used snake case for the same field.
    #[serde(rename = "city_id")]
    pub legacy_city_id: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "cityName")]
    pub city_name: Option<String>,
    #[serde(rename = "customerId")]
    pub customer_id: Option<String>,
    #[serde(rename = "customerType", alias = "customer_type")]
    pub customer_type: Option<String>,
    pub status: Option<String>,
    pub service_date: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    /// Legacy flat invoice amount; `invoice.total` superseded it but both
    /// can be populated on the same record.
    #[serde(rename = "invoiceTotal", deserialize_with = "lenient_f64")]
    pub invoice_total: Option<f64>,
    pub invoice: Option<Invoice>,
    pub pickup: Option<ServiceLeg>,
    pub delivery: Option<ServiceLeg>,
    pub dropoff: Option<ServiceLeg>,
    pub drop: Option<ServiceLeg>,
    pub cleaning: Option<Cleaning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    #[serde(deserialize_with = "lenient_f64")]
    pub total: Option<f64>,
}

/// One driver leg of an appointment (pickup, delivery, dropoff or drop).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLeg {
    #[serde(rename = "serviceDate")]
    pub service_date: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub rate: Option<f64>,
    pub driver: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
    #[serde(rename = "basePay", deserialize_with = "lenient_f64")]
    pub base_pay: Option<f64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cleaning {
    pub cleaner: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub rate: Option<f64>,
    #[serde(rename = "orderDetails")]
    pub order_details: Option<OrderDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDetails {
    #[serde(rename = "washFoldWeight", deserialize_with = "lenient_f64")]
    pub wash_fold_weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub id: String,
    pub name: String,
    pub orders: u64,
    pub revenue: f64,
    pub avg_order_value: f64,
    pub customers: u64,
    pub laundromats: u64,
    pub customer_types: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaundromatStats {
    pub id: String,
    pub name: String,
    pub orders: u64,
    pub revenue: f64,
    pub average_order_value: f64,
    pub customer_count: u64,
    pub returning_customer_count: u64,
    pub retention_rate: f64,
    pub average_turnaround_days: f64,
    pub average_order_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerTypeCount {
    pub name: String,
    pub value: u64,
}

/// One month of the orders trend. `by_city` is keyed by display name and is
/// flattened on serialization so each city becomes its own chart series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTrendPoint {
    pub month: String,
    pub name: String,
    pub total: u64,
    #[serde(flatten)]
    pub by_city: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvgOrderValuePoint {
    pub month: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetentionMetrics {
    pub total_customers: u64,
    pub returning_customers: u64,
    pub retention_rate: f64,
    pub average_orders_per_customer: f64,
    pub average_customer_lifetime: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub id: String,
    pub total_pickups: u64,
    pub total_dropoffs: u64,
    pub completed_pickups: u64,
    pub completed_dropoffs: u64,
    pub cancelled_services: u64,
    pub total_services: u64,
    pub completed_services: u64,
    pub completion_rate: f64,
    pub total_distance: f64,
    pub total_pay: f64,
    pub avg_distance_per_service: f64,
    pub avg_pay_per_distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarterStats {
    pub quarter: String,
    pub name: String,
    pub orders: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightBucket {
    pub range: String,
    pub count: u64,
}

/// A (customer, laundromat) order-count edge, ids shortened for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerFlow {
    pub source: String,
    pub target: String,
    pub value: u64,
}

/// One weekly chart point, historical or projected. Projected points are
/// always flagged so downstream consumers can't mistake them for
/// observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPoint {
    pub name: String,
    pub fullname: String,
    pub week: String,
    pub month: String,
    pub orders: u64,
    pub projected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionMetrics {
    pub total_annual_orders: u64,
    pub average_monthly_orders: u64,
    pub average_weekly_orders: u64,
    pub projected_growth_percent: f64,
    pub city_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub combined: Vec<WeeklyPoint>,
    pub weekly_historical: Vec<WeeklyPoint>,
    pub projected: Vec<WeeklyPoint>,
    pub metrics: ProjectionMetrics,
}

/// Headline numbers for the JSON summary the console writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub total_appointments: u64,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub total_customers: u64,
    pub returning_customers: u64,
    pub retention_rate: f64,
}

// ---------------------------------------------------------------------------
// Display rows (console previews and CSV exports)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityStatsRow {
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "AvgOrderValue")]
    #[tabled(rename = "AvgOrderValue")]
    pub avg_order_value: String,
    #[serde(rename = "Customers")]
    #[tabled(rename = "Customers")]
    pub customers: u64,
    #[serde(rename = "Laundromats")]
    #[tabled(rename = "Laundromats")]
    pub laundromats: u64,
}

impl From<&CityStats> for CityStatsRow {
    fn from(s: &CityStats) -> Self {
        CityStatsRow {
            city: s.name.clone(),
            orders: s.orders,
            revenue: format_number(s.revenue, 2),
            avg_order_value: format_number(s.avg_order_value, 2),
            customers: s.customers,
            laundromats: s.laundromats,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LaundromatRow {
    #[serde(rename = "Laundromat")]
    #[tabled(rename = "Laundromat")]
    pub name: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "AvgOrderValue")]
    #[tabled(rename = "AvgOrderValue")]
    pub avg_order_value: String,
    #[serde(rename = "RetentionRate")]
    #[tabled(rename = "RetentionRate")]
    pub retention_rate: String,
    #[serde(rename = "AvgTurnaroundDays")]
    #[tabled(rename = "AvgTurnaroundDays")]
    pub avg_turnaround_days: String,
    #[serde(rename = "AvgWeightKg")]
    #[tabled(rename = "AvgWeightKg")]
    pub avg_weight_kg: String,
}

impl From<&LaundromatStats> for LaundromatRow {
    fn from(s: &LaundromatStats) -> Self {
        LaundromatRow {
            name: s.name.clone(),
            orders: s.orders,
            revenue: format_number(s.revenue, 2),
            avg_order_value: format_number(s.average_order_value, 2),
            retention_rate: format_number(s.retention_rate * 100.0, 1),
            avg_turnaround_days: format_number(s.average_turnaround_days, 1),
            avg_weight_kg: format_number(s.average_order_weight, 1),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTrendRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
}

impl From<&MonthlyTrendPoint> for MonthlyTrendRow {
    fn from(p: &MonthlyTrendPoint) -> Self {
        MonthlyTrendRow {
            month: p.name.clone(),
            orders: p.total,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AvgOrderValueRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "AvgOrderValue")]
    #[tabled(rename = "AvgOrderValue")]
    pub value: String,
}

impl From<&AvgOrderValuePoint> for AvgOrderValueRow {
    fn from(p: &AvgOrderValuePoint) -> Self {
        AvgOrderValueRow {
            month: p.name.clone(),
            value: format_number(p.value, 2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DriverRow {
    #[serde(rename = "Driver")]
    #[tabled(rename = "Driver")]
    pub driver: String,
    #[serde(rename = "Pickups")]
    #[tabled(rename = "Pickups")]
    pub pickups: u64,
    #[serde(rename = "Dropoffs")]
    #[tabled(rename = "Dropoffs")]
    pub dropoffs: u64,
    #[serde(rename = "CompletionRate")]
    #[tabled(rename = "CompletionRate")]
    pub completion_rate: String,
    #[serde(rename = "TotalDistance")]
    #[tabled(rename = "TotalDistance")]
    pub total_distance: String,
    #[serde(rename = "AvgDistance")]
    #[tabled(rename = "AvgDistance")]
    pub avg_distance: String,
    #[serde(rename = "PayPerDistance")]
    #[tabled(rename = "PayPerDistance")]
    pub pay_per_distance: String,
}

impl From<&DriverStats> for DriverRow {
    fn from(s: &DriverStats) -> Self {
        DriverRow {
            driver: s.id.clone(),
            pickups: s.total_pickups,
            dropoffs: s.total_dropoffs,
            completion_rate: format_number(s.completion_rate * 100.0, 1),
            total_distance: format_number(s.total_distance, 1),
            avg_distance: format_number(s.avg_distance_per_service, 1),
            pay_per_distance: format_number(s.avg_pay_per_distance, 2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct QuarterRow {
    #[serde(rename = "Quarter")]
    #[tabled(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
}

impl From<&QuarterStats> for QuarterRow {
    fn from(s: &QuarterStats) -> Self {
        QuarterRow {
            quarter: s.name.clone(),
            orders: s.orders,
            revenue: format_number(s.revenue, 2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeightRow {
    #[serde(rename = "Range")]
    #[tabled(rename = "Range")]
    pub range: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
}

impl From<&WeightBucket> for WeightRow {
    fn from(b: &WeightBucket) -> Self {
        WeightRow {
            range: b.range.clone(),
            orders: b.count,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FlowRow {
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Laundromat")]
    #[tabled(rename = "Laundromat")]
    pub laundromat: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
}

impl From<&CustomerFlow> for FlowRow {
    fn from(f: &CustomerFlow) -> Self {
        FlowRow {
            customer: f.source.clone(),
            laundromat: f.target.clone(),
            orders: f.value,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProjectionRow {
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "Projected")]
    #[tabled(rename = "Projected")]
    pub projected: bool,
}

impl From<&WeeklyPoint> for ProjectionRow {
    fn from(p: &WeeklyPoint) -> Self {
        ProjectionRow {
            week: p.fullname.clone(),
            orders: p.orders,
            projected: p.projected,
        }
    }
}
