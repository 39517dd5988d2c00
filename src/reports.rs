// Aggregate views over the cleaned appointment set.
//
// Every function here is a pure reduction: group by a key, accumulate,
// derive averages and rates, sort. Nothing throws and nothing is cached;
// callers recompute from the current filtered input whenever it changes.
// Missing nested fields degrade to zero/skip per record.
use crate::config::{CityDirectory, UNKNOWN};
use crate::fields::{normalize_city_id, resolve_revenue, resolve_service_date};
use crate::types::{
    Appointment, AvgOrderValuePoint, CityStats, CustomerFlow, CustomerTypeCount, DriverStats,
    InsightSummary, LaundromatStats, MonthlyTrendPoint, QuarterStats, RetentionMetrics,
    WeightBucket,
};
use crate::util::{average, month_key, month_label, months_back, parse_date_safe, round2, same_month};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Completed driver legs carry this status.
pub const COMPLETED: &str = "COMPLETED";

/// Display defaults for the laundromat table: at least this many orders...
pub const LAUNDROMAT_MIN_ORDERS: u64 = 5;
/// ...and at most this many rows.
pub const LAUNDROMAT_LIMIT: usize = 3;

/// Default trailing window for the monthly trend views.
pub const DEFAULT_TREND_MONTHS: u32 = 12;

/// Flows shown in the customer/laundromat breakdown.
pub const FLOW_LIMIT: usize = 20;

/// Per-city order/revenue/customer statistics.
///
/// Every directory city is present in the result even with zero activity, in
/// directory order. Records whose city cannot be resolved are attributed to
/// the directory's default city.
pub fn city_statistics(appointments: &[Appointment], cities: &CityDirectory) -> Vec<CityStats> {
    #[derive(Default)]
    struct Acc {
        orders: u64,
        revenue: f64,
        customers: HashSet<String>,
        laundromats: HashSet<String>,
        types: BTreeMap<String, u64>,
    }

    let mut map: HashMap<&str, Acc> = cities
        .cities
        .iter()
        .map(|c| (c.id.as_str(), Acc::default()))
        .collect();

    for a in appointments {
        let id = normalize_city_id(a, cities);
        let Some(acc) = map.get_mut(id) else { continue };
        acc.orders += 1;
        acc.revenue += resolve_revenue(a);
        if let Some(customer) = &a.customer_id {
            acc.customers.insert(customer.clone());
        }
        if let Some(cleaner) = a.cleaning.as_ref().and_then(|c| c.cleaner.clone()) {
            acc.laundromats.insert(cleaner);
        }
        let type_name = a.customer_type.clone().unwrap_or_else(|| UNKNOWN.to_string());
        *acc.types.entry(type_name).or_insert(0) += 1;
    }

    cities
        .cities
        .iter()
        .map(|c| {
            let acc = map.remove(c.id.as_str()).unwrap_or_default();
            let avg = if acc.orders > 0 {
                acc.revenue / acc.orders as f64
            } else {
                0.0
            };
            CityStats {
                id: c.id.clone(),
                name: c.name.clone(),
                orders: acc.orders,
                revenue: acc.revenue,
                avg_order_value: avg,
                customers: acc.customers.len() as u64,
                laundromats: acc.laundromats.len() as u64,
                customer_types: acc.types,
            }
        })
        .collect()
}

/// Per-laundromat statistics for every laundromat seen in the data, sorted
/// by order count descending. Use [`top_laundromats`] for the display cut.
///
/// The returning-customer flag is last-writer-wins per customer: a customer
/// counts as returning for a laundromat only when their previous order went
/// through the same one, so customers alternating between laundromats are
/// undercounted. Known approximation, kept as-is; the full pair counts live
/// in [`customer_laundromat_flow`].
pub fn laundromat_statistics(appointments: &[Appointment]) -> Vec<LaundromatStats> {
    #[derive(Default)]
    struct Acc {
        orders: u64,
        revenue: f64,
        customers: HashSet<String>,
        returning: HashSet<String>,
        turnarounds: Vec<f64>,
        weights: Vec<f64>,
    }

    let mut map: HashMap<String, Acc> = HashMap::new();
    let mut last_laundromat: HashMap<String, String> = HashMap::new();

    for a in appointments {
        let (Some(customer), Some(cleaning)) = (&a.customer_id, &a.cleaning) else {
            continue;
        };
        let Some(cleaner) = &cleaning.cleaner else { continue };

        let acc = map.entry(cleaner.clone()).or_default();
        acc.orders += 1;
        acc.revenue += resolve_revenue(a);
        acc.customers.insert(customer.clone());

        if last_laundromat.get(customer) == Some(cleaner) {
            acc.returning.insert(customer.clone());
        } else {
            last_laundromat.insert(customer.clone(), cleaner.clone());
        }

        let pickup = a
            .pickup
            .as_ref()
            .and_then(|p| parse_date_safe(p.service_date.as_deref()));
        let dropped = a
            .drop
            .as_ref()
            .and_then(|d| parse_date_safe(d.service_date.as_deref()));
        if let (Some(p), Some(d)) = (pickup, dropped) {
            if d > p {
                acc.turnarounds.push((d - p).num_days() as f64);
            }
        }

        if let Some(weight) = cleaning.order_details.as_ref().and_then(|o| o.wash_fold_weight) {
            acc.weights.push(weight);
        }
    }

    let mut stats: Vec<LaundromatStats> = map
        .into_iter()
        .map(|(id, acc)| {
            let customer_count = acc.customers.len() as u64;
            let returning_count = acc.returning.len() as u64;
            LaundromatStats {
                name: id.clone(),
                id,
                orders: acc.orders,
                average_order_value: if acc.orders > 0 {
                    acc.revenue / acc.orders as f64
                } else {
                    0.0
                },
                revenue: acc.revenue,
                customer_count,
                returning_customer_count: returning_count,
                retention_rate: if customer_count > 0 {
                    returning_count as f64 / customer_count as f64
                } else {
                    0.0
                },
                average_turnaround_days: average(&acc.turnarounds),
                average_order_weight: average(&acc.weights),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.orders.cmp(&a.orders).then_with(|| a.id.cmp(&b.id)));
    stats
}

/// The display selection over [`laundromat_statistics`]: only laundromats
/// with meaningful volume, truncated to keep the table small.
pub fn top_laundromats(
    stats: &[LaundromatStats],
    min_orders: u64,
    limit: usize,
) -> Vec<LaundromatStats> {
    stats
        .iter()
        .filter(|s| s.orders >= min_orders)
        .take(limit)
        .cloned()
        .collect()
}

/// Histogram of customer types, with an explicit bucket for records that
/// carry none.
pub fn customer_type_distribution(appointments: &[Appointment]) -> Vec<CustomerTypeCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for a in appointments {
        let name = a.customer_type.clone().unwrap_or_else(|| UNKNOWN.to_string());
        *counts.entry(name).or_insert(0) += 1;
    }
    let mut out: Vec<CustomerTypeCount> = counts
        .into_iter()
        .map(|(name, value)| CustomerTypeCount { name, value })
        .collect();
    out.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Orders per month for the trailing `months_to_show` months, split by city
/// display name for multi-series charting.
///
/// The current calendar month is always excluded: it is incomplete and
/// reads as a cliff on every chart.
pub fn monthly_orders_trend(
    appointments: &[Appointment],
    cities: &CityDirectory,
    today: NaiveDate,
    months_to_show: u32,
) -> Vec<MonthlyTrendPoint> {
    let mut buckets: BTreeMap<String, MonthlyTrendPoint> = BTreeMap::new();
    for i in 0..months_to_show {
        let Some(month) = months_back(today, i) else { continue };
        if same_month(month, today) {
            continue;
        }
        let by_city: BTreeMap<String, u64> =
            cities.cities.iter().map(|c| (c.name.clone(), 0)).collect();
        buckets.insert(
            month_key(month),
            MonthlyTrendPoint {
                month: month_key(month),
                name: month_label(month),
                total: 0,
                by_city,
            },
        );
    }

    for a in appointments {
        let Some(date) = resolve_service_date(a) else { continue };
        if same_month(date, today) {
            continue;
        }
        let Some(bucket) = buckets.get_mut(&month_key(date)) else { continue };
        bucket.total += 1;
        let city_name = cities.display_name(normalize_city_id(a, cities));
        if let Some(count) = bucket.by_city.get_mut(city_name) {
            *count += 1;
        }
    }

    buckets.into_values().collect()
}

/// Average order value per month over the same trailing window.
///
/// Only appointments with a positive resolved revenue enter the average, so
/// unbilled records don't drag the figure to zero.
pub fn avg_order_value_trend(
    appointments: &[Appointment],
    today: NaiveDate,
    months_to_show: u32,
) -> Vec<AvgOrderValuePoint> {
    #[derive(Default)]
    struct Acc {
        name: String,
        order_count: u64,
        total_revenue: f64,
    }

    let mut buckets: BTreeMap<String, Acc> = BTreeMap::new();
    for i in 0..months_to_show {
        let Some(month) = months_back(today, i) else { continue };
        if same_month(month, today) {
            continue;
        }
        buckets.insert(
            month_key(month),
            Acc {
                name: month_label(month),
                ..Acc::default()
            },
        );
    }

    for a in appointments {
        let Some(date) = resolve_service_date(a) else { continue };
        if same_month(date, today) {
            continue;
        }
        let Some(acc) = buckets.get_mut(&month_key(date)) else { continue };
        let revenue = resolve_revenue(a);
        if revenue > 0.0 {
            acc.order_count += 1;
            acc.total_revenue += revenue;
        }
    }

    buckets
        .into_iter()
        .map(|(month, acc)| AvgOrderValuePoint {
            month,
            name: acc.name,
            value: if acc.order_count > 0 {
                round2(acc.total_revenue / acc.order_count as f64)
            } else {
                0.0
            },
        })
        .collect()
}

/// Customer retention across the whole dataset.
///
/// "Returning" means at least two orders ever, not a time-windowed return.
/// Lifetime is the span between a returning customer's first and last order,
/// averaged over returning customers with a positive span.
pub fn customer_retention_metrics(appointments: &[Appointment]) -> RetentionMetrics {
    struct Acc {
        orders: u64,
        first: NaiveDate,
        last: NaiveDate,
    }

    let mut per_customer: HashMap<String, Acc> = HashMap::new();
    for a in appointments {
        let Some(customer) = &a.customer_id else { continue };
        let Some(date) = resolve_service_date(a) else { continue };
        per_customer
            .entry(customer.clone())
            .and_modify(|acc| {
                acc.orders += 1;
                acc.first = acc.first.min(date);
                acc.last = acc.last.max(date);
            })
            .or_insert(Acc {
                orders: 1,
                first: date,
                last: date,
            });
    }

    let total_customers = per_customer.len() as u64;
    let returning_customers = per_customer.values().filter(|a| a.orders > 1).count() as u64;
    let total_orders: u64 = per_customer.values().map(|a| a.orders).sum();

    let mut lifetime_days = 0.0;
    let mut customers_with_span = 0u64;
    for acc in per_customer.values() {
        if acc.orders > 1 {
            let days = (acc.last - acc.first).num_days();
            if days > 0 {
                lifetime_days += days as f64;
                customers_with_span += 1;
            }
        }
    }

    RetentionMetrics {
        total_customers,
        returning_customers,
        retention_rate: if total_customers > 0 {
            returning_customers as f64 / total_customers as f64
        } else {
            0.0
        },
        average_orders_per_customer: if total_customers > 0 {
            total_orders as f64 / total_customers as f64
        } else {
            0.0
        },
        average_customer_lifetime: if customers_with_span > 0 {
            lifetime_days / customers_with_span as f64
        } else {
            0.0
        },
    }
}

/// Unique (customer, laundromat) pair counts, strongest flows first. Ids are
/// shortened to eight characters for display.
pub fn customer_laundromat_flow(appointments: &[Appointment], limit: usize) -> Vec<CustomerFlow> {
    let mut pairs: BTreeMap<(String, String), u64> = BTreeMap::new();
    for a in appointments {
        let Some(customer) = &a.customer_id else { continue };
        let Some(cleaner) = a.cleaning.as_ref().and_then(|c| c.cleaner.as_ref()) else {
            continue;
        };
        *pairs.entry((customer.clone(), cleaner.clone())).or_insert(0) += 1;
    }

    let mut flows: Vec<CustomerFlow> = pairs
        .into_iter()
        .map(|((customer, laundromat), value)| CustomerFlow {
            source: short_id(&customer),
            target: short_id(&laundromat),
            value,
        })
        .collect();
    flows.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });
    flows.truncate(limit);
    flows
}

fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{}...", prefix)
}

/// Per-driver service counts, completion rate and distance economics over
/// both pickup and dropoff legs.
pub fn driver_performance(appointments: &[Appointment]) -> Vec<DriverStats> {
    #[derive(Default)]
    struct Acc {
        pickups: u64,
        dropoffs: u64,
        completed_pickups: u64,
        completed_dropoffs: u64,
        cancelled: u64,
        distance: f64,
        pay: f64,
    }

    fn tally(acc: &mut Acc, leg: &crate::types::ServiceLeg, is_pickup: bool) {
        if is_pickup {
            acc.pickups += 1;
        } else {
            acc.dropoffs += 1;
        }
        match leg.status.as_deref() {
            Some(COMPLETED) => {
                if is_pickup {
                    acc.completed_pickups += 1;
                } else {
                    acc.completed_dropoffs += 1;
                }
            }
            Some(crate::loader::CANCELLED_BY_SELLER) => acc.cancelled += 1,
            _ => {}
        }
        acc.distance += leg.distance.unwrap_or(0.0);
        acc.pay += leg.base_pay.unwrap_or(0.0);
    }

    let mut map: HashMap<String, Acc> = HashMap::new();
    for a in appointments {
        if let Some(pickup) = &a.pickup {
            if let Some(driver) = &pickup.driver {
                tally(map.entry(driver.clone()).or_default(), pickup, true);
            }
        }
        if let Some(dropoff) = &a.dropoff {
            if let Some(driver) = &dropoff.driver {
                tally(map.entry(driver.clone()).or_default(), dropoff, false);
            }
        }
    }

    let mut stats: Vec<DriverStats> = map
        .into_iter()
        .map(|(id, acc)| {
            let total_services = acc.pickups + acc.dropoffs;
            let completed_services = acc.completed_pickups + acc.completed_dropoffs;
            DriverStats {
                id,
                total_pickups: acc.pickups,
                total_dropoffs: acc.dropoffs,
                completed_pickups: acc.completed_pickups,
                completed_dropoffs: acc.completed_dropoffs,
                cancelled_services: acc.cancelled,
                total_services,
                completed_services,
                completion_rate: if total_services > 0 {
                    completed_services as f64 / total_services as f64
                } else {
                    0.0
                },
                total_distance: acc.distance,
                total_pay: acc.pay,
                avg_distance_per_service: if total_services > 0 {
                    acc.distance / total_services as f64
                } else {
                    0.0
                },
                avg_pay_per_distance: if acc.distance > 0.0 {
                    acc.pay / acc.distance
                } else {
                    0.0
                },
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_services
            .cmp(&a.total_services)
            .then_with(|| a.id.cmp(&b.id))
    });
    stats
}

/// Orders and revenue per fixed calendar quarter.
///
/// Quarters are deliberately not year-qualified: every year's Q1 lands in
/// the same bucket, answering "how does Q1 historically perform".
pub fn seasonal_trends(appointments: &[Appointment]) -> Vec<QuarterStats> {
    let names = [
        ("Q1", "Q1 (Jan-Mar)"),
        ("Q2", "Q2 (Apr-Jun)"),
        ("Q3", "Q3 (Jul-Sep)"),
        ("Q4", "Q4 (Oct-Dec)"),
    ];
    let mut orders = [0u64; 4];
    let mut revenue = [0.0f64; 4];

    for a in appointments {
        let Some(date) = resolve_service_date(a) else { continue };
        let quarter = (date.month0() / 3) as usize;
        orders[quarter] += 1;
        revenue[quarter] += resolve_revenue(a);
    }

    names
        .iter()
        .enumerate()
        .map(|(i, (quarter, name))| QuarterStats {
            quarter: quarter.to_string(),
            name: name.to_string(),
            orders: orders[i],
            revenue: revenue[i],
        })
        .collect()
}

/// Orders bucketed by wash & fold weight. Records without a weight are not
/// counted anywhere.
pub fn weight_distribution(appointments: &[Appointment]) -> Vec<WeightBucket> {
    let ranges = ["0-5kg", "6-10kg", "11-15kg", "16-20kg", "21-30kg", "31kg+"];
    let mut counts = [0u64; 6];

    for a in appointments {
        let Some(weight) = a
            .cleaning
            .as_ref()
            .and_then(|c| c.order_details.as_ref())
            .and_then(|o| o.wash_fold_weight)
        else {
            continue;
        };
        let idx = if weight <= 5.0 {
            0
        } else if weight <= 10.0 {
            1
        } else if weight <= 15.0 {
            2
        } else if weight <= 20.0 {
            3
        } else if weight <= 30.0 {
            4
        } else {
            5
        };
        counts[idx] += 1;
    }

    ranges
        .iter()
        .enumerate()
        .map(|(i, range)| WeightBucket {
            range: range.to_string(),
            count: counts[i],
        })
        .collect()
}

/// Headline figures for the summary file the console writes.
pub fn insight_summary(
    appointments: &[Appointment],
    retention: &RetentionMetrics,
) -> InsightSummary {
    let total_revenue: f64 = appointments.iter().map(resolve_revenue).sum();
    let orders = appointments.len() as u64;
    InsightSummary {
        total_appointments: orders,
        total_revenue,
        avg_order_value: if orders > 0 {
            total_revenue / orders as f64
        } else {
            0.0
        },
        total_customers: retention.total_customers,
        returning_customers: retention.returning_customers,
        retention_rate: retention.retention_rate,
    }
}
