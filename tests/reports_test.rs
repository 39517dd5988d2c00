// End-to-end properties of the aggregation pipeline over a small but
// realistic dataset.
use chrono::NaiveDate;
use laundry_insights::config::CityDirectory;
use laundry_insights::fields::resolve_revenue;
use laundry_insights::reports;
use laundry_insights::types::Appointment;
use serde_json::json;

fn appt(value: serde_json::Value) -> Appointment {
    serde_json::from_value(value).expect("test appointment")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, 15).unwrap()
}

/// The worked example: two London orders by the same residential customer.
fn london_pair() -> Vec<Appointment> {
    vec![
        appt(json!({
            "cityId": "LYGRRATQ7EGG2",
            "invoiceTotal": 50,
            "customerId": "c1",
            "customerType": "Residential",
            "pickup": {"serviceDate": "2023-05-01"}
        })),
        appt(json!({
            "cityId": "LYGRRATQ7EGG2",
            "invoice": {"total": 30},
            "customerId": "c1",
            "customerType": "Residential",
            "pickup": {"serviceDate": "2023-06-01"}
        })),
    ]
}

fn mixed_dataset() -> Vec<Appointment> {
    let mut data = london_pair();
    data.extend([
        appt(json!({
            "cityId": "L4NE8GPX89J3A",
            "customerId": "c2",
            "customerType": "Commercial",
            "invoiceTotal": 120,
            "invoice": {"total": 80},
            "pickup": {"serviceDate": "2023-06-10"},
            "cleaning": {"cleaner": "Browns", "orderDetails": {"washFoldWeight": 12}}
        })),
        appt(json!({
            "cityId": "LG0VGFKQ25XED",
            "customerId": "c3",
            "customerType": "Airbnb",
            "pickup": {"serviceDate": "2023-01-20", "rate": 15},
            "delivery": {"rate": 10},
            "cleaning": {"cleaner": "Marbank", "orderDetails": {"washFoldWeight": "7.5"}}
        })),
        // No revenue, no date, no city: still counted where possible.
        appt(json!({"customerId": "c4", "customerType": "Monthly"})),
    ]);
    data
}

#[test]
fn city_statistics_match_the_worked_example() {
    let cities = CityDirectory::builtin();
    let stats = reports::city_statistics(&london_pair(), &cities);
    let london = stats.iter().find(|s| s.name == "London").unwrap();
    assert_eq!(london.orders, 2);
    assert_eq!(london.revenue, 80.0);
    assert_eq!(london.customers, 1);
    assert_eq!(london.avg_order_value, 40.0);
    assert_eq!(london.customer_types["Residential"], 2);

    // Every directory city is present even with zero activity.
    assert_eq!(stats.len(), cities.cities.len());
    let calgary = stats.iter().find(|s| s.name == "Calgary").unwrap();
    assert_eq!(calgary.orders, 0);
    assert_eq!(calgary.avg_order_value, 0.0);
}

#[test]
fn retention_matches_the_worked_example() {
    let retention = reports::customer_retention_metrics(&london_pair());
    assert_eq!(retention.total_customers, 1);
    assert_eq!(retention.returning_customers, 1);
    assert_eq!(retention.retention_rate, 1.0);
    assert_eq!(retention.average_orders_per_customer, 2.0);
    // 2023-05-01 to 2023-06-01.
    assert_eq!(retention.average_customer_lifetime, 31.0);
}

#[test]
fn resolved_revenue_is_never_negative_or_nan() {
    for a in mixed_dataset() {
        let r = resolve_revenue(&a);
        assert!(r.is_finite());
        assert!(r >= 0.0);
    }
}

#[test]
fn city_revenue_sums_to_total_resolved_revenue() {
    let cities = CityDirectory::builtin();
    let data = mixed_dataset();
    let total: f64 = data.iter().map(resolve_revenue).sum();
    let stats = reports::city_statistics(&data, &cities);
    let by_city: f64 = stats.iter().map(|s| s.revenue).sum();
    assert!((total - by_city).abs() < 1e-9);
    for s in &stats {
        if s.orders > 0 {
            assert!((s.avg_order_value - s.revenue / s.orders as f64).abs() < 1e-9);
        } else {
            assert_eq!(s.avg_order_value, 0.0);
        }
    }
}

#[test]
fn retention_rate_stays_in_range() {
    let retention = reports::customer_retention_metrics(&mixed_dataset());
    assert!(retention.retention_rate >= 0.0 && retention.retention_rate <= 1.0);
    assert!(retention.returning_customers <= retention.total_customers);

    let empty = reports::customer_retention_metrics(&[]);
    assert_eq!(empty.total_customers, 0);
    assert_eq!(empty.retention_rate, 0.0);
}

#[test]
fn monthly_trend_never_contains_the_current_month() {
    let cities = CityDirectory::builtin();
    let mut data = mixed_dataset();
    // An order placed "today" must not create or fill a bucket.
    data.push(appt(json!({
        "cityId": "LYGRRATQ7EGG2",
        "customerId": "c9",
        "customerType": "Residential",
        "pickup": {"serviceDate": "2023-07-15"}
    })));

    let trend = reports::monthly_orders_trend(&data, &cities, today(), 12);
    assert!(trend.iter().all(|p| p.month != "2023-07"));
    // 12 trailing months minus the excluded current one.
    assert_eq!(trend.len(), 11);

    let june = trend.iter().find(|p| p.month == "2023-06").unwrap();
    assert_eq!(june.total, 2);
    assert_eq!(june.by_city["London"], 1);
    assert_eq!(june.by_city["Ottawa"], 1);
}

#[test]
fn avg_order_value_ignores_zero_revenue_orders() {
    let data = vec![
        appt(json!({
            "cityId": "LYGRRATQ7EGG2",
            "customerType": "Residential",
            "invoiceTotal": 60,
            "pickup": {"serviceDate": "2023-06-05"}
        })),
        appt(json!({
            "cityId": "LYGRRATQ7EGG2",
            "customerType": "Residential",
            "pickup": {"serviceDate": "2023-06-09"}
        })),
    ];
    let trend = reports::avg_order_value_trend(&data, today(), 12);
    let june = trend.iter().find(|p| p.month == "2023-06").unwrap();
    // One billed order only; the unbilled one doesn't drag the average down.
    assert_eq!(june.value, 60.0);
}

#[test]
fn weight_buckets_sum_to_the_weighted_record_count() {
    let data = mixed_dataset();
    let weighted = data
        .iter()
        .filter(|a| {
            a.cleaning
                .as_ref()
                .and_then(|c| c.order_details.as_ref())
                .and_then(|o| o.wash_fold_weight)
                .is_some()
        })
        .count() as u64;
    let buckets = reports::weight_distribution(&data);
    let total: u64 = buckets.iter().map(|b| b.count).sum();
    assert_eq!(total, weighted);
    assert_eq!(buckets.len(), 6);
}

#[test]
fn customer_type_distribution_has_an_unknown_bucket() {
    let mut data = mixed_dataset();
    data.push(appt(json!({"customerId": "c5"})));
    let dist = reports::customer_type_distribution(&data);
    let unknown = dist.iter().find(|d| d.name == "Unknown").unwrap();
    assert_eq!(unknown.value, 1);
    let total: u64 = dist.iter().map(|d| d.value).sum();
    assert_eq!(total, data.len() as u64);
}

#[test]
fn customer_laundromat_flow_counts_pairs() {
    let data = mixed_dataset();
    let flows = reports::customer_laundromat_flow(&data, reports::FLOW_LIMIT);
    assert_eq!(flows.len(), 2);
    assert!(flows.iter().all(|f| f.value == 1));
    assert!(flows.iter().all(|f| f.source.ends_with("...")));
}

#[test]
fn aggregators_are_deterministic_over_the_same_input() {
    let cities = CityDirectory::builtin();
    let data = mixed_dataset();

    assert_eq!(
        reports::city_statistics(&data, &cities),
        reports::city_statistics(&data, &cities)
    );
    assert_eq!(
        reports::laundromat_statistics(&data),
        reports::laundromat_statistics(&data)
    );
    assert_eq!(
        reports::monthly_orders_trend(&data, &cities, today(), 12),
        reports::monthly_orders_trend(&data, &cities, today(), 12)
    );
    assert_eq!(
        reports::customer_retention_metrics(&data),
        reports::customer_retention_metrics(&data)
    );
    assert_eq!(
        reports::driver_performance(&data),
        reports::driver_performance(&data)
    );
    assert_eq!(
        reports::seasonal_trends(&data),
        reports::seasonal_trends(&data)
    );
    assert_eq!(
        reports::weight_distribution(&data),
        reports::weight_distribution(&data)
    );
}

#[test]
fn everything_degrades_to_empty_on_an_empty_dataset() {
    let cities = CityDirectory::builtin();
    let stats = reports::city_statistics(&[], &cities);
    assert!(stats.iter().all(|s| s.orders == 0 && s.revenue == 0.0));
    assert!(reports::laundromat_statistics(&[]).is_empty());
    assert!(reports::driver_performance(&[]).is_empty());
    assert!(reports::customer_laundromat_flow(&[], 20).is_empty());
    let seasonal = reports::seasonal_trends(&[]);
    assert_eq!(seasonal.len(), 4);
    assert!(seasonal.iter().all(|q| q.orders == 0));
}
