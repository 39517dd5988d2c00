// Synthetic fallback dataset.
//
// When neither the backend nor the local export is reachable, the console
// still needs something to render. These records are plausible enough to
// exercise every aggregator: all cities, a handful of repeat customers,
// per-city laundromats, weights across the buckets, and service dates spread
// over the trailing months (never the current one).
use crate::config::CityDirectory;
use crate::types::{Appointment, Cleaning, Invoice, OrderDetails, ServiceLeg};
use crate::util::round2;
use chrono::{Duration, NaiveDate};
use rand::Rng;

const LAUNDROMAT_SUFFIXES: [&str; 3] = ["Cleaners", "Laundry", "Wash & Fold"];
const CUSTOMER_TYPES: [&str; 4] = ["Residential", "Commercial", "Airbnb", "Monthly"];

/// Default size of the fallback dataset.
pub const SAMPLE_SIZE: usize = 50;

pub fn sample_appointments(
    count: usize,
    cities: &CityDirectory,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> Vec<Appointment> {
    let mut out = Vec::with_capacity(count);
    if cities.cities.is_empty() {
        return out;
    }

    for i in 0..count {
        let city = &cities.cities[i % cities.cities.len()];
        let cleaner = format!(
            "{} {}",
            city.name,
            LAUNDROMAT_SUFFIXES[i % LAUNDROMAT_SUFFIXES.len()]
        );
        // 20 repeat customers across the set so retention isn't zero.
        let customer = format!("sample-customer-{}", i % 20);
        let driver = format!("sample-driver-{}", i % 5);
        // 30..210 days back keeps every record out of the current month.
        let service_date = today - Duration::days(30 + (i as i64 * 11) % 180);
        let date_str = service_date.format("%Y-%m-%d").to_string();
        let drop_str = (service_date + Duration::days(1 + (i as i64 % 3)))
            .format("%Y-%m-%d")
            .to_string();

        out.push(Appointment {
            appointment_id: Some(format!("sample-{}", i)),
            city_id: Some(city.id.clone()),
            customer_id: Some(customer),
            customer_type: Some(CUSTOMER_TYPES[i % CUSTOMER_TYPES.len()].to_string()),
            status: Some("COMPLETED".to_string()),
            invoice: Some(Invoice {
                total: Some(round2(20.0 + rng.gen::<f64>() * 80.0)),
            }),
            pickup: Some(ServiceLeg {
                service_date: Some(date_str),
                driver: Some(driver.clone()),
                status: Some("COMPLETED".to_string()),
                distance: Some(2.0 + rng.gen::<f64>() * 10.0),
                base_pay: Some(5.0 + rng.gen::<f64>() * 10.0),
                ..ServiceLeg::default()
            }),
            dropoff: Some(ServiceLeg {
                driver: Some(driver),
                status: Some("COMPLETED".to_string()),
                distance: Some(2.0 + rng.gen::<f64>() * 10.0),
                base_pay: Some(5.0 + rng.gen::<f64>() * 10.0),
                ..ServiceLeg::default()
            }),
            drop: Some(ServiceLeg {
                service_date: Some(drop_str),
                ..ServiceLeg::default()
            }),
            cleaning: Some(Cleaning {
                cleaner: Some(cleaner),
                order_details: Some(OrderDetails {
                    wash_fold_weight: Some(3.0 + rng.gen::<f64>() * 30.0),
                }),
                ..Cleaning::default()
            }),
            ..Appointment::default()
        });
    }
    out
}
