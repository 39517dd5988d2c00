// Weekly order projections.
//
// This is a heuristic forecast, not a statistical model: a weekly baseline
// derived from recent monthly totals, compounded weekly growth dampened by
// market maturity, week-of-month and month-of-year seasonality, and a small
// random jitter so charts don't look machine-ruled. The RNG is a parameter:
// production callers pass a thread RNG, tests pass a seeded one.
//
// Every generated point carries `projected: true`; nothing downstream may
// treat a projected point as an observation.
use crate::config::{CityDirectory, ProjectionConfig, ALL_CITIES};
use crate::types::{MonthlyTrendPoint, ProjectionMetrics, ProjectionResult, WeeklyPoint};
use crate::util::{average, days_in_month, parse_month_key, weeks_in_month};
use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;

/// Average weeks per month used for weekly/monthly conversions.
const WEEKS_PER_MONTH: f64 = 4.3;

/// How far growth is dampened per unit of market maturity.
const MATURITY_DAMPENING: f64 = 0.15;

/// Default projection horizon.
pub const DEFAULT_WEEKS_AHEAD: usize = 52;

/// One month of history relevant to a single city (or the network total).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub name: String,
    pub month: String,
    pub orders: f64,
}

/// Extract the historical series for `city_id` from the monthly trend:
/// the `total` column for [`ALL_CITIES`], the city's own series otherwise.
/// Months with zero orders are dropped; they predate the city going live.
pub fn preprocess_historical(
    monthly: &[MonthlyTrendPoint],
    city_id: &str,
    cities: &CityDirectory,
) -> Vec<HistoryPoint> {
    let city_name = if city_id == ALL_CITIES {
        None
    } else {
        match cities.name_of(city_id) {
            Some(name) => Some(name.to_string()),
            None => return Vec::new(),
        }
    };

    monthly
        .iter()
        .filter_map(|m| {
            let orders = match &city_name {
                None => m.total as f64,
                Some(name) => m.by_city.get(name).copied().unwrap_or(0) as f64,
            };
            (orders > 0.0).then(|| HistoryPoint {
                name: m.name.clone(),
                month: m.month.clone(),
                orders,
            })
        })
        .collect()
}

/// Spread monthly totals over the weeks they contain so sparse monthly data
/// charts as a dense weekly series. This is smoothing, not aggregation:
/// weeks are linearly interpolated toward the next month, shaped by the
/// week-of-month factors, and lightly jittered.
pub fn weekly_historical_points(
    history: &[HistoryPoint],
    config: &ProjectionConfig,
    rng: &mut impl Rng,
) -> Vec<WeeklyPoint> {
    let mut weekly = Vec::new();
    if history.is_empty() {
        return weekly;
    }

    for (i, month) in history.iter().enumerate() {
        let Some(first_day) = parse_month_key(&month.month) else {
            // Unparseable bucket: keep the month as a single point rather
            // than dropping the data.
            weekly.push(WeeklyPoint {
                name: month.name.clone(),
                fullname: month.name.clone(),
                week: month.month.clone(),
                month: month.month.clone(),
                orders: month.orders.round().max(0.0) as u64,
                projected: false,
            });
            continue;
        };
        let year = first_day.year();
        let month_num = first_day.month();
        let days = days_in_month(year, month_num);
        let weeks = weeks_in_month(year, month_num);
        let next_orders = history.get(i + 1).map(|n| n.orders).unwrap_or(month.orders);

        for week in 0..weeks {
            let week_day = (week * 7 + 1).min(days);
            let Some(date) = NaiveDate::from_ymd_opt(year, month_num, week_day) else {
                continue;
            };
            let position = week as f64 / weeks as f64;
            let mut orders = if i < history.len() - 1 {
                month.orders * (1.0 - position) + next_orders * position
            } else {
                // Last month: a gentle -5%..+5% drift instead of a flat line.
                month.orders * (1.0 + (position - 0.5) * 0.1)
            };
            orders *= config.week_factor(week as usize);
            orders *= 1.0 + (rng.gen::<f64>() * 0.04 - 0.02);

            weekly.push(WeeklyPoint {
                name: date.format("%b %-d").to_string(),
                fullname: date.format("%b %-d, %Y").to_string(),
                week: date.format("%Y-%m-%d").to_string(),
                month: date.format("%Y-%m").to_string(),
                orders: (orders / weeks as f64).round().max(0.0) as u64,
                projected: false,
            });
        }
    }

    weekly
}

/// Generate the combined weekly historical + projected series for a city.
///
/// The baseline excludes months after the configured cutoff (recent months
/// are incomplete and would understate the run rate), averages what is left
/// when at least three months survive, converts to weekly via 4.3 and floors
/// at the city's configured minimum.
pub fn generate_projections(
    monthly: &[MonthlyTrendPoint],
    city_id: &str,
    weeks_ahead: usize,
    cities: &CityDirectory,
    config: &ProjectionConfig,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> ProjectionResult {
    let city_name = cities.display_name(city_id).to_string();
    let history = preprocess_historical(monthly, city_id, cities);
    if history.is_empty() {
        return empty_result(city_name);
    }

    let filtered: Vec<&HistoryPoint> = history
        .iter()
        .filter(|p| match parse_month_key(&p.month) {
            Some(d) => d <= config.history_cutoff,
            None => true,
        })
        .collect();

    let Some(last) = filtered.last().copied().or_else(|| history.last()) else {
        return empty_result(city_name);
    };

    let params = config.params_for(city_id);
    let base_weekly = (last.orders / WEEKS_PER_MONTH).max(params.min_weekly_orders);
    let baseline = if filtered.len() >= 3 {
        let values: Vec<f64> = filtered.iter().map(|p| p.orders).collect();
        (average(&values) / WEEKS_PER_MONTH).max(params.min_weekly_orders)
    } else {
        base_weekly
    };

    let weekly_growth = params.yearly_growth_factor.powf(1.0 / 52.0);
    let maturity_factor = 1.0 - params.market_maturity * MATURITY_DAMPENING;
    let adjusted_growth = weekly_growth * maturity_factor;

    let mut projected = Vec::with_capacity(weeks_ahead);
    let mut current = base_weekly;
    for i in 0..weeks_ahead {
        let date = today + Duration::weeks(i as i64);
        current *= adjusted_growth;
        let week_of_month = (date.day() / 7) as usize;
        current *= config.week_factor(week_of_month) * config.month_factor(date.month0() as usize);
        current *= 1.0 + (rng.gen::<f64>() * 0.03 - 0.015);
        current = current.max(params.min_weekly_orders);

        projected.push(WeeklyPoint {
            name: date.format("%b %-d").to_string(),
            fullname: date.format("%b %-d, %Y").to_string(),
            week: date.format("%Y-%m-%d").to_string(),
            month: date.format("%Y-%m").to_string(),
            orders: current.round() as u64,
            projected: true,
        });
    }

    let weekly_historical = weekly_historical_points(&history, config, rng);

    let total_projected: u64 = projected.iter().map(|p| p.orders).sum();
    let avg_weekly = if projected.is_empty() {
        0.0
    } else {
        total_projected as f64 / projected.len() as f64
    };
    let monthly_equivalent = total_projected as f64 / WEEKS_PER_MONTH;
    let growth_percent = if baseline > 0.0 {
        (avg_weekly / baseline - 1.0) * 100.0
    } else {
        0.0
    };

    let mut combined: Vec<WeeklyPoint> = weekly_historical
        .iter()
        .cloned()
        .chain(projected.iter().cloned())
        .collect();
    combined.sort_by(|a, b| a.week.cmp(&b.week));

    ProjectionResult {
        combined,
        weekly_historical,
        projected,
        metrics: ProjectionMetrics {
            total_annual_orders: (monthly_equivalent * 12.0).round() as u64,
            average_monthly_orders: (avg_weekly * WEEKS_PER_MONTH).round() as u64,
            average_weekly_orders: avg_weekly.round() as u64,
            projected_growth_percent: growth_percent,
            city_name,
        },
    }
}

fn empty_result(city_name: String) -> ProjectionResult {
    ProjectionResult {
        metrics: ProjectionMetrics {
            city_name,
            ..ProjectionMetrics::default()
        },
        ..ProjectionResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn monthly_fixture() -> Vec<MonthlyTrendPoint> {
        // Six months of growth for London, flat elsewhere.
        let months = [
            ("2024-04", "Apr 2024", 100u64),
            ("2024-05", "May 2024", 110),
            ("2024-06", "Jun 2024", 120),
            ("2024-07", "Jul 2024", 130),
            ("2024-08", "Aug 2024", 140),
            ("2024-09", "Sep 2024", 150),
        ];
        months
            .iter()
            .map(|(key, name, total)| {
                let mut by_city = BTreeMap::new();
                by_city.insert("London".to_string(), *total);
                by_city.insert("Ottawa".to_string(), 0);
                MonthlyTrendPoint {
                    month: key.to_string(),
                    name: name.to_string(),
                    total: *total,
                    by_city,
                }
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 4).unwrap()
    }

    #[test]
    fn preprocess_selects_city_series_and_drops_zero_months() {
        let cities = CityDirectory::builtin();
        let monthly = monthly_fixture();
        let london = preprocess_historical(&monthly, "LYGRRATQ7EGG2", &cities);
        assert_eq!(london.len(), 6);
        assert_eq!(london[0].orders, 100.0);
        // Ottawa has only zero months, so nothing survives.
        let ottawa = preprocess_historical(&monthly, "L4NE8GPX89J3A", &cities);
        assert!(ottawa.is_empty());
        let all = preprocess_historical(&monthly, ALL_CITIES, &cities);
        assert_eq!(all[5].orders, 150.0);
    }

    #[test]
    fn every_projected_point_is_flagged_and_floored() {
        let cities = CityDirectory::builtin();
        let config = ProjectionConfig::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let result = generate_projections(
            &monthly_fixture(),
            "LYGRRATQ7EGG2",
            52,
            &cities,
            &config,
            today(),
            &mut rng,
        );
        assert_eq!(result.projected.len(), 52);
        let min = config.params_for("LYGRRATQ7EGG2").min_weekly_orders;
        for p in &result.projected {
            assert!(p.projected);
            assert!(p.orders as f64 >= min.floor());
        }
        for p in &result.weekly_historical {
            assert!(!p.projected);
        }
    }

    #[test]
    fn combined_series_is_chronological() {
        let cities = CityDirectory::builtin();
        let config = ProjectionConfig::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let result = generate_projections(
            &monthly_fixture(),
            ALL_CITIES,
            26,
            &cities,
            &config,
            today(),
            &mut rng,
        );
        let weeks: Vec<&str> = result.combined.iter().map(|p| p.week.as_str()).collect();
        let mut sorted = weeks.clone();
        sorted.sort();
        assert_eq!(weeks, sorted);
        assert_eq!(
            result.combined.len(),
            result.weekly_historical.len() + result.projected.len()
        );
    }

    #[test]
    fn seeded_rng_makes_the_projection_reproducible() {
        let cities = CityDirectory::builtin();
        let config = ProjectionConfig::builtin();
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_projections(
                &monthly_fixture(),
                "LYGRRATQ7EGG2",
                52,
                &cities,
                &config,
                today(),
                &mut rng,
            )
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn empty_history_yields_an_empty_result() {
        let cities = CityDirectory::builtin();
        let config = ProjectionConfig::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        let result =
            generate_projections(&[], ALL_CITIES, 52, &cities, &config, today(), &mut rng);
        assert!(result.combined.is_empty());
        assert_eq!(result.metrics.total_annual_orders, 0);
        assert_eq!(result.metrics.city_name, "All Cities");
    }

    #[test]
    fn growth_metrics_reflect_the_baseline() {
        let cities = CityDirectory::builtin();
        let config = ProjectionConfig::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let result = generate_projections(
            &monthly_fixture(),
            "LYGRRATQ7EGG2",
            52,
            &cities,
            &config,
            today(),
            &mut rng,
        );
        // 52 growing weeks from a ~29/week series floored at 80 must
        // average above the floored baseline.
        assert!(result.metrics.average_weekly_orders >= 80);
        assert!(result.metrics.total_annual_orders > 0);
        assert_eq!(result.metrics.city_name, "London");
    }
}
