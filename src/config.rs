// Immutable configuration tables.
//
// The city directory and the projection parameters are plain data that gets
// passed into the aggregation and projection functions. The built-in values
// match the production service footprint; deployments with a different
// footprint can deserialize their own tables and pass those instead.
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pseudo city id meaning "no city filter".
pub const ALL_CITIES: &str = "all";

/// Display name used for the [`ALL_CITIES`] pseudo city.
pub const ALL_CITIES_NAME: &str = "All Cities";

/// Label used wherever a record has no usable value for a dimension.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

/// The known service cities and the default attribution for records whose
/// city cannot be resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityDirectory {
    pub cities: Vec<City>,
    pub default_city_id: String,
}

impl CityDirectory {
    /// The production city footprint.
    pub fn builtin() -> Self {
        let cities = [
            ("LYGRRATQ7EGG2", "London"),
            ("L4NE8GPX89J3A", "Ottawa"),
            ("LDK6Z980JTKXY", "Kitchener-Waterloo"),
            ("LXMC6DWVJ5N7W", "Hamilton"),
            ("LG0VGFKQ25XED", "Calgary"),
        ]
        .into_iter()
        .map(|(id, name)| City {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();
        CityDirectory {
            cities,
            default_city_id: "LYGRRATQ7EGG2".to_string(),
        }
    }

    /// The directory's own copy of `id`, when `id` is a known city.
    pub fn canonical_id(&self, id: &str) -> Option<&str> {
        self.cities
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.canonical_id(id).is_some()
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        if id == ALL_CITIES {
            return Some(ALL_CITIES_NAME);
        }
        self.cities
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// Display name, falling back to [`UNKNOWN`] for unrecognized ids.
    pub fn display_name(&self, id: &str) -> &str {
        self.name_of(id).unwrap_or(UNKNOWN)
    }

    /// Case-insensitive reverse lookup of a display name.
    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id.as_str())
    }

    pub fn default_city(&self) -> &str {
        &self.default_city_id
    }
}

impl Default for CityDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Per-city growth assumptions feeding the projection engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub name: String,
    pub population: Option<u64>,
    /// Year-over-year order growth, e.g. `1.35` for +35%.
    pub yearly_growth_factor: f64,
    /// 0..1; more mature markets grow slower.
    pub market_maturity: f64,
    /// Floor for any projected weekly point.
    pub min_weekly_orders: f64,
    pub operational_since: Option<NaiveDate>,
}

/// Everything the projection engine needs besides the historical series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub per_city: HashMap<String, ProjectionParams>,
    /// Parameters used for [`ALL_CITIES`] and any city missing from `per_city`.
    pub all_cities: ProjectionParams,
    /// Week-of-month demand factors (weeks 1-5).
    pub weekly_seasonality: [f64; 5],
    /// Month-of-year demand factors (Jan-Dec).
    pub monthly_seasonality: [f64; 12],
    /// Months after this date are considered incomplete and are excluded
    /// from the projection baseline.
    pub history_cutoff: NaiveDate,
}

impl ProjectionConfig {
    pub fn builtin() -> Self {
        let mut per_city = HashMap::new();
        let entries = [
            ("LYGRRATQ7EGG2", "London", 400_000, 1.35, 0.15, 80.0, (2022, 12, 1)),
            ("L4NE8GPX89J3A", "Ottawa", 1_050_000, 1.28, 0.35, 35.0, (2023, 3, 15)),
            ("LDK6Z980JTKXY", "Kitchener-Waterloo", 575_000, 1.32, 0.30, 40.0, (2023, 6, 1)),
            ("LXMC6DWVJ5N7W", "Hamilton", 570_000, 1.25, 0.35, 30.0, (2023, 9, 10)),
            ("LG0VGFKQ25XED", "Calgary", 1_300_000, 1.40, 0.20, 25.0, (2023, 11, 20)),
        ];
        for (id, name, population, growth, maturity, min_weekly, (y, m, d)) in entries {
            per_city.insert(
                id.to_string(),
                ProjectionParams {
                    name: name.to_string(),
                    population: Some(population),
                    yearly_growth_factor: growth,
                    market_maturity: maturity,
                    min_weekly_orders: min_weekly,
                    operational_since: NaiveDate::from_ymd_opt(y, m, d),
                },
            );
        }
        ProjectionConfig {
            per_city,
            all_cities: ProjectionParams {
                name: ALL_CITIES_NAME.to_string(),
                population: None,
                yearly_growth_factor: 1.28,
                market_maturity: 0.25,
                min_weekly_orders: 85.0,
                operational_since: None,
            },
            weekly_seasonality: [0.98, 1.00, 1.05, 1.08, 0.95],
            monthly_seasonality: [
                0.95, 0.98, 1.02, 1.05, 1.08, 1.12, 1.10, 1.05, 1.10, 1.05, 1.00, 0.98,
            ],
            history_cutoff: NaiveDate::from_ymd_opt(2024, 10, 31)
                .unwrap_or(NaiveDate::MAX),
        }
    }

    /// Parameters for a city id; the all-cities set doubles as the fallback.
    pub fn params_for(&self, city_id: &str) -> &ProjectionParams {
        self.per_city.get(city_id).unwrap_or(&self.all_cities)
    }

    /// Seasonal factor for a zero-based week-of-month slot.
    pub fn week_factor(&self, week_of_month: usize) -> f64 {
        self.weekly_seasonality
            .get(week_of_month)
            .copied()
            .unwrap_or(1.0)
    }

    /// Seasonal factor for a zero-based month index.
    pub fn month_factor(&self, month0: usize) -> f64 {
        self.monthly_seasonality
            .get(month0)
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Shared built-in tables for call sites that don't inject their own.
pub static DEFAULT_CITIES: Lazy<CityDirectory> = Lazy::new(CityDirectory::builtin);
pub static DEFAULT_PROJECTION: Lazy<ProjectionConfig> = Lazy::new(ProjectionConfig::builtin);
