// Field resolution across inconsistent record shapes.
//
// Different ingestion paths wrote revenue, city and service date under
// different names over time. Each resolver here tries the known spellings in
// a fixed priority order and degrades to a documented fallback instead of
// failing, so the aggregators never have to look at raw fields.
use crate::config::CityDirectory;
use crate::types::Appointment;
use crate::util::parse_date_safe;
use chrono::NaiveDate;

/// Canonical revenue for an appointment.
///
/// `invoice.total` and the legacy `invoiceTotal` were populated by different
/// ingestion paths and can both be present on one record. When both are
/// positive the larger one wins: taking the max avoids double-counting,
/// summing them would. With neither present, the per-leg rates are summed as
/// a fallback. Never negative, never NaN.
pub fn resolve_revenue(a: &Appointment) -> f64 {
    let legacy = a.invoice_total.filter(|v| *v > 0.0);
    let current = a
        .invoice
        .as_ref()
        .and_then(|i| i.total)
        .filter(|v| *v > 0.0);

    match (current, legacy) {
        (Some(c), Some(l)) => c.max(l),
        (Some(c), None) => c,
        (None, Some(l)) => l,
        (None, None) => {
            let mut components = 0.0;
            if let Some(p) = &a.pickup {
                components += p.rate.unwrap_or(0.0);
            }
            if let Some(d) = &a.delivery {
                components += d.rate.unwrap_or(0.0);
            }
            if let Some(c) = &a.cleaning {
                components += c.rate.unwrap_or(0.0);
            }
            if components > 0.0 {
                components
            } else {
                0.0
            }
        }
    }
}

/// Canonical city id for an appointment.
///
/// Tries `cityId`, `city_id`, then a `city` value that is itself a known id;
/// after that, a case-insensitive display-name lookup over `city` and
/// `cityName`. Records that still don't resolve are attributed to the
/// directory's default city (a fallback, not an error).
pub fn normalize_city_id<'c>(a: &Appointment, cities: &'c CityDirectory) -> &'c str {
    let id_candidates = [
        a.city_id.as_deref(),
        a.legacy_city_id.as_deref(),
        a.city.as_deref(),
    ];
    for candidate in id_candidates.into_iter().flatten() {
        if let Some(id) = cities.canonical_id(candidate) {
            return id;
        }
    }

    let name_candidates = [a.city.as_deref(), a.city_name.as_deref()];
    for candidate in name_candidates.into_iter().flatten() {
        if let Some(id) = cities.id_for_name(candidate) {
            return id;
        }
    }

    cities.default_city()
}

/// Whether the record carries any city field at all (resolvable or not).
pub fn has_city_field(a: &Appointment) -> bool {
    a.city_id.is_some() || a.legacy_city_id.is_some() || a.city.is_some() || a.city_name.is_some()
}

/// Service date for an appointment: `pickup.serviceDate`, then
/// `service_date`, then `createdAt`; first present wins. An unparseable
/// value in the winning field yields `None`; the record then drops out of
/// date-bucketed views but still counts everywhere else.
pub fn resolve_service_date(a: &Appointment) -> Option<NaiveDate> {
    let raw = a
        .pickup
        .as_ref()
        .and_then(|p| p.service_date.as_deref())
        .or(a.service_date.as_deref())
        .or(a.created_at.as_deref())?;
    parse_date_safe(Some(raw))
}
