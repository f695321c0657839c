//! Open-positions bucketing.

pub const VACANCY_BUCKET_FEATURE: &str = "rango_vacantes";
pub const VACANCY_UNKNOWN: &str = "sin_informacion";

/// Half-open upper bounds evaluated top-down; the first satisfied bound wins.
const BUCKETS: &[(f64, &str)] = &[(100.0, "1-100"), (200.0, "100-200"), (300.0, "200-300")];
const OPEN_BUCKET: &str = "300+";

/// Every label [`vacancy_bucket`] can return.
pub const VACANCY_LABELS: &[&str] = &["1-100", "100-200", "200-300", "300+", VACANCY_UNKNOWN];

/// Buckets a count into `[0,100) [100,200) [200,300) [300,∞)`. Negative and
/// non-finite counts fall back to [`VACANCY_UNKNOWN`].
#[must_use]
pub fn vacancy_bucket(count: Option<f64>) -> &'static str {
    let Some(value) = count.filter(|value| value.is_finite() && *value >= 0.0) else {
        return VACANCY_UNKNOWN;
    };
    BUCKETS
        .iter()
        .find(|(upper, _)| value < *upper)
        .map_or(OPEN_BUCKET, |(_, label)| label)
}

/// Coerces a raw cell into a count; unparsable text yields `None`.
#[must_use]
pub fn parse_vacancy_count(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .and_then(|text| text.parse::<f64>().ok())
}

/// Buckets a raw cell directly.
#[must_use]
pub fn classify_vacancies(raw: Option<&str>) -> &'static str {
    vacancy_bucket(parse_vacancy_count(raw))
}
