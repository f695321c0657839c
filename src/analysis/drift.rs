//! Drift between the fitting population and a candidate batch.
use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::{
    Diagnostic,
    distribution::{
        ConversionRate, DistributionSnapshot, LabelOverlap, ShareEntry, ShareGap, conversion_rates,
        share_gaps,
    },
};
use crate::{
    store::models::{AssignmentRecord, ReferenceRecord},
    taxonomy::{RuleSetVersion, Taxonomy, TaxonomySet},
};

const REFERENCE: &str = "reference";
const CANDIDATE: &str = "candidate";
const RECENT: &str = "recent_window";

const TYPES_WITH_COMPANY_BREAKDOWN: usize = 3;
const COMPANIES_PER_TYPE: usize = 5;

/// Thresholds of the drift decision rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftPolicy {
    /// A candidate/reference gap above this, in percentage points, is drift.
    pub gap_threshold_pct: f64,
    pub recent_window_days: u32,
    /// Recent share above historical share plus this margin favours refitting
    /// on recent data.
    pub recent_margin_pct: f64,
    pub min_recent_rows: usize,
    /// Company category whose gap decides the verdict.
    pub designated_category: String,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            gap_threshold_pct: 30.0,
            recent_window_days: 60,
            recent_margin_pct: 10.0,
            min_recent_rows: 1000,
            designated_category: "bpo_callcenter".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftVerdict {
    pub threshold_pct: f64,
    pub designated_category: String,
    pub designated_gap_pct: f64,
    /// The designated category's gap exceeds the threshold.
    pub drift_detected: bool,
    /// Every category whose gap exceeds the threshold.
    pub findings: Vec<ShareGap>,
}

impl DriftVerdict {
    #[must_use]
    pub fn evaluate(gaps: &[ShareGap], policy: &DriftPolicy) -> Self {
        let designated_gap_pct = gaps
            .iter()
            .find(|gap| gap.label == policy.designated_category)
            .map_or(0.0, |gap| gap.gap_pct);
        Self {
            threshold_pct: policy.gap_threshold_pct,
            designated_category: policy.designated_category.clone(),
            designated_gap_pct,
            drift_detected: designated_gap_pct > policy.gap_threshold_pct,
            findings: gaps
                .iter()
                .filter(|gap| gap.gap_pct > policy.gap_threshold_pct)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentShift {
    pub label: String,
    pub historical_pct: f64,
    pub recent_pct: f64,
    pub delta_pct: f64,
}

/// Company-category shares of the trailing window against full history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentWindowComparison {
    pub window_start: NaiveDate,
    pub as_of: NaiveDate,
    pub recent_rows: usize,
    pub shifts: Vec<RecentShift>,
    /// Categories whose recent share exceeds history by more than the margin.
    pub rising: Vec<String>,
    pub prefer_recent: bool,
}

/// Restricts the reference population to the trailing window
/// `[as_of - recent_window_days, as_of]` and compares company-category
/// shares with `historical`. Rows dated after `as_of` are outside the window.
pub fn recent_window(
    reference: &[ReferenceRecord],
    historical: &DistributionSnapshot,
    as_of: NaiveDate,
    policy: &DriftPolicy,
) -> Diagnostic<RecentWindowComparison> {
    if reference.iter().all(|record| record.assigned_on.is_none()) {
        return Diagnostic::insufficient(RECENT, "reference rows carry no assignment date");
    }
    let window_start = as_of
        .checked_sub_days(Days::new(u64::from(policy.recent_window_days)))
        .unwrap_or(NaiveDate::MIN);
    let recent: Vec<&ReferenceRecord> = reference
        .iter()
        .filter(|record| {
            record
                .assigned_on
                .is_some_and(|date| window_start <= date && date <= as_of)
        })
        .collect();
    if recent.len() < policy.min_recent_rows {
        return Diagnostic::insufficient(
            RECENT,
            format!(
                "{} rows in window, at least {} required",
                recent.len(),
                policy.min_recent_rows
            ),
        );
    }

    let snapshot = DistributionSnapshot::from_labels(
        RECENT,
        recent.iter().map(|record| record.company_category.as_deref()),
    );
    let Some(snapshot) = snapshot.ready() else {
        return Diagnostic::insufficient(RECENT, "window is empty");
    };

    let shifts: Vec<RecentShift> = snapshot
        .entries
        .iter()
        .map(|entry| {
            let historical_pct = historical.share(&entry.label);
            RecentShift {
                label: entry.label.clone(),
                historical_pct,
                recent_pct: entry.share_pct,
                delta_pct: entry.share_pct - historical_pct,
            }
        })
        .collect();
    let rising: Vec<String> = shifts
        .iter()
        .filter(|shift| shift.delta_pct > policy.recent_margin_pct)
        .map(|shift| shift.label.clone())
        .collect();

    Diagnostic::Ready(RecentWindowComparison {
        window_start,
        as_of,
        recent_rows: recent.len(),
        prefer_recent: !rising.is_empty(),
        shifts,
        rising,
    })
}

/// One feature compared across both populations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationComparison {
    pub feature: String,
    pub reference: Diagnostic<DistributionSnapshot>,
    pub candidate: Diagnostic<DistributionSnapshot>,
    pub overlap: Diagnostic<LabelOverlap>,
    pub gaps: Diagnostic<Vec<ShareGap>>,
}

impl PopulationComparison {
    fn compare<'r, 'c>(
        feature: &str,
        reference: impl IntoIterator<Item = Option<&'r str>>,
        candidate: impl IntoIterator<Item = Option<&'c str>>,
    ) -> Self {
        let reference = DistributionSnapshot::from_labels(REFERENCE, reference);
        let candidate = DistributionSnapshot::from_labels(CANDIDATE, candidate);
        let (overlap, gaps) = match (reference.ready(), candidate.ready()) {
            (Some(left), Some(right)) => (
                Diagnostic::Ready(LabelOverlap::between(left, right)),
                Diagnostic::Ready(share_gaps(left, right)),
            ),
            (None, _) => (
                Diagnostic::insufficient(REFERENCE, "population is empty"),
                Diagnostic::insufficient(REFERENCE, "population is empty"),
            ),
            (_, None) => (
                Diagnostic::insufficient(CANDIDATE, "population is empty"),
                Diagnostic::insufficient(CANDIDATE, "population is empty"),
            ),
        };
        Self {
            feature: feature.to_string(),
            reference,
            candidate,
            overlap,
            gaps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompaniesByType {
    pub management_type: String,
    pub top_companies: Vec<ShareEntry>,
}

/// Full drift report of a candidate batch against the fitting population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub ruleset: RuleSetVersion,
    pub as_of: NaiveDate,
    pub reference_rows: usize,
    pub candidate_rows: usize,
    pub management_type: PopulationComparison,
    pub company_category: PopulationComparison,
    pub job_title_category: PopulationComparison,
    pub conversion_by_type: Diagnostic<Vec<ConversionRate>>,
    pub companies_by_type: Vec<CompaniesByType>,
    pub verdict: Diagnostic<DriftVerdict>,
    pub recent_window: Diagnostic<RecentWindowComparison>,
    pub policy: DriftPolicy,
}

impl DriftReport {
    /// Classifies the candidate batch with `taxonomies` and compares it with
    /// the stored categories of the reference population.
    #[must_use]
    pub fn build(
        taxonomies: &TaxonomySet,
        reference: &[ReferenceRecord],
        candidate: &[AssignmentRecord],
        as_of: NaiveDate,
        policy: &DriftPolicy,
    ) -> Self {
        let company_labels: Vec<&'static str> = candidate
            .iter()
            .map(|record| taxonomies.classify(Taxonomy::Company, record.company.as_deref()))
            .collect();
        let job_title_labels: Vec<&'static str> = candidate
            .iter()
            .map(|record| taxonomies.classify(Taxonomy::JobTitle, record.job_title.as_deref()))
            .collect();

        let management_type = PopulationComparison::compare(
            "tipo_de_gestion",
            reference.iter().map(|record| record.management_type.as_deref()),
            candidate.iter().map(|record| record.management_type.as_deref()),
        );
        let company_category = PopulationComparison::compare(
            Taxonomy::Company.feature_name(),
            reference.iter().map(|record| record.company_category.as_deref()),
            company_labels.iter().map(|label| Some(*label)),
        );
        let job_title_category = PopulationComparison::compare(
            Taxonomy::JobTitle.feature_name(),
            reference.iter().map(|record| record.job_title_category.as_deref()),
            job_title_labels.iter().map(|label| Some(*label)),
        );

        let verdict = match company_category.gaps.ready() {
            Some(gaps) => Diagnostic::Ready(DriftVerdict::evaluate(gaps, policy)),
            None => Diagnostic::insufficient(CANDIDATE, "no company-category gaps to evaluate"),
        };
        let recent_window = match company_category.reference.ready() {
            Some(historical) => recent_window(reference, historical, as_of, policy),
            None => Diagnostic::insufficient(REFERENCE, "population is empty"),
        };

        Self {
            ruleset: taxonomies.version(),
            as_of,
            reference_rows: reference.len(),
            candidate_rows: candidate.len(),
            management_type,
            company_category,
            job_title_category,
            conversion_by_type: conversion_rates(reference),
            companies_by_type: companies_by_type(candidate),
            verdict,
            recent_window,
            policy: policy.clone(),
        }
    }
}

/// Top raw company names of the first management types, in order of first
/// appearance.
fn companies_by_type(candidate: &[AssignmentRecord]) -> Vec<CompaniesByType> {
    let mut types: Vec<&str> = Vec::new();
    for kind in candidate.iter().filter_map(|record| record.management_type.as_deref()) {
        if !types.contains(&kind) {
            types.push(kind);
            if types.len() == TYPES_WITH_COMPANY_BREAKDOWN {
                break;
            }
        }
    }

    types
        .into_iter()
        .map(|kind| {
            let companies = candidate
                .iter()
                .filter(|record| record.management_type.as_deref() == Some(kind))
                .map(|record| record.company.as_deref());
            let top_companies = DistributionSnapshot::from_labels(kind, companies)
                .ready()
                .map(|snapshot| snapshot.top(COMPANIES_PER_TYPE).to_vec())
                .unwrap_or_default();
            CompaniesByType {
                management_type: kind.to_string(),
                top_companies,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gap(label: &str, reference_pct: f64, candidate_pct: f64) -> ShareGap {
        ShareGap {
            label: label.to_string(),
            reference_pct,
            candidate_pct,
            gap_pct: (candidate_pct - reference_pct).abs(),
        }
    }

    #[rstest]
    #[case(65.0, true)]
    #[case(60.0, false)]
    #[case(30.0, false)]
    fn verdict_is_strictly_above_threshold(#[case] candidate_pct: f64, #[case] expected: bool) {
        let policy = DriftPolicy::default();
        let gaps = [gap("bpo_callcenter", 30.0, candidate_pct)];
        let verdict = DriftVerdict::evaluate(&gaps, &policy);
        assert_eq!(verdict.drift_detected, expected);
        assert_eq!(verdict.findings.len(), usize::from(expected));
    }

    #[test]
    fn unobserved_designated_category_has_zero_gap() {
        let verdict = DriftVerdict::evaluate(&[gap("otras", 10.0, 90.0)], &DriftPolicy::default());
        assert!(!verdict.drift_detected);
        assert_eq!(verdict.designated_gap_pct, 0.0);
        assert_eq!(verdict.findings.len(), 1);
    }

    fn dated(category: &str, date: NaiveDate) -> ReferenceRecord {
        ReferenceRecord {
            company_category: Some(category.to_string()),
            assigned_on: Some(date),
            ..ReferenceRecord::default()
        }
    }

    #[test]
    fn recent_window_flags_rising_categories() {
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        let old = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let new = NaiveDate::from_ymd_opt(2025, 2, 20).expect("date");
        let mut reference: Vec<ReferenceRecord> = (0..8).map(|_| dated("otras", old)).collect();
        reference.push(dated("bpo_callcenter", new));
        reference.push(dated("bpo_callcenter", new));

        let historical = DistributionSnapshot::from_labels(
            REFERENCE,
            reference.iter().map(|r| r.company_category.as_deref()),
        );
        let policy = DriftPolicy {
            min_recent_rows: 2,
            ..DriftPolicy::default()
        };
        let comparison = recent_window(
            &reference,
            historical.ready().expect("ready"),
            as_of,
            &policy,
        );
        let comparison = comparison.ready().expect("enough rows");
        assert_eq!(comparison.recent_rows, 2);
        assert_eq!(comparison.rising, vec!["bpo_callcenter".to_string()]);
        assert!(comparison.prefer_recent);
        assert!((comparison.shifts[0].delta_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn recent_window_needs_dates_and_rows() {
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        let undated = vec![ReferenceRecord {
            company_category: Some("otras".to_string()),
            ..ReferenceRecord::default()
        }];
        let historical = DistributionSnapshot::from_labels(REFERENCE, [Some("otras")]);
        let historical = historical.ready().expect("ready");
        assert!(!recent_window(&undated, historical, as_of, &DriftPolicy::default()).is_ready());

        let few = vec![dated("otras", as_of)];
        assert!(!recent_window(&few, historical, as_of, &DriftPolicy::default()).is_ready());
    }

    #[test]
    fn company_breakdown_keeps_first_three_types() {
        let record = |kind: &str, company: &str| AssignmentRecord {
            management_type: Some(kind.to_string()),
            company: Some(company.to_string()),
            ..AssignmentRecord::default()
        };
        let candidate = vec![
            record("Masiva", "ATENTO"),
            record("Tradicional", "ACME"),
            record("Masiva", "ATENTO"),
            record("Masiva", "DICO"),
            record("Express", "ACME"),
            record("Especial", "ACME"),
        ];
        let breakdown = companies_by_type(&candidate);
        let kinds: Vec<&str> = breakdown.iter().map(|b| b.management_type.as_str()).collect();
        assert_eq!(kinds, vec!["Masiva", "Tradicional", "Express"]);
        assert_eq!(breakdown[0].top_companies[0].label, "ATENTO");
        assert_eq!(breakdown[0].top_companies[0].count, 2);
    }
}
