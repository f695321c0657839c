//! Category distributions of a population and comparisons between two.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::Diagnostic;
use crate::store::models::ReferenceRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub label: String,
    pub count: usize,
    /// Percentage of the whole population, unlabelled rows included.
    pub share_pct: f64,
}

/// Counts and shares of each label, ranked by share descending, then label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSnapshot {
    pub population: String,
    pub total: usize,
    pub entries: Vec<ShareEntry>,
}

impl DistributionSnapshot {
    /// Builds a snapshot from one label per record; `None` counts toward the
    /// total but not toward any label.
    pub fn from_labels<'a, I>(population: &str, labels: I) -> Diagnostic<Self>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut total = 0usize;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in labels {
            total += 1;
            if let Some(label) = label {
                *counts.entry(label).or_default() += 1;
            }
        }
        if total == 0 {
            return Diagnostic::insufficient(population, "population is empty");
        }

        let mut entries: Vec<ShareEntry> = counts
            .into_iter()
            .map(|(label, count)| ShareEntry {
                label: label.to_string(),
                count,
                share_pct: percentage(count, total),
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        Diagnostic::Ready(Self {
            population: population.to_string(),
            total,
            entries,
        })
    }

    /// Share of `label`, zero when unobserved.
    #[must_use]
    pub fn share(&self, label: &str) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map_or(0.0, |entry| entry.share_pct)
    }

    #[must_use]
    pub fn labels(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    #[must_use]
    pub fn top(&self, n: usize) -> &[ShareEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    (count as f64 * 100.0) / total as f64
}

/// Labels observed in both populations and in only one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelOverlap {
    pub shared: BTreeSet<String>,
    pub reference_only: BTreeSet<String>,
    pub candidate_only: BTreeSet<String>,
}

impl LabelOverlap {
    #[must_use]
    pub fn between(reference: &DistributionSnapshot, candidate: &DistributionSnapshot) -> Self {
        let left = reference.labels();
        let right = candidate.labels();
        Self {
            shared: left.intersection(&right).map(|label| (*label).to_string()).collect(),
            reference_only: left.difference(&right).map(|label| (*label).to_string()).collect(),
            candidate_only: right.difference(&left).map(|label| (*label).to_string()).collect(),
        }
    }
}

/// Absolute percentage-point difference of one label's share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareGap {
    pub label: String,
    pub reference_pct: f64,
    pub candidate_pct: f64,
    pub gap_pct: f64,
}

/// Gaps over the union of labels, largest first, ties by label.
#[must_use]
pub fn share_gaps(
    reference: &DistributionSnapshot,
    candidate: &DistributionSnapshot,
) -> Vec<ShareGap> {
    let labels: BTreeSet<&str> = reference
        .labels()
        .union(&candidate.labels())
        .copied()
        .collect();
    let mut gaps: Vec<ShareGap> = labels
        .into_iter()
        .map(|label| {
            let reference_pct = reference.share(label);
            let candidate_pct = candidate.share(label);
            ShareGap {
                label: label.to_string(),
                reference_pct,
                candidate_pct,
                gap_pct: (candidate_pct - reference_pct).abs(),
            }
        })
        .collect();
    gaps.sort_by(|a, b| {
        b.gap_pct
            .total_cmp(&a.gap_pct)
            .then_with(|| a.label.cmp(&b.label))
    });
    gaps
}

/// Conversion rate of one management type in the reference population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRate {
    pub management_type: String,
    pub conversions: usize,
    pub total: usize,
    pub rate_pct: f64,
}

/// Rates per management type, highest first. Rows without a type or an
/// outcome are ignored.
pub fn conversion_rates(reference: &[ReferenceRecord]) -> Diagnostic<Vec<ConversionRate>> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in reference {
        let (Some(kind), Some(converted)) = (record.management_type.as_deref(), record.converted)
        else {
            continue;
        };
        let group = groups.entry(kind).or_default();
        group.0 += usize::from(converted);
        group.1 += 1;
    }
    if groups.is_empty() {
        return Diagnostic::insufficient("reference", "no rows with management type and outcome");
    }

    let mut rates: Vec<ConversionRate> = groups
        .into_iter()
        .map(|(kind, (conversions, total))| ConversionRate {
            management_type: kind.to_string(),
            conversions,
            total,
            rate_pct: percentage(conversions, total),
        })
        .collect();
    rates.sort_by(|a, b| {
        b.rate_pct
            .total_cmp(&a.rate_pct)
            .then_with(|| a.management_type.cmp(&b.management_type))
    });
    Diagnostic::Ready(rates)
}
