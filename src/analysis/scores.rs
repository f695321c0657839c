//! Summary statistics of a scored batch.
use serde::Serialize;

use super::{
    Diagnostic,
    distribution::{DistributionSnapshot, ShareEntry},
};
use crate::pipeline::export::ScoredRecord;

/// Half-open probability bands `[lower, upper)`; the last band is unbounded.
const BANDS: [(&str, f64, f64); 5] = [
    ("<20%", f64::NEG_INFINITY, 0.20),
    ("20-30%", 0.20, 0.30),
    ("30-40%", 0.30, 0.40),
    ("40-50%", 0.40, 0.50),
    (">=50%", 0.50, f64::INFINITY),
];

const EXTREMES: usize = 10;
const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub band: &'static str,
    pub count: usize,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub row_index: usize,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub probability: f64,
}

impl From<&ScoredRecord> for RankedRecord {
    fn from(scored: &ScoredRecord) -> Self {
        Self {
            row_index: scored.record.row_index,
            company: scored.record.company.clone(),
            job_title: scored.record.job_title.clone(),
            probability: scored.score.probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub bands: Vec<BandCount>,
    pub highest: Vec<RankedRecord>,
    pub lowest: Vec<RankedRecord>,
    pub company_categories: Vec<ShareEntry>,
    pub job_title_categories: Vec<ShareEntry>,
    pub reference_mean: f64,
    /// `mean - reference_mean`.
    pub mean_shift: f64,
}

impl ScoreSummary {
    /// Summarises `scored` against the mean probability of the fitting
    /// population.
    pub fn from_scored(scored: &[ScoredRecord], reference_mean: f64) -> Diagnostic<Self> {
        if scored.is_empty() {
            return Diagnostic::insufficient("scored_batch", "no scored records");
        }

        let mut ranked: Vec<&ScoredRecord> = scored.iter().collect();
        ranked.sort_by(|a, b| {
            a.score
                .probability
                .total_cmp(&b.score.probability)
                .then_with(|| a.record.row_index.cmp(&b.record.row_index))
        });
        let probabilities: Vec<f64> = ranked.iter().map(|r| r.score.probability).collect();

        let count = probabilities.len();
        let mean = probabilities.iter().sum::<f64>() / count as f64;
        let middle = count / 2;
        let median = if count % 2 == 0 {
            (probabilities[middle - 1] + probabilities[middle]) / 2.0
        } else {
            probabilities[middle]
        };

        let bands = BANDS
            .iter()
            .map(|&(band, lower, upper)| {
                let hits = probabilities
                    .iter()
                    .filter(|p| **p >= lower && **p < upper)
                    .count();
                BandCount {
                    band,
                    count: hits,
                    share_pct: (hits as f64 * 100.0) / count as f64,
                }
            })
            .collect();

        let lowest = ranked.iter().take(EXTREMES).map(|r| RankedRecord::from(*r)).collect();
        let highest = ranked
            .iter()
            .rev()
            .take(EXTREMES)
            .map(|r| RankedRecord::from(*r))
            .collect();

        let top_labels = |labels: Vec<&'static str>| {
            DistributionSnapshot::from_labels("scored_batch", labels.into_iter().map(Some))
                .ready()
                .map(|snapshot| snapshot.top(TOP_CATEGORIES).to_vec())
                .unwrap_or_default()
        };

        Diagnostic::Ready(Self {
            count,
            min: probabilities[0],
            max: probabilities[count - 1],
            mean,
            median,
            bands,
            highest,
            lowest,
            company_categories: top_labels(scored.iter().map(|r| r.labels.company).collect()),
            job_title_categories: top_labels(scored.iter().map(|r| r.labels.job_title).collect()),
            reference_mean,
            mean_shift: mean - reference_mean,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::score::{Score, Tier},
        store::models::AssignmentRecord,
        taxonomy::CategoryLabels,
    };

    fn scored(row_index: usize, probability: f64, company: &'static str) -> ScoredRecord {
        ScoredRecord {
            record: AssignmentRecord {
                row_index,
                ..AssignmentRecord::default()
            },
            labels: CategoryLabels {
                company,
                job_title: "otros",
                requirement: "otros",
                interview_slot: "sin_hora",
                documentation: "otros",
                vacancy_bucket: "1-100",
            },
            score: Score {
                row_index,
                probability,
                tier: Tier::from_probability(probability),
            },
        }
    }

    #[test]
    fn statistics_and_bands() {
        let batch = vec![
            scored(0, 0.10, "bpo_callcenter"),
            scored(1, 0.20, "bpo_callcenter"),
            scored(2, 0.35, "otras"),
            scored(3, 0.50, "retail"),
        ];
        let summary = ScoreSummary::from_scored(&batch, 0.47);
        let summary = summary.ready().expect("ready");

        assert_eq!(summary.count, 4);
        assert!((summary.min - 0.10).abs() < 1e-12);
        assert!((summary.max - 0.50).abs() < 1e-12);
        assert!((summary.mean - 0.2875).abs() < 1e-12);
        assert!((summary.median - 0.275).abs() < 1e-12);
        assert!((summary.mean_shift - (0.2875 - 0.47)).abs() < 1e-12);

        let counts: Vec<usize> = summary.bands.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 0, 1]);
        assert_eq!(summary.highest[0].row_index, 3);
        assert_eq!(summary.lowest[0].row_index, 0);
        assert_eq!(summary.company_categories[0].label, "bpo_callcenter");
    }

    #[test]
    fn empty_batch_is_insufficient() {
        assert!(!ScoreSummary::from_scored(&[], 0.47).is_ready());
    }
}
