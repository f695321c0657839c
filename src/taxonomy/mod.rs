//! Rule-based taxonomies that turn free-text assignment fields into a
//! closed category vocabulary.
//!
//! Every entry point classifies through a [`TaxonomySet`] compiled from one
//! [`RuleSetVersion`], so the diagnostic and production paths cannot drift
//! apart.
use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod rules;
mod tables;
pub mod vacancies;

use rules::{RuleTable, TableSpec};

use crate::store::models::AssignmentRecord;

/// Version of the keyword rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetVersion {
    /// Keyword lists of the first daily scoring release.
    V1,
    /// Extended keyword lists.
    V2,
}

impl RuleSetVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl Default for RuleSetVersion {
    fn default() -> Self {
        Self::V2
    }
}

impl fmt::Display for RuleSetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSetVersion {
    type Err = TaxonomyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(TaxonomyError::UnknownVersion(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("unknown rule-set version: {0}")]
    UnknownVersion(String),
    #[error("failed to compile rule table {table}: {source}")]
    Compile {
        table: &'static str,
        #[source]
        source: aho_corasick::BuildError,
    },
}

/// Free-text taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    Company,
    JobTitle,
    Requirement,
    InterviewSlot,
    Documentation,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 5] = [
        Self::Company,
        Self::JobTitle,
        Self::Requirement,
        Self::InterviewSlot,
        Self::Documentation,
    ];

    /// Feature column prefix used by the fitted model.
    #[must_use]
    pub fn feature_name(self) -> &'static str {
        match self {
            Self::Company => "categoria_empresa",
            Self::JobTitle => "categoria_cargo",
            Self::Requirement => "categoria_requisito",
            Self::InterviewSlot => "franja_hora_entrevista",
            Self::Documentation => "categoria_documentacion",
        }
    }
}

/// Labels attached to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryLabels {
    pub company: &'static str,
    pub job_title: &'static str,
    pub requirement: &'static str,
    pub interview_slot: &'static str,
    pub documentation: &'static str,
    pub vacancy_bucket: &'static str,
}

impl CategoryLabels {
    #[must_use]
    pub fn get(&self, taxonomy: Taxonomy) -> &'static str {
        match taxonomy {
            Taxonomy::Company => self.company,
            Taxonomy::JobTitle => self.job_title,
            Taxonomy::Requirement => self.requirement,
            Taxonomy::InterviewSlot => self.interview_slot,
            Taxonomy::Documentation => self.documentation,
        }
    }
}

/// Compiled rule tables of one version.
#[derive(Debug)]
pub struct TaxonomySet {
    version: RuleSetVersion,
    company: RuleTable,
    job_title: RuleTable,
    requirement: RuleTable,
    interview_slot: RuleTable,
    documentation: RuleTable,
}

impl TaxonomySet {
    /// Compiles every table of `version`.
    ///
    /// # Errors
    /// Returns [`TaxonomyError::Compile`] if a keyword automaton cannot be built.
    pub fn compile(version: RuleSetVersion) -> Result<Self, TaxonomyError> {
        let (company, job_title, requirement, documentation) = match version {
            RuleSetVersion::V1 => (
                tables::v1::COMPANY,
                tables::v1::JOB_TITLE,
                tables::v1::REQUIREMENT,
                tables::v1::DOCUMENTATION,
            ),
            RuleSetVersion::V2 => (
                tables::v2::COMPANY,
                tables::v2::JOB_TITLE,
                tables::v2::REQUIREMENT,
                tables::v2::DOCUMENTATION,
            ),
        };

        Ok(Self {
            version,
            company: compile_table(company)?,
            job_title: compile_table(job_title)?,
            requirement: compile_table(requirement)?,
            interview_slot: compile_table(tables::INTERVIEW_SLOT)?,
            documentation: compile_table(documentation)?,
        })
    }

    #[must_use]
    pub fn version(&self) -> RuleSetVersion {
        self.version
    }

    #[must_use]
    pub fn table(&self, taxonomy: Taxonomy) -> &RuleTable {
        match taxonomy {
            Taxonomy::Company => &self.company,
            Taxonomy::JobTitle => &self.job_title,
            Taxonomy::Requirement => &self.requirement,
            Taxonomy::InterviewSlot => &self.interview_slot,
            Taxonomy::Documentation => &self.documentation,
        }
    }

    #[must_use]
    pub fn classify(&self, taxonomy: Taxonomy, raw: Option<&str>) -> &'static str {
        self.table(taxonomy).classify(raw)
    }

    #[must_use]
    pub fn labels(&self, taxonomy: Taxonomy) -> BTreeSet<&'static str> {
        self.table(taxonomy).labels()
    }

    /// Classifies every free-text field of a record and buckets its open
    /// positions.
    #[must_use]
    pub fn classify_record(&self, record: &AssignmentRecord) -> CategoryLabels {
        CategoryLabels {
            company: self.company.classify(record.company.as_deref()),
            job_title: self.job_title.classify(record.job_title.as_deref()),
            requirement: self.requirement.classify(record.requirement.as_deref()),
            interview_slot: self
                .interview_slot
                .classify(record.interview_time.as_deref()),
            documentation: self
                .documentation
                .classify(record.documentation.as_deref()),
            vacancy_bucket: vacancies::classify_vacancies(record.open_positions.as_deref()),
        }
    }
}

fn compile_table(spec: TableSpec) -> Result<RuleTable, TaxonomyError> {
    RuleTable::compile(spec).map_err(|source| TaxonomyError::Compile {
        table: spec.name,
        source,
    })
}
