use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

/// Tabular result of a record-source query. Cells are nullable text; typed
/// coercion happens when records are built from the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RecordSet {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row built from `(column, value)` pairs; unknown columns are
    /// ignored and missing ones stay null.
    pub fn push_named(&mut self, cells: &[(&str, Option<&str>)]) {
        let mut row = vec![None; self.columns.len()];
        for (name, value) in cells {
            if let Some(idx) = self.column_index(name) {
                row[idx] = value.map(str::to_string);
            }
        }
        self.rows.push(row);
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn require(&self, names: &[&'static str]) -> Result<Vec<usize>, RecordValidationError> {
        names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or(RecordValidationError::MissingColumn(name))
            })
            .collect()
    }
}

/// The record set does not have the shape the pipeline expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordValidationError {
    #[error("record set is missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// Applicant identity and contact fields. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicantContact {
    pub document_number: Option<String>,
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// One job-placement assignment of the daily batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentRecord {
    /// Position in the source record set; the record identity across stages.
    pub row_index: usize,
    pub management_type: Option<String>,
    pub vacancy_code: Option<String>,
    pub unique_vacancy_code: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub open_positions: Option<String>,
    pub requirement: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub interview_time: Option<String>,
    pub documentation: Option<String>,
    pub company_contact: Option<String>,
    pub assigned_on: Option<NaiveDate>,
    pub applicant: ApplicantContact,
}

pub const ASSIGNMENT_COLUMNS: &[&str] = &[
    "tipo_de_gestion",
    "codigo_vacante",
    "codigo_unico_vacante",
    "empresa",
    "cargo",
    "numero_de_vacantes",
    "requisito_profesional",
    "fecha_entrevista",
    "hora_entrevista",
    "documentacion_requerida",
    "persona_contacto_empresa",
    "fecha_asignacion",
    "no_documento",
    "nombres",
    "apellidos",
    "phone",
    "email",
];

impl AssignmentRecord {
    /// Builds the daily batch from a record set.
    ///
    /// # Errors
    /// Returns [`RecordValidationError::MissingColumn`] if any column of
    /// [`ASSIGNMENT_COLUMNS`] is absent. Malformed cells never fail: they
    /// become `None`.
    pub fn from_record_set(set: &RecordSet) -> Result<Vec<Self>, RecordValidationError> {
        let idx = set.require(ASSIGNMENT_COLUMNS)?;
        let records = set
            .rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                let cell = |position: usize| -> Option<String> {
                    row.get(idx[position]).cloned().flatten()
                };
                Self {
                    row_index,
                    management_type: cell(0),
                    vacancy_code: cell(1),
                    unique_vacancy_code: cell(2),
                    company: cell(3),
                    job_title: cell(4),
                    open_positions: cell(5),
                    requirement: cell(6),
                    interview_date: parse_date(cell(7).as_deref()),
                    interview_time: cell(8),
                    documentation: cell(9),
                    company_contact: cell(10),
                    assigned_on: parse_date(cell(11).as_deref()),
                    applicant: ApplicantContact {
                        document_number: cell(12),
                        first_names: cell(13),
                        last_names: cell(14),
                        phone: cell(15),
                        email: cell(16),
                    },
                }
            })
            .collect();
        Ok(records)
    }
}

/// One row of the population the model was fitted on. Categories were
/// stored at fitting time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceRecord {
    pub management_type: Option<String>,
    pub company_category: Option<String>,
    pub job_title_category: Option<String>,
    pub converted: Option<bool>,
    pub assigned_on: Option<NaiveDate>,
}

pub const REFERENCE_COLUMNS: &[&str] = &[
    "tipo_de_gestion",
    "categoria_empresa",
    "categoria_cargo",
    "conversion",
];

/// Optional in the reference query; without it the recent-window
/// comparison reports insufficient data.
pub const REFERENCE_DATE_COLUMN: &str = "fecha_asignacion";

impl ReferenceRecord {
    /// # Errors
    /// Returns [`RecordValidationError::MissingColumn`] if any column of
    /// [`REFERENCE_COLUMNS`] is absent.
    pub fn from_record_set(set: &RecordSet) -> Result<Vec<Self>, RecordValidationError> {
        let idx = set.require(REFERENCE_COLUMNS)?;
        let date_idx = set.column_index(REFERENCE_DATE_COLUMN);
        let records = set
            .rows
            .iter()
            .map(|row| {
                let cell = |column: usize| row.get(column).cloned().flatten();
                Self {
                    management_type: cell(idx[0]),
                    company_category: cell(idx[1]),
                    job_title_category: cell(idx[2]),
                    converted: parse_flag(cell(idx[3]).as_deref()),
                    assigned_on: date_idx.and_then(|column| parse_date(cell(column).as_deref())),
                }
            })
            .collect();
        Ok(records)
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses the date formats the upstream tables use. Anything else is absent.
#[must_use]
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_lowercase().as_str() {
        "1" | "1.0" | "true" | "si" | "sí" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment_set() -> RecordSet {
        let columns = ASSIGNMENT_COLUMNS.iter().map(|c| (*c).to_string());
        RecordSet::new(columns.collect())
    }

    #[test]
    fn builds_assignments_and_coerces_cells() {
        let mut set = assignment_set();
        set.push_named(&[
            ("cargo", Some("OPERARIO")),
            ("fecha_entrevista", Some("2025-01-15 00:00:00")),
            ("fecha_asignacion", Some("14/01/2025")),
            ("numero_de_vacantes", Some("12")),
        ]);
        set.push_named(&[("fecha_entrevista", Some("pronto"))]);

        let records = AssignmentRecord::from_record_set(&set).expect("valid set");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row_index, 0);
        assert_eq!(records[0].job_title.as_deref(), Some("OPERARIO"));
        assert_eq!(
            records[0].interview_date,
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(records[0].assigned_on, NaiveDate::from_ymd_opt(2025, 1, 14));
        assert_eq!(records[1].row_index, 1);
        assert!(records[1].interview_date.is_none());
    }

    #[test]
    fn missing_column_is_a_validation_error() {
        let set = RecordSet::new(vec!["cargo".to_string()]);
        assert_eq!(
            AssignmentRecord::from_record_set(&set),
            Err(RecordValidationError::MissingColumn("tipo_de_gestion"))
        );
    }

    #[test]
    fn reference_rows_parse_outcome_and_optional_date() {
        let mut set = RecordSet::new(
            REFERENCE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        );
        set.push_named(&[("tipo_de_gestion", Some("Masiva")), ("conversion", Some("1"))]);
        set.push_named(&[("conversion", Some("x"))]);

        let records = ReferenceRecord::from_record_set(&set).expect("valid set");
        assert_eq!(records[0].converted, Some(true));
        assert_eq!(records[1].converted, None);
        assert!(records.iter().all(|record| record.assigned_on.is_none()));
    }
}
