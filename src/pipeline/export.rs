//! Tier-segmented CSV export with all-or-nothing publication.
use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    features::WithheldRecord,
    score::{Score, Tier},
};
use crate::{store::models::AssignmentRecord, taxonomy::CategoryLabels};

/// Column projection of every exported scoring file.
pub const EXPORT_COLUMNS: [&str; 14] = [
    "tipo_de_gestion",
    "codigo_vacante",
    "cargo",
    "empresa",
    "fecha_entrevista",
    "hora_entrevista",
    "no_documento",
    "nombres",
    "apellidos",
    "phone",
    "email",
    "codigo_unico_vacante",
    "probabilidad_conversion",
    "score_priorizacion",
];

const WITHHELD_COLUMNS: [&str; 3] = ["fila", "codigo_vacante", "motivo"];
const PARTIAL_SUFFIX: &str = ".partial";
const PREVIOUS_SUFFIX: &str = ".previous";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to set aside existing {path}: {source}")]
    SetAside {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A record with its labels and score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub record: AssignmentRecord,
    pub labels: CategoryLabels,
    pub score: Score,
}

/// Destination directories and file prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    pub output_dir: PathBuf,
    pub analysis_dir: PathBuf,
    pub dialer_dir: PathBuf,
    pub prefix: String,
}

impl ExportLayout {
    fn tier_file(&self, dir: &Path, tier: Tier, stamp: &str) -> PathBuf {
        dir.join(format!("{} - Score_{}_{stamp}.csv", self.prefix, tier.as_str()))
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    tipo_de_gestion: Option<&'a str>,
    codigo_vacante: Option<&'a str>,
    cargo: Option<&'a str>,
    empresa: Option<&'a str>,
    fecha_entrevista: Option<String>,
    hora_entrevista: Option<&'a str>,
    no_documento: Option<&'a str>,
    nombres: Option<&'a str>,
    apellidos: Option<&'a str>,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    codigo_unico_vacante: Option<&'a str>,
    probabilidad_conversion: f64,
    score_priorizacion: &'static str,
}

impl<'a> From<&'a ScoredRecord> for ExportRow<'a> {
    fn from(scored: &'a ScoredRecord) -> Self {
        let record = &scored.record;
        Self {
            tipo_de_gestion: record.management_type.as_deref(),
            codigo_vacante: record.vacancy_code.as_deref(),
            cargo: record.job_title.as_deref(),
            empresa: record.company.as_deref(),
            fecha_entrevista: record
                .interview_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            hora_entrevista: record.interview_time.as_deref(),
            no_documento: record.applicant.document_number.as_deref(),
            nombres: record.applicant.first_names.as_deref(),
            apellidos: record.applicant.last_names.as_deref(),
            phone: record.applicant.phone.as_deref(),
            email: record.applicant.email.as_deref(),
            codigo_unico_vacante: record.unique_vacancy_code.as_deref(),
            probabilidad_conversion: scored.score.probability,
            score_priorizacion: scored.score.tier.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WithheldRow<'a> {
    fila: usize,
    codigo_vacante: Option<&'a str>,
    motivo: String,
}

enum FileBody<'a> {
    Scored(Vec<&'a ScoredRecord>),
    Withheld(&'a [WithheldRecord]),
}

struct PlannedFile<'a> {
    path: PathBuf,
    body: FileBody<'a>,
}

#[derive(Debug, Clone)]
pub struct Exporter {
    layout: ExportLayout,
}

impl Exporter {
    #[must_use]
    pub fn new(layout: ExportLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &ExportLayout {
        &self.layout
    }

    /// Writes per-tier files to the output and dialer directories, the
    /// consolidated file and, when needed, the withheld-records file. Either
    /// every file is published or none is.
    ///
    /// Files of an earlier run at the same paths are replaced only once the
    /// whole set is in place; a failed publication restores them.
    ///
    /// # Errors
    /// Returns [`ExportError`] on any filesystem failure; partial files are
    /// removed before returning.
    pub fn export(
        &self,
        run_date: NaiveDate,
        scored: &[ScoredRecord],
        withheld: &[WithheldRecord],
    ) -> Result<Vec<PathBuf>, ExportError> {
        for dir in [
            &self.layout.output_dir,
            &self.layout.analysis_dir,
            &self.layout.dialer_dir,
        ] {
            fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        let plan = self.plan(run_date, scored, withheld);
        let mut staged = Vec::with_capacity(plan.len());
        for file in &plan {
            let partial = partial_path(&file.path);
            staged.push(partial.clone());
            if let Err(error) = write_file(&partial, &file.body) {
                discard(&staged);
                return Err(error);
            }
            debug!(path = %partial.display(), "staged export file");
        }

        let mut publication = Publication::default();
        for (file, partial) in plan.iter().zip(&staged) {
            if let Err(error) = publication.publish(partial, &file.path) {
                publication.roll_back();
                discard(&staged);
                return Err(error);
            }
        }

        let published = publication.commit();
        info!(files = published.len(), records = scored.len(), "export published");
        Ok(published)
    }

    fn plan<'a>(
        &self,
        run_date: NaiveDate,
        scored: &'a [ScoredRecord],
        withheld: &'a [WithheldRecord],
    ) -> Vec<PlannedFile<'a>> {
        let stamp = run_date.format("%Y%m%d").to_string();
        let mut plan = Vec::new();

        for dir in [&self.layout.output_dir, &self.layout.dialer_dir] {
            for tier in Tier::ALL {
                let rows: Vec<&ScoredRecord> = scored
                    .iter()
                    .filter(|record| record.score.tier == tier)
                    .collect();
                if rows.is_empty() {
                    continue;
                }
                plan.push(PlannedFile {
                    path: self.layout.tier_file(dir, tier, &stamp),
                    body: FileBody::Scored(rows),
                });
            }
        }

        plan.push(PlannedFile {
            path: self
                .layout
                .analysis_dir
                .join(format!("Consolidado_Analisis_{stamp}.csv")),
            body: FileBody::Scored(scored.iter().collect()),
        });

        if !withheld.is_empty() {
            plan.push(PlannedFile {
                path: self.layout.analysis_dir.join(format!("Retenidos_{stamp}.csv")),
                body: FileBody::Withheld(withheld),
            });
        }
        plan
    }
}

fn partial_path(path: &Path) -> PathBuf {
    sibling_path(path, PARTIAL_SUFFIX)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Renames staged files into place, keeping any file they replace until
/// the publication is committed or rolled back.
#[derive(Debug, Default)]
struct Publication {
    published: Vec<PathBuf>,
    set_aside: Vec<(PathBuf, PathBuf)>,
}

impl Publication {
    fn publish(&mut self, partial: &Path, target: &Path) -> Result<(), ExportError> {
        if fs::symlink_metadata(target).is_ok() {
            let previous = sibling_path(target, PREVIOUS_SUFFIX);
            fs::rename(target, &previous).map_err(|source| ExportError::SetAside {
                path: target.to_path_buf(),
                source,
            })?;
            self.set_aside.push((previous, target.to_path_buf()));
        }
        fs::rename(partial, target).map_err(|source| ExportError::Publish {
            path: target.to_path_buf(),
            source,
        })?;
        self.published.push(target.to_path_buf());
        Ok(())
    }

    fn roll_back(self) {
        discard(&self.published);
        for (previous, target) in self.set_aside.iter().rev() {
            if let Err(error) = fs::rename(previous, target) {
                warn!(
                    path = %target.display(),
                    error = %error,
                    "failed to restore previously published file"
                );
            }
        }
    }

    fn commit(self) -> Vec<PathBuf> {
        let previous: Vec<PathBuf> = self
            .set_aside
            .into_iter()
            .map(|(previous, _)| previous)
            .collect();
        discard(&previous);
        self.published
    }
}

fn write_file(path: &Path, body: &FileBody<'_>) -> Result<(), ExportError> {
    let wrap = |source: csv::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(wrap)?;

    match body {
        FileBody::Scored(rows) => {
            writer.write_record(EXPORT_COLUMNS).map_err(wrap)?;
            for row in rows {
                writer.serialize(ExportRow::from(*row)).map_err(wrap)?;
            }
        }
        FileBody::Withheld(rows) => {
            writer.write_record(WITHHELD_COLUMNS).map_err(wrap)?;
            for row in *rows {
                writer
                    .serialize(WithheldRow {
                        fila: row.row_index,
                        codigo_vacante: row.vacancy_code.as_deref(),
                        motivo: row.reason.to_string(),
                    })
                    .map_err(wrap)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|source| wrap(csv::Error::from(source)))
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(error) = fs::remove_file(path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %error, "failed to remove export file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::FeatureDerivationError;

    fn labels() -> CategoryLabels {
        CategoryLabels {
            company: "otras",
            job_title: "otros",
            requirement: "sin_especificar",
            interview_slot: "sin_hora",
            documentation: "sin_especificar",
            vacancy_bucket: "sin_informacion",
        }
    }

    fn scored(row_index: usize, probability: f64) -> ScoredRecord {
        ScoredRecord {
            record: AssignmentRecord {
                row_index,
                vacancy_code: Some(format!("V{row_index}")),
                company: Some("ACME, S.A.".to_string()),
                interview_date: NaiveDate::from_ymd_opt(2025, 1, 15),
                ..AssignmentRecord::default()
            },
            labels: labels(),
            score: Score {
                row_index,
                probability,
                tier: Tier::from_probability(probability),
            },
        }
    }

    fn layout(root: &Path) -> ExportLayout {
        ExportLayout {
            output_dir: root.join("predicciones"),
            analysis_dir: root.join("analisis"),
            dialer_dir: root.join("dialer"),
            prefix: "COLSAGEM".to_string(),
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).expect("date")
    }

    #[test]
    fn empty_tiers_produce_no_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(layout(dir.path()));
        let files = exporter
            .export(run_date(), &[scored(0, 0.9), scored(1, 0.1)], &[])
            .expect("export succeeds");

        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "COLSAGEM - Score_Alto_20250115.csv",
                "COLSAGEM - Score_Bajo_20250115.csv",
                "COLSAGEM - Score_Alto_20250115.csv",
                "COLSAGEM - Score_Bajo_20250115.csv",
                "Consolidado_Analisis_20250115.csv",
            ]
        );
        assert!(files.iter().all(|path| path.exists()));
    }

    #[test]
    fn files_carry_the_projection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(layout(dir.path()));
        exporter
            .export(run_date(), &[scored(0, 0.45)], &[])
            .expect("export succeeds");

        let body = fs::read_to_string(
            dir.path()
                .join("analisis")
                .join("Consolidado_Analisis_20250115.csv"),
        )
        .expect("read consolidated");
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some(EXPORT_COLUMNS.join(",").as_str()));
        let row = lines.next().expect("one row");
        assert!(row.starts_with(",V0,,\"ACME, S.A.\",2025-01-15,"));
        assert!(row.ends_with(",0.45,Medio"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn withheld_records_get_their_own_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(layout(dir.path()));
        let withheld = [WithheldRecord {
            row_index: 3,
            vacancy_code: Some("V3".to_string()),
            labels: labels(),
            reason: FeatureDerivationError::MissingInterviewDate { row_index: 3 },
        }];
        let files = exporter
            .export(run_date(), &[scored(0, 0.7)], &withheld)
            .expect("export succeeds");
        let retained = files.last().expect("files");
        assert!(retained.ends_with("analisis/Retenidos_20250115.csv"));
        let body = fs::read_to_string(retained).expect("read withheld");
        assert!(body.contains("3,V3,record 3 has no usable interview date"));
    }

    #[test]
    fn missing_directory_leaves_no_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut layout = layout(dir.path());
        // A regular file where the dialer directory should be.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "x").expect("write blocker");
        layout.dialer_dir = blocker.join("dialer");

        let exporter = Exporter::new(layout.clone());
        assert!(exporter.export(run_date(), &[scored(0, 0.7)], &[]).is_err());
        let leftovers = fs::read_dir(&layout.output_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| {
                entry
                    .expect("entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn staging_failure_discards_partials_and_keeps_earlier_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = layout(dir.path());
        let exporter = Exporter::new(layout.clone());
        exporter
            .export(run_date(), &[scored(0, 0.9)], &[])
            .expect("first export succeeds");
        let alto = layout.output_dir.join("COLSAGEM - Score_Alto_20250115.csv");
        let first_body = fs::read_to_string(&alto).expect("read first run");

        // A directory where the consolidated file would be staged.
        let blocked = layout
            .analysis_dir
            .join("Consolidado_Analisis_20250115.csv.partial");
        fs::create_dir(&blocked).expect("create blocker");

        let error = exporter
            .export(run_date(), &[scored(0, 0.91), scored(1, 0.1)], &[])
            .expect_err("staging fails");
        assert!(matches!(error, ExportError::Write { .. }));

        assert_eq!(fs::read_to_string(&alto).expect("read alto"), first_body);
        assert_eq!(
            file_names(&layout.output_dir),
            vec!["COLSAGEM - Score_Alto_20250115.csv"]
        );
        assert_eq!(
            file_names(&layout.dialer_dir),
            vec!["COLSAGEM - Score_Alto_20250115.csv"]
        );
    }

    #[test]
    fn publish_failure_restores_earlier_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = layout(dir.path());
        let exporter = Exporter::new(layout.clone());
        exporter
            .export(run_date(), &[scored(0, 0.9)], &[])
            .expect("first export succeeds");
        let alto = layout.output_dir.join("COLSAGEM - Score_Alto_20250115.csv");
        let consolidated = layout
            .analysis_dir
            .join("Consolidado_Analisis_20250115.csv");
        let first_alto = fs::read_to_string(&alto).expect("read alto");
        let first_consolidated = fs::read_to_string(&consolidated).expect("read consolidated");

        // A non-empty directory blocks setting the consolidated file aside,
        // after both tier files were already replaced.
        let blocked = layout
            .analysis_dir
            .join("Consolidado_Analisis_20250115.csv.previous");
        fs::create_dir(&blocked).expect("create blocker");
        fs::write(blocked.join("keep"), "x").expect("fill blocker");

        let error = exporter
            .export(run_date(), &[scored(0, 0.91), scored(1, 0.1)], &[])
            .expect_err("publication fails");
        assert!(matches!(error, ExportError::SetAside { .. }));

        assert_eq!(fs::read_to_string(&alto).expect("read alto"), first_alto);
        assert_eq!(
            fs::read_to_string(&consolidated).expect("read consolidated"),
            first_consolidated
        );
        for tier_dir in [&layout.output_dir, &layout.dialer_dir] {
            assert_eq!(
                file_names(tier_dir),
                vec!["COLSAGEM - Score_Alto_20250115.csv"]
            );
        }
        assert_eq!(
            file_names(&layout.analysis_dir),
            vec![
                "Consolidado_Analisis_20250115.csv",
                "Consolidado_Analisis_20250115.csv.previous",
            ]
        );
    }

    #[test]
    fn rerun_replaces_earlier_files_without_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = layout(dir.path());
        let exporter = Exporter::new(layout.clone());
        exporter
            .export(run_date(), &[scored(0, 0.9)], &[])
            .expect("first export succeeds");
        exporter
            .export(run_date(), &[scored(0, 0.91)], &[])
            .expect("rerun succeeds");

        let alto = layout.output_dir.join("COLSAGEM - Score_Alto_20250115.csv");
        assert!(fs::read_to_string(&alto).expect("read alto").contains(",0.91,Alto"));
        assert_eq!(
            file_names(&layout.output_dir),
            vec!["COLSAGEM - Score_Alto_20250115.csv"]
        );
    }

    #[test]
    fn partial_suffix_is_appended() {
        assert_eq!(
            partial_path(Path::new("/tmp/a b.csv")),
            PathBuf::from("/tmp/a b.csv.partial")
        );
    }
}
