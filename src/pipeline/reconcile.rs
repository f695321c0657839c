//! Alignment of derived features with the frozen expected-column list.
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::features::FeatureRow;
use crate::model::{SchemaContract, indicator_name};

/// Dense feature matrix whose columns are exactly the contract's columns,
/// in contract order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    row_ids: Vec<usize>,
    values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Source row index of every matrix row.
    #[must_use]
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of `column` in matrix row `row`.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let position = self.columns.iter().position(|name| name == column)?;
        self.values.get(row).and_then(|values| values.get(position)).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub matrix: FeatureMatrix,
    /// Observed columns the contract does not know, excluding dropped
    /// reference categories.
    pub unexpected_columns: BTreeSet<String>,
}

/// Expands categorical features into indicators and aligns them to
/// `contract`. Expected columns never observed stay zero; observed columns
/// outside the contract are dropped and reported.
#[must_use]
pub fn reconcile<'a>(
    rows: impl IntoIterator<Item = &'a FeatureRow>,
    contract: &SchemaContract,
) -> Reconciliation {
    let positions: HashMap<&str, usize> = contract
        .columns()
        .iter()
        .enumerate()
        .map(|(position, name)| (name.as_str(), position))
        .collect();
    let width = contract.len();

    let mut row_ids = Vec::new();
    let mut values = Vec::new();
    let mut unexpected_columns = BTreeSet::new();

    for row in rows {
        let mut cells = vec![0.0; width];

        for (feature, value) in row.numeric() {
            match positions.get(feature) {
                Some(&position) => cells[position] = value,
                None => {
                    unexpected_columns.insert(feature.to_string());
                }
            }
        }

        for (feature, value) in row.categorical() {
            let Some(value) = value else {
                continue;
            };
            let column = indicator_name(feature, value);
            if let Some(&position) = positions.get(column.as_str()) {
                cells[position] = 1.0;
            } else if contract.reference_category(feature) != Some(value) {
                unexpected_columns.insert(column);
            }
        }

        row_ids.push(row.row_index);
        values.push(cells);
    }

    Reconciliation {
        matrix: FeatureMatrix {
            columns: contract.columns().to_vec(),
            row_ids,
            values,
        },
        unexpected_columns,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::taxonomy::CategoryLabels;

    fn labels(job_title: &'static str) -> CategoryLabels {
        CategoryLabels {
            company: "otras",
            job_title,
            requirement: "sin_especificar",
            interview_slot: "manana",
            documentation: "basica",
            vacancy_bucket: "1-100",
        }
    }

    fn row(row_index: usize, job_title: &'static str) -> FeatureRow {
        FeatureRow {
            row_index,
            labels: labels(job_title),
            management_type: Some("Masiva".to_string()),
            has_company_contact: 1,
            weekday: 2,
            month: 7,
            is_weekend: 0,
        }
    }

    fn contract() -> SchemaContract {
        SchemaContract::new(
            [
                "mes",
                "categoria_cargo_cajero",
                "tipo_de_gestion_Masiva",
                "categoria_cargo_tecnico",
                "dia_semana",
                "tiene_contacto_empresa",
                "es_fin_semana",
            ]
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
        )
        .expect("contract")
    }

    #[test]
    fn columns_follow_the_contract_exactly() {
        let contract = contract();
        let rows = [row(4, "cajero"), row(9, "tecnico")];
        let result = reconcile(&rows, &contract);

        assert_eq!(result.matrix.columns(), contract.columns());
        assert_eq!(result.matrix.row_ids(), &[4, 9]);
        assert_eq!(result.matrix.rows()[0], vec![7.0, 1.0, 1.0, 0.0, 2.0, 1.0, 0.0]);
        assert_eq!(result.matrix.value(1, "categoria_cargo_tecnico"), Some(1.0));
        assert_eq!(result.matrix.value(1, "categoria_cargo_cajero"), Some(0.0));
    }

    #[test]
    fn unknown_indicators_are_dropped_and_reported() {
        let contract = contract();
        let result = reconcile(&[row(0, "seguridad")], &contract);
        assert!(result.unexpected_columns.contains("categoria_cargo_seguridad"));
        assert!(result.unexpected_columns.contains("categoria_empresa_otras"));
        assert_eq!(result.matrix.rows()[0].len(), contract.len());
    }

    #[test]
    fn reference_categories_are_not_reported() {
        let contract = contract()
            .with_reference_categories(BTreeMap::from([(
                "categoria_empresa".to_string(),
                "otras".to_string(),
            )]))
            .expect("references");
        let result = reconcile(&[row(0, "cajero")], &contract);
        assert!(!result.unexpected_columns.contains("categoria_empresa_otras"));
    }

    #[test]
    fn reconciling_twice_is_identical() {
        let contract = contract();
        let rows = [row(0, "tecnico"), row(1, "cajero"), row(2, "otros")];
        assert_eq!(reconcile(&rows, &contract), reconcile(&rows, &contract));
    }
}
