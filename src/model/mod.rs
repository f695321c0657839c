//! Frozen scoring model and its schema contract, loaded as a matched pair.
use std::sync::Arc;

use tracing::{info, warn};

pub mod artifacts;
pub mod contract;
pub mod logistic;

pub use artifacts::{ArtifactError, ArtifactStore, FileArtifactStore};
pub use contract::{SchemaContract, SchemaMismatchError, fingerprint_columns, indicator_name};
pub use logistic::{ConversionModel, LogisticModel, ModelError};

use crate::error::RunError;

/// Loads both artifacts and rejects pairs that cannot come from the same
/// fitting run.
///
/// # Errors
/// Returns [`RunError::Artifact`] if the model is unreadable and
/// [`RunError::Schema`] if the columns are unusable or the pair does not match.
pub fn load_matched_pair(
    store: &dyn ArtifactStore,
) -> Result<(Arc<dyn ConversionModel>, SchemaContract), RunError> {
    let model = store.load_model()?;
    let contract = store.load_columns()?;
    check_pairing(model.as_ref(), &contract)?;
    info!(
        columns = contract.len(),
        training_run = contract.training_run().unwrap_or("unknown"),
        fingerprint = %format!("{:016x}", contract.fingerprint()),
        "model artifacts loaded"
    );
    Ok((model, contract))
}

/// # Errors
/// Returns the first [`SchemaMismatchError`] found between model and contract.
pub fn check_pairing(
    model: &dyn ConversionModel,
    contract: &SchemaContract,
) -> Result<(), SchemaMismatchError> {
    match (model.training_run(), contract.training_run()) {
        (Some(model_run), Some(columns_run)) if model_run != columns_run => {
            return Err(SchemaMismatchError::TrainingRunMismatch {
                model: model_run.to_string(),
                columns: columns_run.to_string(),
            });
        }
        (Some(_), Some(_)) => {}
        _ => warn!("model artifacts carry no training run id; pairing checked by shape only"),
    }

    if model.input_width() != contract.len() {
        return Err(SchemaMismatchError::WidthMismatch {
            model: model.input_width(),
            columns: contract.len(),
        });
    }

    if let Some(model_fingerprint) = model.column_fingerprint() {
        let contract_fingerprint = contract.fingerprint();
        if model_fingerprint != contract_fingerprint {
            return Err(SchemaMismatchError::FingerprintMismatch {
                model: model_fingerprint,
                columns: contract_fingerprint,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(columns: &[&str]) -> SchemaContract {
        SchemaContract::new(columns.iter().map(|c| (*c).to_string()).collect())
            .expect("contract")
    }

    #[test]
    fn matching_pair_passes() {
        let columns = contract(&["mes", "dia_semana"]).with_training_run("r1");
        let model = LogisticModel::new(0.0, vec![0.1, 0.2])
            .with_training_run("r1")
            .with_columns(columns.columns());
        assert!(check_pairing(&model, &columns).is_ok());
    }

    #[test]
    fn different_runs_are_rejected() {
        let columns = contract(&["mes"]).with_training_run("r2");
        let model = LogisticModel::new(0.0, vec![0.1]).with_training_run("r1");
        assert!(matches!(
            check_pairing(&model, &columns),
            Err(SchemaMismatchError::TrainingRunMismatch { .. })
        ));
    }

    #[test]
    fn width_is_checked_without_run_ids() {
        let columns = contract(&["mes", "dia_semana"]);
        let model = LogisticModel::new(0.0, vec![0.1]);
        assert!(matches!(
            check_pairing(&model, &columns),
            Err(SchemaMismatchError::WidthMismatch {
                model: 1,
                columns: 2
            })
        ));
    }

    #[test]
    fn reordered_columns_change_the_fingerprint() {
        let columns = contract(&["mes", "dia_semana"]);
        let fitted_on = vec!["dia_semana".to_string(), "mes".to_string()];
        let model = LogisticModel::new(0.0, vec![0.1, 0.2]).with_columns(&fitted_on);
        assert!(matches!(
            check_pairing(&model, &columns),
            Err(SchemaMismatchError::FingerprintMismatch { .. })
        ));
    }
}
