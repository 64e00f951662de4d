//! Mapping a bulk creation response back onto the submitted chunk
//!
//! The service answers with two separate lists: error records that carry the
//! index of the failing request inside the chunk, and success records in the
//! relative order of the requests that did not fail. Reconciliation walks the
//! chunk by index and pairs each non-errored request with the next success
//! record. Any mismatch between the two lists is reported as a failure.

use std::collections::HashMap;

use log::warn;

use crate::api::{ApiBulkError, ApiCreatedAsset, ApiError, AssetToCreate, BulkCreateResponse};

use super::types::{BulkAssetError, CreatedAsset, ErrorKey};

/// Outcome of one chunk, in request order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub created: Vec<CreatedAsset>,
    pub failures: Vec<BulkAssetError>,
}

/// Pair every request of `chunk` with its error or success record
pub fn reconcile_chunk(chunk: &[AssetToCreate], response: BulkCreateResponse) -> ChunkOutcome {
    let mut outcome = ChunkOutcome::default();
    let mut errors_at: HashMap<usize, ApiBulkError> = HashMap::new();

    for error in response.errors {
        match error.object_index() {
            Some(index) if index < chunk.len() => {
                if errors_at.contains_key(&index) {
                    warn!(
                        "Duplicate error record for chunk index {} ({}); keeping the first",
                        index, chunk[index].external_id
                    );
                    continue;
                }
                errors_at.insert(index, error);
            }
            index => {
                // No usable index: the failing request cannot be identified
                outcome.failures.push(unattributed_error(error, index));
            }
        }
    }

    let mut successes = response.results.into_iter();

    for (index, request) in chunk.iter().enumerate() {
        if let Some(error) = errors_at.remove(&index) {
            outcome.failures.push(
                BulkAssetError::new(
                    error_key_of(&error),
                    error.message.unwrap_or_default(),
                    &request.name,
                    &request.external_id,
                )
                .at_index(index),
            );
            continue;
        }

        match successes.next() {
            Some(record) => match bind_success(request, &record) {
                Some(created) => outcome.created.push(created),
                None => outcome.failures.push(
                    BulkAssetError::new(
                        ErrorKey::MappingErrorOnSuccess,
                        "Success record has no asset id",
                        &request.name,
                        &request.external_id,
                    )
                    .at_index(index),
                ),
            },
            None => outcome.failures.push(
                BulkAssetError::new(
                    ErrorKey::MissingApiSuccessRecord,
                    "No success record returned for this asset",
                    &request.name,
                    &request.external_id,
                )
                .at_index(index),
            ),
        }
    }

    for surplus in successes {
        outcome.failures.push(BulkAssetError::new(
            ErrorKey::MappingErrorOnSuccess,
            format!(
                "Unmatched success record (asset id {})",
                surplus.asset_id.as_deref().unwrap_or("<none>")
            ),
            surplus.name.unwrap_or_default(),
            "",
        ));
    }

    outcome
}

/// One failure per request when the whole chunk call failed
pub fn fail_chunk(chunk: &[AssetToCreate], error: &anyhow::Error) -> Vec<BulkAssetError> {
    let key = classify_chunk_error(error);
    let message = error.to_string();

    chunk
        .iter()
        .enumerate()
        .map(|(index, request)| {
            BulkAssetError::new(key.clone(), &message, &request.name, &request.external_id)
                .at_index(index)
        })
        .collect()
}

/// Failure key for a whole-chunk error
pub fn classify_chunk_error(error: &anyhow::Error) -> ErrorKey {
    match error.downcast_ref::<ApiError>() {
        Some(ApiError::Status {
            error_key: Some(key),
            ..
        }) if !key.is_empty() => ErrorKey::Remote(key.clone()),
        Some(ApiError::Malformed(_)) => ErrorKey::ChunkProcessingError,
        _ => ErrorKey::NetworkOrServerError,
    }
}

fn bind_success(request: &AssetToCreate, record: &ApiCreatedAsset) -> Option<CreatedAsset> {
    let asset_id = record.asset_id.as_deref().filter(|id| !id.is_empty())?;
    if request.external_id.is_empty() {
        return None;
    }

    Some(CreatedAsset {
        asset_id: asset_id.to_string(),
        name: request.name.clone(),
        parent_id: request.parent_id.clone(),
        external_id: request.external_id.clone(),
    })
}

fn error_key_of(error: &ApiBulkError) -> ErrorKey {
    match error.error_key.as_deref() {
        Some(key) if !key.is_empty() => ErrorKey::from(key.to_string()),
        _ => ErrorKey::UnknownApiError,
    }
}

fn unattributed_error(error: ApiBulkError, index: Option<usize>) -> BulkAssetError {
    let key = error_key_of(&error);
    let message = error.message.unwrap_or_default();
    let failure = BulkAssetError::new(key, message, "", "");
    match index {
        Some(index) => failure.at_index(index),
        None => failure,
    }
}
