use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::job::JobMatch;
use crate::state::AppState;
use crate::upload::storage::check_reference_data;
use crate::upload::validation;

/// POST /upload
///
/// The whole pipeline for one request: validate the multipart payload,
/// verify the reference-data precondition, persist the upload, run the
/// scoring worker, release the file, map the outcome. The release sits on
/// the single path that follows outcome resolution, so it runs exactly
/// once per stored file no matter which branch the outcome took,
/// including a launch failure.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<JobMatch>>, AppError> {
    let upload = validation::extract_resume(
        &mut multipart,
        &state.config.allowed_content_type,
        state.config.max_upload_bytes,
    )
    .await?;

    // Operator precondition, checked before anything is stored or spawned.
    check_reference_data(&state.config.data_dir)?;

    info!(
        original_name = %upload.original_name,
        bytes = upload.data.len(),
        "processing resume"
    );

    let stored = state
        .store
        .store(&upload.data, &upload.original_name)
        .await?;

    let outcome = state.invoker.invoke(&stored).await;

    state.store.release(&stored).await;

    outcome.into_result().map(Json)
}
