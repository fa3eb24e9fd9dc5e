//! Complaints book endpoint

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::complaint::{ComplaintReceipt, CreateComplaint},
    AppState,
};

/// Register a consumer complaint
#[utoipa::path(
    post,
    path = "/complaints",
    tag = "complaints",
    request_body = CreateComplaint,
    responses(
        (status = 201, description = "Complaint registered", body = ComplaintReceipt),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_complaint(
    State(state): State<AppState>,
    Json(data): Json<CreateComplaint>,
) -> AppResult<(StatusCode, Json<ComplaintReceipt>)> {
    data.validate()?;
    let receipt = state.services.complaints.submit(&data).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
