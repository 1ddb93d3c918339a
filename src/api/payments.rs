use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::api::json::AppJson;
use crate::error::AppError;
use crate::models::{PaymentVerification, VerifyPaymentRequest};
use crate::payments::validate_reference;
use crate::state::AppState;

pub async fn verify_payment(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentVerification>), AppError> {
    let reference = validate_reference(&req.reference)?;
    let verification = state.payments.verify_transaction(reference).await?;

    let status = if verification.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(verification)))
}
