//! Payment verification against a Paystack-compatible gateway.

pub mod dto;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::PaymentVerification;

#[derive(Clone, Debug)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify_transaction(&self, reference: &str) -> Result<PaymentVerification, AppError>;
}

pub fn validate_reference(reference: &str) -> Result<&str, AppError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(AppError::Validation("Reference is required.".to_string()));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '=');
    if !reference.chars().all(allowed) {
        return Err(AppError::Validation("Reference contains invalid characters.".to_string()));
    }
    Ok(reference)
}

pub struct PaystackClient {
    client: Client,
    config: PaystackConfig,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

/// Interprets a gateway reply: verified only when both the call and the
/// transaction report success.
pub fn interpret(body: dto::VerifyTransactionResponse) -> PaymentVerification {
    if body.status && body.transaction_status() == Some("success") {
        PaymentVerification {
            success: true,
            message: "Payment verified successfully".to_string(),
            data: body.data,
        }
    } else {
        PaymentVerification {
            success: false,
            message: "Payment verification failed".to_string(),
            data: None,
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn verify_transaction(&self, reference: &str) -> Result<PaymentVerification, AppError> {
        let reference = validate_reference(reference)?;
        let url = format!(
            "{}/transaction/verify/{}",
            self.config.base_url.trim_end_matches('/'),
            reference
        );

        let response = self.client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.secret_key))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Payment gateway unreachable: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Payment gateway error {}: {}", status, body)));
        }
        if status.is_client_error() {
            warn!("payment gateway rejected reference {}: {}", reference, status);
            return Ok(PaymentVerification {
                success: false,
                message: "Payment verification failed".to_string(),
                data: None,
            });
        }

        let body = response
            .json::<dto::VerifyTransactionResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse gateway response: {}", e)))?;

        let verification = interpret(body);
        info!("payment reference {} verified: {}", reference, verification.success);
        Ok(verification)
    }
}

/// Used when no gateway secret is configured.
pub struct UnconfiguredPaymentGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredPaymentGateway {
    async fn verify_transaction(&self, _reference: &str) -> Result<PaymentVerification, AppError> {
        Err(AppError::Unavailable("Payment verification is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> dto::VerifyTransactionResponse {
        serde_json::from_value(json).expect("parse gateway response")
    }

    #[test]
    fn test_successful_transaction() {
        let verification = interpret(response(serde_json::json!({
            "status": true,
            "message": "Verification successful",
            "data": { "status": "success", "reference": "ref_1", "amount": 5000 }
        })));
        assert!(verification.success);
        assert_eq!(verification.data.unwrap()["amount"], 5000);
    }

    #[test]
    fn test_abandoned_transaction_fails() {
        let verification = interpret(response(serde_json::json!({
            "status": true,
            "message": "Verification successful",
            "data": { "status": "abandoned" }
        })));
        assert!(!verification.success);
        assert!(verification.data.is_none());
    }

    #[test]
    fn test_reference_validation() {
        assert_eq!(validate_reference("  T123_abc-4 ").unwrap(), "T123_abc-4");
        assert!(validate_reference("").is_err());
        assert!(validate_reference("../admin").is_err());
    }
}
