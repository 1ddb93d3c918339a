use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerification {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
