use serde::Deserialize;

/// Envelope of `GET /transaction/verify/{reference}`.
#[derive(Debug, Deserialize)]
pub struct VerifyTransactionResponse {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl VerifyTransactionResponse {
    /// Status of the transaction itself, e.g. `success`, `failed`, `abandoned`.
    pub fn transaction_status(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|s| s.as_str())
    }
}
