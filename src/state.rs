use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenAuthority;
use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: Arc<dyn TokenAuthority>,
    pub payments: Arc<dyn PaymentGateway>,
}
