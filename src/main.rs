use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_backend::auth::JwtAuthority;
use lms_backend::config::AppConfig;
use lms_backend::payments::{PaymentGateway, PaystackClient, PaystackConfig, UnconfiguredPaymentGateway};
use lms_backend::services::AuthService;
use lms_backend::{AppState, db, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lms_backend=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    db::migrate(&pool).await?;

    let auth = Arc::new(JwtAuthority::new(config.jwt_secret.clone(), config.token_ttl_days));

    if let Some(seed) = &config.admin_seed {
        AuthService::new(pool.clone(), auth.clone()).ensure_admin(seed).await?;
    }

    let payments: Arc<dyn PaymentGateway> = match &config.paystack_secret_key {
        Some(secret_key) => Arc::new(PaystackClient::new(PaystackConfig {
            secret_key: secret_key.clone(),
            base_url: config.paystack_base_url.clone(),
        })?),
        None => {
            warn!("PAYSTACK_SECRET_KEY not set, payment verification disabled");
            Arc::new(UnconfiguredPaymentGateway)
        }
    };

    let state = AppState {
        db: pool.clone(),
        auth,
        payments,
    };

    let app = router(state).layer(cors_layer(&config.cors_allow_origin)?);

    info!("listening on http://{}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("server stopped");
    Ok(())
}

fn cors_layer(origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Ok(if origin == "*" {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(HeaderValue::from_str(origin)?)
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
