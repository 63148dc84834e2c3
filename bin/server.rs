// Ledger Reconcile - Web Server
// REST API with Axum: post records, get matches back

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use ledger_reconcile::{
    render_report, BankRecord, EngineConfig, LedgerRecord, ReconConfig, ReconciliationEngine,
    ReconciliationOutcome, SynonymPolicy, SynonymRule, SynonymTable,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<ReconciliationEngine>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

/// One reconciliation job
///
/// Engine settings and synonym groups are optional; without them the
/// server-wide engine is used.
#[derive(Debug, Deserialize)]
struct ReconcileRequest {
    bank: Vec<BankRecord>,
    ledger: Vec<LedgerRecord>,
    #[serde(default)]
    engine: Option<EngineConfig>,
    #[serde(default)]
    synonyms: Vec<SynonymRule>,
    #[serde(default)]
    synonym_policy: SynonymPolicy,
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    run_id: Uuid,
    report: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("OK"))
}

/// Run one job on the blocking pool; the records belong to this job alone
async fn run_job(state: &AppState, request: ReconcileRequest) -> Result<ReconciliationOutcome, String> {
    let ReconcileRequest {
        bank,
        ledger,
        engine,
        synonyms,
        synonym_policy,
    } = request;

    let engine = if engine.is_none() && synonyms.is_empty() {
        Arc::clone(&state.engine)
    } else {
        let config = engine.unwrap_or_else(|| state.engine.config().clone());
        let mut table = state.engine.normalizer().synonyms().clone();
        table.merge(synonyms, synonym_policy);
        Arc::new(ReconciliationEngine::with_synonyms(config, table))
    };

    tokio::task::spawn_blocking(move || engine.reconcile(bank, ledger))
        .await
        .map_err(|e| {
            error!("Reconciliation job failed: {}", e);
            "reconciliation job failed".to_string()
        })
}

/// POST /api/reconcile - Records in, outcome out
async fn reconcile(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> ApiResult<ReconciliationOutcome> {
    match run_job(&state, request).await {
        Ok(outcome) => (StatusCode::OK, Json(ApiResponse::ok(outcome))),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::err(e))),
    }
}

/// POST /api/report - Records in, text report out
async fn report(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> ApiResult<ReportResponse> {
    match run_job(&state, request).await {
        Ok(outcome) => {
            let response = ReportResponse {
                run_id: outcome.run_id,
                report: render_report(&outcome),
            };
            (StatusCode::OK, Json(ApiResponse::ok(response)))
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::err(e))),
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/reconcile", post(reconcile))
        .route("/report", post(report))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Engine from `RECON_CONFIG` (JSON file) or the defaults
fn build_engine() -> anyhow::Result<ReconciliationEngine> {
    let config = match std::env::var("RECON_CONFIG") {
        Ok(path) => ReconConfig::from_file(&path).with_context(|| format!("Failed to load config: {}", path))?,
        Err(_) => ReconConfig::default(),
    };

    let synonyms: SynonymTable = config
        .synonyms
        .build_table()
        .context("Failed to load vendor synonyms")?;

    Ok(ReconciliationEngine::with_synonyms(config.engine, synonyms))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState {
        engine: Arc::new(build_engine()?),
    };

    let addr = std::env::var("RECON_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "Server running");
    info!("API: POST http://{}/api/reconcile", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_state() -> AppState {
        AppState {
            engine: Arc::new(ReconciliationEngine::new()),
        }
    }

    fn create_test_request(extra: &str) -> ReconcileRequest {
        let body = format!(
            r#"{{
                "bank": [
                    {{"date": "2025-01-15", "category": "Deposit", "vendor": "CLIENT", "description": "", "amount": "5000.00"}},
                    {{"date": "2025-01-16", "category": "Withdrawal", "vendor": "BRIGHT CLEANING", "description": "", "amount": "-80.00"}}
                ],
                "ledger": [
                    {{"date": "2025-01-15", "ledger_type": "Deposit", "debit": "5000.00", "credit": "0", "amount": "5000.00"}},
                    {{"date": "2025-01-16", "ledger_type": "Check", "name": "Sparkle Co", "debit": "0", "credit": "80.00", "amount": "-80.00"}},
                    {{"date": "2025-01-16", "ledger_type": "Check", "name": "Sparkle Co", "debit": "0", "credit": "80.00", "amount": "-80.00"}}
                ]{}
            }}"#,
            extra
        );
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let Json(response) = health_check().await;
        assert!(response.success);
        assert_eq!(response.data, Some("OK"));
    }

    #[tokio::test]
    async fn test_reconcile_endpoint() {
        let (status, Json(response)) =
            reconcile(State(create_test_state()), Json(create_test_request(""))).await;

        assert_eq!(status, StatusCode::OK);
        let outcome = response.data.unwrap();
        assert_eq!(outcome.total_bank, 2);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.unmatched_ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_request_synonyms_are_per_job() {
        let extra = r#", "synonyms": [{"canonical": "SPARKLE", "fragments": ["BRIGHT CLEANING", "SPARKLE"]}]"#;
        let state = create_test_state();

        let (_, Json(response)) = reconcile(State(state.clone()), Json(create_test_request(extra))).await;
        // both ledger candidates normalize to SPARKLE; pass 6 takes the first
        assert_eq!(response.data.unwrap().matches.len(), 2);

        // the shared engine is untouched
        let (_, Json(response)) = reconcile(State(state), Json(create_test_request(""))).await;
        assert_eq!(response.data.unwrap().matches.len(), 1);
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let (status, Json(response)) =
            report(State(create_test_state()), Json(create_test_request(""))).await;

        assert_eq!(status, StatusCode::OK);
        let body = response.data.unwrap();
        assert!(body.report.contains(&body.run_id.to_string()));
        assert!(body.report.contains("Match rate:        50.0%"));
    }
}
