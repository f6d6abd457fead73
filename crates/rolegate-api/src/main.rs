//! Rolegate API 서버.
//!
//! 설정을 로드하고 Axum 기반 REST API 서버를 시작합니다.
//! 서명 비밀 키나 알고리즘 설정이 없으면 트래픽을 받기 전에 종료합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{extract::State, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use rolegate_api::metrics::setup_metrics_recorder;
use rolegate_api::middleware::metrics_layer;
use rolegate_api::openapi::{openapi_router, ApiDoc};
use rolegate_api::routes::create_api_router;
use rolegate_api::state::AppState;
use rolegate_core::{init_logging, AppConfig};

/// 요청 전체 처리 시간 상한.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 허용 origin 목록 파싱. 잘못된 항목은 건너뜁니다.
fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// CORS 레이어.
///
/// `CORS_ORIGINS`(쉼표 구분)가 비어 있거나 유효한 항목이 없으면 모든 origin을 허용합니다.
/// 브라우저 클라이언트는 `Authorization` 헤더를 보내야 하므로 해당 헤더를 허용합니다.
fn cors_layer(configured: Option<&str>) -> CorsLayer {
    let origins = configured.map(parse_origins).unwrap_or_default();

    let allow_origin = if origins.is_empty() {
        warn!("No CORS origins configured, any origin is allowed");
        AllowOrigin::any()
    } else {
        info!(count = origins.len(), "CORS restricted to configured origins");
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::WWW_AUTHENTICATE])
        .max_age(Duration::from_secs(600))
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors_origins = std::env::var("CORS_ORIGINS").ok();

    Router::new()
        .route("/metrics", get(render_metrics).with_state(metrics_handle))
        .merge(create_api_router().with_state(state))
        .merge(openapi_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors_layer(cors_origins.as_deref()))
}

/// `--export-openapi` 또는 `EXPORT_OPENAPI=1|true`이면 문서를 stdout에 출력합니다.
fn export_openapi_requested() -> bool {
    std::env::args().skip(1).any(|arg| arg == "--export-openapi")
        || matches!(
            std::env::var("EXPORT_OPENAPI").as_deref(),
            Ok("1") | Ok("true")
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    if export_openapi_requested() {
        use utoipa::OpenApi as _;
        println!("{}", serde_json::to_string_pretty(&ApiDoc::openapi())?);
        return Ok(());
    }

    let config = AppConfig::load_default().context("Failed to load configuration")?;
    init_logging(&config.logging).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Rolegate API server...");

    // 서명 키/알고리즘이 없으면 여기서 종료
    let settings = config.auth.settings().map_err(|e| {
        error!(error = %e, "Refusing to start without a valid signing configuration");
        anyhow!(e)
    })?;
    info!(
        algorithm = ?settings.algorithm(),
        token_ttl_secs = settings.token_ttl().num_seconds(),
        users_file = %settings.users_file().display(),
        "Authentication configured"
    );

    let addr = config.server.socket_addr().with_context(|| {
        format!(
            "Invalid listen address {}:{} (ROLEGATE__SERVER__HOST, ROLEGATE__SERVER__PORT)",
            config.server.host, config.server.port
        )
    })?;

    let metrics_handle = setup_metrics_recorder().context("Failed to install metrics recorder")?;

    let state = Arc::new(AppState::from_settings(&settings));
    match state.store().count().await {
        Ok(0) => warn!("User file has no users; every login will fail"),
        Ok(count) => info!(users = count, "User store loaded"),
        Err(e) => warn!(error = %e, "User store is not readable; logins will fail"),
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, version = %state.version, "Rolegate API listening");

    axum::serve(listener, create_router(state, metrics_handle))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Rolegate API stopped");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 수신 시 반환합니다.
///
/// 시그널 핸들러 설치에 실패하면 해당 시그널은 기다리지 않습니다.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        "interrupt"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
        "terminate"
    };

    #[cfg(not(unix))]
    let terminate = async {
        std::future::pending::<()>().await;
        "terminate"
    };

    let received = tokio::select! {
        signal = interrupt => signal,
        signal = terminate => signal,
    };
    warn!(signal = received, "Shutdown requested, draining connections");
}
