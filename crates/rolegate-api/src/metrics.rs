//! Prometheus 메트릭.
//!
//! `/metrics`로 노출되는 항목:
//!
//! | 이름 | 라벨 |
//! |------|------|
//! | `rolegate_http_requests_total` | method, path, status |
//! | `rolegate_http_request_duration_seconds` | method, path |
//! | `rolegate_auth_login_total` | outcome |
//! | `rolegate_auth_rejections_total` | reason |
//! | `rolegate_auth_forbidden_total` | operation |

use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const HTTP_REQUESTS: &str = "rolegate_http_requests_total";
const HTTP_DURATION: &str = "rolegate_http_request_duration_seconds";

/// 처리 시간 버킷 (초). 로그인은 비밀번호 해시 검증 때문에 수백 ms까지 걸립니다.
const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// 전역 레코더를 설치하고 렌더링 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(HTTP_DURATION.to_string()), DURATION_BUCKETS)?
        .install_recorder()
}

/// 완료된 HTTP 요청 하나를 기록합니다.
pub fn record_http(method: &str, path: &'static str, status: u16, elapsed: Duration) {
    counter!(
        HTTP_REQUESTS,
        "method" => method.to_string(),
        "path" => path,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(HTTP_DURATION, "method" => method.to_string(), "path" => path)
        .record(elapsed.as_secs_f64());
}

/// 로그인 시도 결과 (success, invalid_credentials, error).
pub fn record_login(outcome: &'static str) {
    counter!("rolegate_auth_login_total", "outcome" => outcome).increment(1);
}

/// 토큰 거부 사유. 응답은 같아도 사유는 구분해서 집계합니다.
pub fn record_rejection(reason: &'static str) {
    counter!("rolegate_auth_rejections_total", "reason" => reason).increment(1);
}

/// 역할 불일치로 거부된 작업.
pub fn record_forbidden(operation: &'static str) {
    counter!("rolegate_auth_forbidden_total", "operation" => operation).increment(1);
}

/// 경로 라벨. 알려지지 않은 경로는 `other` 하나로 묶어 카디널리티를 제한합니다.
pub fn normalize_path(path: &str) -> &'static str {
    match path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path) {
        "/token" => "/token",
        "/api/data" => "/api/data",
        "/health" => "/health",
        "/health/ready" => "/health/ready",
        "/metrics" => "/metrics",
        "/api-docs/openapi.json" => "/api-docs/openapi.json",
        _ => "other",
    }
}
