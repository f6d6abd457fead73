//! 요청 단위 HTTP 메트릭.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::metrics::{normalize_path, record_http};

/// 상태 코드별 요청 수와 처리 시간을 기록합니다.
///
/// 경로 라벨은 [`normalize_path`]로 고정된 집합에 묶입니다. 인증 실패(401/403)도
/// 핸들러 밖 추출기에서 만들어지므로 여기서 함께 집계됩니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let started = Instant::now();
    let response = next.run(request).await;

    record_http(
        method.as_str(),
        path,
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}
