use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use futures::Stream;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

use super::common::{run_blocking, ApiJson, CurrentActor, HttpError};
use crate::api::{ApiError, ExportRequest, FieldInfo, QueryPage, QueryRequest};
use crate::app::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 下载响应每块读取的字节数
const EXPORT_CHUNK_SIZE: usize = 64 * 1024;

// ==========================================
// 健康检查 / 字段目录
// ==========================================

pub(super) async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

pub(super) async fn list_fields(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
) -> Json<Vec<FieldInfo>> {
    Json(state.query_api.list_fields())
}

// ==========================================
// 查询 / 导出
// ==========================================

pub(super) async fn query_declarations(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<QueryRequest>,
) -> Result<Json<QueryPage>, HttpError> {
    tracing::debug!(actor = %actor.user_id, "报关单查询请求");
    let api = state.query_api.clone();
    let page = run_blocking("http.query_declarations", move || api.execute(&request)).await?;
    Ok(Json(page))
}

pub(super) async fn export_declarations(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<ExportRequest>,
) -> Result<Response, HttpError> {
    let api = state.export_api.clone();
    let (temp, summary) =
        run_blocking("http.export_declarations", move || api.export_xlsx(&request)).await?;

    tracing::info!(
        actor = %actor.user_id,
        headers = summary.headers,
        batches = summary.batches,
        "报关单导出完成"
    );

    let file = temp
        .reopen()
        .map_err(|e| HttpError(ApiError::ExportFailed(format!("无法读取导出文件: {}", e))))?;
    let length = file.metadata().map(|m| m.len()).ok();
    let body = Body::from_stream(file_chunks(tokio::fs::File::from_std(file), temp));

    let filename = format!("bc20-export-{}.xlsx", Local::now().format("%Y%m%d-%H%M%S"));
    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    Ok(response)
}

/// 按块读取导出文件；流结束（或被丢弃）时临时文件随之删除
fn file_chunks(
    file: tokio::fs::File,
    temp: NamedTempFile,
) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    futures::stream::unfold(Some((file, temp)), |state| async move {
        let (mut file, temp) = match state {
            Some(state) => state,
            None => return None,
        };

        let mut buf = vec![0u8; EXPORT_CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(buf), Some((file, temp))))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}
