use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{Actor, UserRole};
use crate::perf::PerfGuard;

// ==========================================
// 公共工具：错误映射、操作人提取、阻塞任务执行
// ==========================================

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息（当前语言）
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// HTTP 错误包装
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        HttpError(err)
    }
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;

        if err.is_system_error() {
            tracing::error!(code = err.error_code(), error = %err, "请求处理失败");
        } else {
            tracing::debug!(code = err.error_code(), error = %err, "请求被拒绝");
        }

        let details = match &err {
            ApiError::UnknownField { field } => Some(serde_json::json!({ "field": field })),
            ApiError::InvalidOperator {
                field,
                operator,
                value_type,
            } => Some(serde_json::json!({
                "field": field,
                "operator": operator,
                "value_type": value_type,
            })),
            ApiError::MalformedRuleTree { path, .. } => Some(serde_json::json!({ "path": path })),
            _ => None,
        };

        let body = ErrorResponse {
            code: err.error_code().to_string(),
            message: err.localized_message(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

// ==========================================
// CurrentActor - 当前操作人
// ==========================================
/// 从 x-user-id / x-user-role 头提取操作人；缺少 x-user-id 返回 401
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_ID_HEADER).ok_or(HttpError(ApiError::Unauthorized))?;
        let role = header(USER_ROLE_HEADER)
            .map(UserRole::parse)
            .unwrap_or(UserRole::User);
        Ok(CurrentActor(Actor::new(user_id, role)))
    }
}

// ==========================================
// ApiJson - JSON 请求体
// ==========================================
/// 与 `Json` 相同，但解析失败时返回统一的 ErrorResponse（422 INVALID_INPUT）
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(HttpError::from(rejection)),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError(ApiError::InvalidInput(rejection.body_text()))
    }
}

/// 查询字符串参数，解析失败同样映射为 INVALID_INPUT
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(HttpError::from(rejection)),
        }
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        HttpError(ApiError::InvalidInput(rejection.body_text()))
    }
}

/// 在阻塞线程池中执行数据库操作（带性能统计）
pub(super) async fn run_blocking<T, F>(op: &'static str, f: F) -> Result<T, HttpError>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _perf = PerfGuard::new(op);
        f()
    })
    .await
    .map_err(|e| HttpError(ApiError::InternalError(format!("任务执行失败: {}", e))))?
    .map_err(HttpError::from)
}
