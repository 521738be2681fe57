use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::common::{run_blocking, ApiJson, CurrentActor, HttpError};
use crate::api::{QueryPage, QueryRequest};
use crate::app::state::AppState;
use crate::domain::rule_set::{RuleSet, RuleSetDraft};

// ==========================================
// 规则集 CRUD
// ==========================================

pub(super) async fn list_rule_sets(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<RuleSet>>, HttpError> {
    let api = state.rule_set_api.clone();
    let list = run_blocking("http.list_rule_sets", move || api.list(&actor)).await?;
    Ok(Json(list))
}

pub(super) async fn create_rule_set(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ApiJson(draft): ApiJson<RuleSetDraft>,
) -> Result<(StatusCode, Json<RuleSet>), HttpError> {
    let api = state.rule_set_api.clone();
    let created = run_blocking("http.create_rule_set", move || api.create(&actor, draft)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn get_rule_set(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<RuleSet>, HttpError> {
    let api = state.rule_set_api.clone();
    let rule_set = run_blocking("http.get_rule_set", move || api.get(&actor, &id)).await?;
    Ok(Json(rule_set))
}

pub(super) async fn update_rule_set(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<RuleSetDraft>,
) -> Result<Json<RuleSet>, HttpError> {
    let api = state.rule_set_api.clone();
    let updated =
        run_blocking("http.update_rule_set", move || api.update(&actor, &id, draft)).await?;
    Ok(Json(updated))
}

pub(super) async fn delete_rule_set(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let api = state.rule_set_api.clone();
    run_blocking("http.delete_rule_set", move || api.delete(&actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==========================================
// 执行已保存的规则集
// ==========================================

pub(super) async fn query_rule_set(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<QueryRequest>,
) -> Result<Json<QueryPage>, HttpError> {
    let api = state.query_api.clone();
    let page = run_blocking("http.query_rule_set", move || {
        api.execute_rule_set(&actor, &id, &request)
    })
    .await?;
    Ok(Json(page))
}
