//! 注册申请 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use feedback_core::models::RegistrationDecision;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, DeletedResponse, RegistrationOutcomeDto, RegistrationRequestDto,
        ResolveRegistrationRequest, SubmitRegistrationRequest,
    },
    error::{ApiError, Result},
    middleware::CurrentUser,
    state::AppState,
};

/// 提交注册申请（公开）
///
/// POST /api/registration-requests
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRegistrationRequest>,
) -> Result<Json<ApiResponse<RegistrationRequestDto>>> {
    req.validate()?;
    let request = state.registrations.submit(req.into()).await?;
    Ok(Json(ApiResponse::success(request.into())))
}

/// 申请列表，待审批的排在前面
///
/// GET /api/registration-requests
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RegistrationRequestDto>>>> {
    let requests = state.registrations.list().await?;
    Ok(Json(ApiResponse::success(
        requests.into_iter().map(RegistrationRequestDto::from).collect(),
    )))
}

/// GET /api/registration-requests/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RegistrationRequestDto>>> {
    let request = state.registrations.get(id).await?;
    Ok(Json(ApiResponse::success(request.into())))
}

/// 审批申请
///
/// POST /api/registration-requests/{id}/status
pub async fn resolve(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ResolveRegistrationRequest>,
) -> Result<Json<ApiResponse<RegistrationOutcomeDto>>> {
    let decision: RegistrationDecision = req.status.parse().map_err(ApiError::Validation)?;
    let outcome = state
        .registrations
        .resolve(id, decision, current.user.id)
        .await?;

    info!(
        request_id = id,
        admin_id = current.user.id,
        status = %outcome.request.status,
        "注册申请已审批"
    );
    Ok(Json(ApiResponse::success(outcome.into())))
}

/// 删除申请
///
/// DELETE /api/registration-requests/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.registrations.delete(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}
