//! # 交易账户路由控制器
//!
//! 实现 `/api/v1/users` 路径下的 REST 接口，每个 Handler 对应一个账户用例。
//! 业务失败以统一的 `{code, message}` 响应体返回，HTTP 状态码由失败分类决定。

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mtgate_core::account::entity::Login;

use crate::error::{ApiError, reply};
use crate::metrics::observe;
use crate::middleware::token::ManagerToken;
use crate::server::AppState;
use crate::types::{
    AckResponse, AddUserResponse, CreateUserRequest, FundsBody, FundsResponse,
    ResetPasswordRequest, UpdateUserRequest, UserInfoResponse,
};

/// 开户
///
/// 在租户对应的交易服务器上新建账户，成功时返回分配的登录号。
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "开户成功", body = AddUserResponse),
        (status = 400, description = "请求体无效", body = AckResponse),
        (status = 401, description = "未知租户 Token", body = AddUserResponse),
        (status = 502, description = "交易服务器拒绝", body = AddUserResponse)
    )
)]
pub async fn add_user(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddUserResponse>), ApiError> {
    let Json(req) = payload?;
    let result = observe("add_account", state.accounts.add_account(&token, req.into())).await;
    Ok(reply(result))
}

/// 查询账户信息
#[utoipa::path(
    get,
    path = "/api/v1/users/{login}",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    responses(
        (status = 200, description = "查询成功", body = UserInfoResponse),
        (status = 401, description = "未知租户 Token", body = UserInfoResponse),
        (status = 502, description = "交易服务器拒绝", body = UserInfoResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
) -> Result<(StatusCode, Json<UserInfoResponse>), ApiError> {
    let Path(login) = login?;
    let result = observe(
        "get_account_info",
        state.accounts.get_account_info(&token, Login(login)),
    )
    .await;
    Ok(reply(result))
}

/// 修改账户资料
///
/// 空字段由交易服务器保持原值。
#[utoipa::path(
    put,
    path = "/api/v1/users/{login}",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "修改成功", body = AckResponse),
        (status = 401, description = "未知租户 Token", body = AckResponse),
        (status = 502, description = "交易服务器拒绝", body = AckResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AckResponse>), ApiError> {
    let Path(login) = login?;
    let Json(req) = payload?;
    let result = observe(
        "update_account",
        state.accounts.update_account(&token, req.into_update(login)),
    )
    .await;
    Ok(reply(result))
}

/// 删除账户
#[utoipa::path(
    delete,
    path = "/api/v1/users/{login}",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    responses(
        (status = 200, description = "删除成功", body = AckResponse),
        (status = 401, description = "未知租户 Token", body = AckResponse),
        (status = 502, description = "交易服务器拒绝", body = AckResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
) -> Result<(StatusCode, Json<AckResponse>), ApiError> {
    let Path(login) = login?;
    let result = observe(
        "delete_account",
        state.accounts.delete_account(&token, Login(login)),
    )
    .await;
    Ok(reply(result))
}

/// 重置密码
///
/// 主密码非空时重置主密码，否则重置投资者密码；两者皆空返回 400。
#[utoipa::path(
    post,
    path = "/api/v1/users/{login}/password",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "重置成功", body = AckResponse),
        (status = 400, description = "未提供新密码", body = AckResponse),
        (status = 401, description = "未知租户 Token", body = AckResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AckResponse>), ApiError> {
    let Path(login) = login?;
    let Json(req) = payload?;
    let result = observe(
        "reset_password",
        state.accounts.reset_password(&token, req.into_reset(login)),
    )
    .await;
    Ok(reply(result))
}

/// 入金
#[utoipa::path(
    post,
    path = "/api/v1/users/{login}/deposit",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    request_body = FundsBody,
    responses(
        (status = 200, description = "入金成功，回显最新余额", body = FundsResponse),
        (status = 401, description = "未知租户 Token", body = FundsResponse),
        (status = 502, description = "交易服务器拒绝", body = FundsResponse)
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
    payload: Result<Json<FundsBody>, JsonRejection>,
) -> Result<(StatusCode, Json<FundsResponse>), ApiError> {
    let Path(login) = login?;
    let Json(req) = payload?;
    let result = observe(
        "deposit",
        state.accounts.deposit(&token, req.into_request(login)),
    )
    .await;
    Ok(reply(result))
}

/// 出金
///
/// 金额超过可用保证金时返回 422，并回显当前余额。
#[utoipa::path(
    post,
    path = "/api/v1/users/{login}/withdraw",
    tag = "账户 (User)",
    security(("manager_token" = [])),
    params(("login" = i32, Path, description = "账户登录号")),
    request_body = FundsBody,
    responses(
        (status = 200, description = "出金成功，回显最新余额", body = FundsResponse),
        (status = 401, description = "未知租户 Token", body = FundsResponse),
        (status = 422, description = "可用保证金不足", body = FundsResponse),
        (status = 502, description = "交易服务器拒绝", body = FundsResponse)
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    ManagerToken(token): ManagerToken,
    login: Result<Path<i32>, PathRejection>,
    payload: Result<Json<FundsBody>, JsonRejection>,
) -> Result<(StatusCode, Json<FundsResponse>), ApiError> {
    let Path(login) = login?;
    let Json(req) = payload?;
    let result = observe(
        "withdraw",
        state.accounts.withdraw(&token, req.into_request(login)),
    )
    .await;
    Ok(reply(result))
}

/// 未匹配路由的兜底响应
pub async fn fallback() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(AckResponse::failure("route not found")),
    )
        .into_response()
}
