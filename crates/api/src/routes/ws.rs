//! # WebSocket 桥接
//!
//! 与 REST 接口共享同一个 `AccountService`，适合需要长连接批量下发指令的调用方。
//!
//! 请求帧: `{"id": <任意 JSON>, "token": "...", "op": "deposit", "params": {...}}`
//! 响应帧: `{"id": <原样回显>, "ok": true|false, "result": {code, message, ...}}`
//!
//! 每个文本帧独立处理，单帧解析失败不会断开连接。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use mtgate_core::account::entity::Login;
use mtgate_core::common::OperationResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::metrics::observe;
use crate::server::AppState;
use crate::types::{
    AckResponse, AddUserResponse, CreateUserRequest, FundsBody, FundsResponse,
    ResetPasswordRequest, UpdateUserRequest, UserInfoResponse,
};

/// WebSocket 请求帧
#[derive(Debug, Deserialize)]
pub struct WsRequest {
    #[serde(default)]
    pub id: Option<Value>,
    pub token: String,
    pub op: String,
    #[serde(default)]
    pub params: Value,
}

/// WebSocket 响应帧
#[derive(Debug, Serialize, Deserialize)]
pub struct WsReply {
    pub id: Option<Value>,
    pub ok: bool,
    pub result: Value,
}

#[derive(Deserialize)]
struct LoginParams {
    login: i32,
}

#[derive(Deserialize)]
struct UpdateParams {
    login: i32,
    #[serde(flatten)]
    user: UpdateUserRequest,
}

#[derive(Deserialize)]
struct ResetParams {
    login: i32,
    #[serde(flatten)]
    secrets: ResetPasswordRequest,
}

#[derive(Deserialize)]
struct FundsParams {
    login: i32,
    #[serde(flatten)]
    body: FundsBody,
}

/// 升级为 WebSocket 连接
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("websocket client connected");
    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "websocket receive failed");
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let reply = dispatch_frame(&state, text.as_str()).await;
                let frame = match serde_json::to_string(&reply) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "failed to encode websocket reply");
                        continue;
                    }
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    info!("websocket client disconnected");
}

/// 解析并执行单个请求帧
pub async fn dispatch_frame(state: &AppState, frame: &str) -> WsReply {
    let req: WsRequest = match serde_json::from_str(frame) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "malformed websocket frame");
            return failure(None, format!("malformed frame: {e}"));
        }
    };

    let id = req.id.clone();
    match dispatch(state, req).await {
        Ok(reply) => reply,
        Err(message) => failure(id, message),
    }
}

async fn dispatch(state: &AppState, req: WsRequest) -> Result<WsReply, String> {
    let accounts = &state.accounts;
    let token = req.token.as_str();
    let id = req.id;

    let reply = match req.op.as_str() {
        "add_account" => {
            let p: CreateUserRequest = params(req.params)?;
            let r = observe("add_account", accounts.add_account(token, p.into())).await;
            respond::<_, AddUserResponse>(id, r)
        }
        "get_account_info" => {
            let p: LoginParams = params(req.params)?;
            let r = observe(
                "get_account_info",
                accounts.get_account_info(token, Login(p.login)),
            )
            .await;
            respond::<_, UserInfoResponse>(id, r)
        }
        "update_account" => {
            let p: UpdateParams = params(req.params)?;
            let r = observe(
                "update_account",
                accounts.update_account(token, p.user.into_update(p.login)),
            )
            .await;
            respond::<_, AckResponse>(id, r)
        }
        "delete_account" => {
            let p: LoginParams = params(req.params)?;
            let r = observe("delete_account", accounts.delete_account(token, Login(p.login))).await;
            respond::<_, AckResponse>(id, r)
        }
        "reset_password" => {
            let p: ResetParams = params(req.params)?;
            let r = observe(
                "reset_password",
                accounts.reset_password(token, p.secrets.into_reset(p.login)),
            )
            .await;
            respond::<_, AckResponse>(id, r)
        }
        "deposit" => {
            let p: FundsParams = params(req.params)?;
            let r = observe("deposit", accounts.deposit(token, p.body.into_request(p.login))).await;
            respond::<_, FundsResponse>(id, r)
        }
        "withdraw" => {
            let p: FundsParams = params(req.params)?;
            let r = observe("withdraw", accounts.withdraw(token, p.body.into_request(p.login))).await;
            respond::<_, FundsResponse>(id, r)
        }
        other => return Err(format!("unknown op: {other}")),
    };
    Ok(reply)
}

fn params<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid params: {e}"))
}

fn respond<T, R>(id: Option<Value>, result: OperationResult<T>) -> WsReply
where
    R: From<OperationResult<T>> + Serialize,
{
    let ok = result.is_success();
    match serde_json::to_value(R::from(result)) {
        Ok(result) => WsReply { id, ok, result },
        Err(e) => failure(id, format!("failed to encode result: {e}")),
    }
}

fn failure(id: Option<Value>, message: String) -> WsReply {
    let result = serde_json::json!({ "code": 0, "message": message });
    WsReply {
        id,
        ok: false,
        result,
    }
}
