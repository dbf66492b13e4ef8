//! # API 响应结构
//!
//! 标准 JSON 响应格式：`{success, data, message, timestamp}` 或
//! `{success: false, error: {code, message}, timestamp}`。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ErrorCategory};
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, lwarn};

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    Created(T),
    SuccessWithMessage(T, String),
    AppError(BridgeError),
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => ok_body(StatusCode::OK, data, "操作成功"),
            Self::Created(data) => ok_body(StatusCode::CREATED, data, "创建成功"),
            Self::SuccessWithMessage(data, message) => ok_body(StatusCode::OK, data, &message),
            Self::AppError(error) => {
                let (status, code) = error.to_http_response_parts();
                if error.category() == ErrorCategory::Server {
                    lerror!("api", LogStage::Error, LogComponent::Management, "request_failed", &error.to_string(), code = code);
                } else {
                    lwarn!("api", LogStage::Error, LogComponent::Management, "request_rejected", &error.to_string(), code = code);
                }

                let error_response = ErrorResponse {
                    success: false,
                    error: ErrorInfo {
                        code: code.to_string(),
                        message: error.public_message(),
                    },
                    timestamp: Utc::now(),
                };
                (status, Json(error_response)).into_response()
            }
        }
    }
}

fn ok_body<T: Serialize>(status: StatusCode, data: T, message: &str) -> Response {
    (
        status,
        Json(SuccessResponse {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：创建成功响应
pub fn created<T: Serialize>(data: T) -> Response {
    ApiResponse::Created(data).into_response()
}

/// # 便捷函数：带消息的成功响应
pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::SuccessWithMessage(data, message.to_string()).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: BridgeError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        app_error(self)
    }
}
