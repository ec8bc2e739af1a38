//! 请求体提取
//!
//! axum 自带的 `Json` 拒绝时返回纯文本 422；这里统一收敛为
//! `AppError::Validation`，让缺失字段、坏 JSON 与业务校验失败
//! 走同一个 400 `{"error": msg}` 出口。

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::extract::rejection::JsonRejection;

use crate::utils::AppError;

/// JSON 请求体提取器，拒绝映射为 400 验证错误
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation(rejection.body_text())),
        }
    }
}
