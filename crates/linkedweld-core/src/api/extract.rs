//! Request extractors and the response envelope

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// JSON body whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// JSON body that may be left out entirely.
///
/// An empty body yields `None`; anything else must parse, so a malformed
/// body is rejected instead of being treated as absent.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| Error::validation(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes)?;
        Ok(Self(Some(value)))
    }
}

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true for this envelope
    pub success: bool,
    /// Response payload
    pub data: T,
}

/// Handler result: enveloped JSON or an error
pub type ApiResult<T> = Result<Json<ApiResponse<T>>>;

/// Wrap data in a 200 envelope
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
    }))
}

/// Wrap data in a 201 envelope
pub fn created<T: Serialize>(data: T) -> Result<(StatusCode, Json<ApiResponse<T>>)> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
        }),
    ))
}
