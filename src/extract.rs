//! Request extractors whose rejections speak the API's error format.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};

use crate::error::ApiError;

/// Path parameter naming a university, on both the flat and nested routes.
pub const UNIVERSITY_PARAM: &str = "university_id";

/// Path parameter naming a student.
pub const STUDENT_PARAM: &str = "id";

/// Payload
///
/// JSON body extractor. Syntax and shape errors become 400 with a `detail`
/// body; a missing JSON content type becomes 415.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Payload(value))
    }
}

/// Reads the integer path parameter `key`. Anything unparsable is a 404, the
/// same as an id that parses but matches no record.
pub async fn path_id<S>(parts: &mut Parts, state: &S, key: &str) -> Result<i64, ApiError>
where
    S: Send + Sync,
{
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| ApiError::NotFound)?;
    params
        .get(key)
        .and_then(|raw| raw.parse().ok())
        .ok_or(ApiError::NotFound)
}

/// UniversityId
///
/// The `{university_id}` segment of `/universities/{university_id}/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniversityId(pub i64);

impl<S> FromRequestParts<S> for UniversityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, UNIVERSITY_PARAM).await.map(UniversityId)
    }
}

/// StudentId
///
/// The `{id}` segment of `/students/{id}/` and of the nested student routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId(pub i64);

impl<S> FromRequestParts<S> for StudentId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, STUDENT_PARAM).await.map(StudentId)
    }
}
