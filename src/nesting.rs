//! Parent lookup for the nested student collection.
//!
//! `/universities/{university_id}/students/...` reuses the flat student handlers.
//! The middleware below resolves the parent before the handler runs and leaves a
//! `StudentScope` in the request extensions; handlers read it as an extractor and
//! hand it to the serializer and repository unchanged.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    error::ApiError,
    extract::{UNIVERSITY_PARAM, path_id},
    repository::{RepositoryError, RepositoryState},
};

/// StudentScope
///
/// Which students an operation may see and where new students belong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StudentScope {
    /// Flat `/students/` routes.
    #[default]
    All,
    /// Nested routes under an existing university.
    University(i64),
}

impl StudentScope {
    /// The parent university id, if any.
    pub fn university(self) -> Option<i64> {
        match self {
            StudentScope::All => None,
            StudentScope::University(id) => Some(id),
        }
    }

    /// Converts a store failure for a write in this scope. A parent that
    /// vanished mid-request is a 404 on nested routes, a field error otherwise.
    pub fn write_error(self, err: RepositoryError) -> ApiError {
        match (self, err) {
            (StudentScope::University(_), RepositoryError::UnknownUniversity(_)) => {
                ApiError::NotFound
            }
            (_, err) => err.into(),
        }
    }
}

impl<S> FromRequestParts<S> for StudentScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<StudentScope>()
            .copied()
            .unwrap_or_default())
    }
}

/// resolve_parent_university
///
/// Route layer for the nested student routes. A missing or unparsable parent is
/// a 404 before the handler sees the request.
pub async fn resolve_parent_university(
    State(repo): State<RepositoryState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let university_id = path_id(&mut parts, &(), UNIVERSITY_PARAM).await?;

    let parent = repo
        .get_university(university_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    parts.extensions.insert(StudentScope::University(parent.id));
    Ok(next.run(Request::from_parts(parts, body)).await)
}
