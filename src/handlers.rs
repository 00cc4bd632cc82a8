use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Payload, StudentId, UniversityId},
    models::{Student, StudentPayload, University, UniversityPayload},
    nesting::StudentScope,
    serializers::{StudentSerializer, UniversitySerializer},
};
use axum::{Json, extract::State, http::StatusCode};

// --- University Handlers ---

/// list_universities
///
/// Every university, ordered by id.
#[utoipa::path(
    get,
    path = "/universities/",
    responses((status = 200, description = "All universities", body = [University]))
)]
pub async fn list_universities(State(state): State<AppState>) -> ApiResult<Json<Vec<University>>> {
    Ok(Json(state.repo.list_universities().await?))
}

/// retrieve_university
#[utoipa::path(
    get,
    path = "/universities/{university_id}/",
    params(("university_id" = i64, Path, description = "University ID")),
    responses(
        (status = 200, description = "Found", body = University),
        (status = 404, description = "Not Found")
    )
)]
pub async fn retrieve_university(
    State(state): State<AppState>,
    UniversityId(id): UniversityId,
) -> ApiResult<Json<University>> {
    state
        .repo
        .get_university(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_university
///
/// [Authenticated] Validates the body and stores a new university.
#[utoipa::path(
    post,
    path = "/universities/",
    request_body = UniversityPayload,
    responses(
        (status = 201, description = "Created", body = University),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_university(
    State(state): State<AppState>,
    Payload(payload): Payload<UniversityPayload>,
) -> ApiResult<(StatusCode, Json<University>)> {
    let new = UniversitySerializer::validate_full(payload)?;
    let university = state.repo.create_university(new).await?;
    tracing::info!(university_id = university.id, "university created");
    Ok((StatusCode::CREATED, Json(university)))
}

/// update_university
///
/// [Authenticated] Full replace. Existence is checked before the body is validated.
#[utoipa::path(
    put,
    path = "/universities/{university_id}/",
    params(("university_id" = i64, Path, description = "University ID")),
    request_body = UniversityPayload,
    responses(
        (status = 200, description = "Updated", body = University),
        (status = 400, description = "Field errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_university(
    State(state): State<AppState>,
    UniversityId(id): UniversityId,
    Payload(payload): Payload<UniversityPayload>,
) -> ApiResult<Json<University>> {
    state
        .repo
        .get_university(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let changes = UniversitySerializer::validate_full(payload)?.into();
    state
        .repo
        .update_university(id, changes)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// partial_update_university
///
/// [Authenticated] Merges the supplied fields into the stored record.
#[utoipa::path(
    patch,
    path = "/universities/{university_id}/",
    params(("university_id" = i64, Path, description = "University ID")),
    request_body = UniversityPayload,
    responses(
        (status = 200, description = "Updated", body = University),
        (status = 400, description = "Field errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_university(
    State(state): State<AppState>,
    UniversityId(id): UniversityId,
    Payload(payload): Payload<UniversityPayload>,
) -> ApiResult<Json<University>> {
    state
        .repo
        .get_university(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let changes = UniversitySerializer::validate_partial(payload)?;
    state
        .repo
        .update_university(id, changes)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// destroy_university
///
/// [Authenticated] Deletes the university and, by cascade, all of its students.
#[utoipa::path(
    delete,
    path = "/universities/{university_id}/",
    params(("university_id" = i64, Path, description = "University ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn destroy_university(
    State(state): State<AppState>,
    UniversityId(id): UniversityId,
) -> ApiResult<StatusCode> {
    if state.repo.delete_university(id).await? {
        tracing::info!(university_id = id, "university deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Student Handlers ---
//
// Shared by `/students/...` and `/universities/{university_id}/students/...`.
// The `StudentScope` extractor carries the difference.

/// list_students
#[utoipa::path(
    get,
    path = "/students/",
    responses((status = 200, description = "Students in scope", body = [Student]))
)]
pub async fn list_students(
    State(state): State<AppState>,
    scope: StudentScope,
) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(state.repo.list_students(scope.university()).await?))
}

/// retrieve_student
#[utoipa::path(
    get,
    path = "/students/{id}/",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Found", body = Student),
        (status = 404, description = "Not Found")
    )
)]
pub async fn retrieve_student(
    State(state): State<AppState>,
    scope: StudentScope,
    StudentId(id): StudentId,
) -> ApiResult<Json<Student>> {
    state
        .repo
        .get_student(id, scope.university())
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_student
///
/// [Authenticated] On the nested route the university comes from the path.
#[utoipa::path(
    post,
    path = "/students/",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Created", body = Student),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    scope: StudentScope,
    Payload(payload): Payload<StudentPayload>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let new = StudentSerializer::new(scope)
        .validate_full(payload, state.repo.as_ref())
        .await?;
    let student = state
        .repo
        .create_student(new)
        .await
        .map_err(|err| scope.write_error(err))?;
    tracing::info!(
        student_id = student.id,
        university_id = student.university,
        "student created"
    );
    Ok((StatusCode::CREATED, Json(student)))
}

/// update_student
///
/// [Authenticated] Full replace of the mutable fields; `created_at` is kept.
#[utoipa::path(
    put,
    path = "/students/{id}/",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = StudentPayload,
    responses(
        (status = 200, description = "Updated", body = Student),
        (status = 400, description = "Field errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    scope: StudentScope,
    StudentId(id): StudentId,
    Payload(payload): Payload<StudentPayload>,
) -> ApiResult<Json<Student>> {
    state
        .repo
        .get_student(id, scope.university())
        .await?
        .ok_or(ApiError::NotFound)?;
    let changes = StudentSerializer::new(scope)
        .validate_full(payload, state.repo.as_ref())
        .await?
        .into();
    state
        .repo
        .update_student(id, scope.university(), changes)
        .await
        .map_err(|err| scope.write_error(err))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// partial_update_student
#[utoipa::path(
    patch,
    path = "/students/{id}/",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = StudentPayload,
    responses(
        (status = 200, description = "Updated", body = Student),
        (status = 400, description = "Field errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_student(
    State(state): State<AppState>,
    scope: StudentScope,
    StudentId(id): StudentId,
    Payload(payload): Payload<StudentPayload>,
) -> ApiResult<Json<Student>> {
    state
        .repo
        .get_student(id, scope.university())
        .await?
        .ok_or(ApiError::NotFound)?;
    let changes = StudentSerializer::new(scope)
        .validate_partial(payload, state.repo.as_ref())
        .await?;
    state
        .repo
        .update_student(id, scope.university(), changes)
        .await
        .map_err(|err| scope.write_error(err))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// destroy_student
#[utoipa::path(
    delete,
    path = "/students/{id}/",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn destroy_student(
    State(state): State<AppState>,
    scope: StudentScope,
    StudentId(id): StudentId,
) -> ApiResult<StatusCode> {
    if state.repo.delete_student(id, scope.university()).await? {
        tracing::info!(student_id = id, "student deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
