use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::test;
use university_registry::{
    ApiError, AppState, InMemoryRepository,
    config::AppConfig,
    extract::{Payload, StudentId, UniversityId},
    handlers,
    models::{Field, Student, StudentPayload, University, UniversityPayload},
    nesting::StudentScope,
    serializers::{NOT_BLANK, REQUIRED, too_long},
};

// --- TEST UTILITIES ---

fn create_test_state() -> AppState {
    AppState::new(Arc::new(InMemoryRepository::new()), AppConfig::default())
}

fn university_payload(name: &str) -> UniversityPayload {
    UniversityPayload {
        name: json!(name).into(),
    }
}

fn student_payload(university: Field<Value>, first_name: &str, last_name: &str) -> StudentPayload {
    StudentPayload {
        university,
        first_name: json!(first_name).into(),
        last_name: json!(last_name).into(),
    }
}

async fn seed_university(state: &AppState, name: &str) -> University {
    let (status, Json(university)) =
        handlers::create_university(State(state.clone()), Payload(university_payload(name)))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    university
}

async fn seed_student(state: &AppState, university: i64, first_name: &str) -> Student {
    let (_, Json(student)) = handlers::create_student(
        State(state.clone()),
        StudentScope::All,
        Payload(student_payload(json!(university).into(), first_name, "Student")),
    )
    .await
    .unwrap();
    student
}

fn field_errors(err: ApiError) -> university_registry::error::FieldErrors {
    match err {
        ApiError::Validation(errors) => errors,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

// --- UNIVERSITY HANDLER TESTS ---

#[test]
async fn test_create_university_echoes_name_with_fresh_id() {
    let state = create_test_state();
    let first = seed_university(&state, "Aristotle University").await;
    let second = seed_university(&state, "University of Macedonia").await;

    assert_eq!(first.name, "Aristotle University");
    assert_eq!(second.name, "University of Macedonia");
    assert_ne!(first.id, second.id);
}

#[test]
async fn test_create_university_rejects_long_name() {
    let state = create_test_state();
    let err = handlers::create_university(
        State(state.clone()),
        Payload(university_payload(&"x".repeat(51))),
    )
    .await
    .unwrap_err();

    assert_eq!(field_errors(err).get("name"), [too_long(50)]);

    let Json(all) = handlers::list_universities(State(state)).await.unwrap();
    assert!(all.is_empty());
}

#[test]
async fn test_create_university_requires_name() {
    let state = create_test_state();
    let err = handlers::create_university(State(state), Payload(UniversityPayload::default()))
        .await
        .unwrap_err();

    assert_eq!(field_errors(err).get("name"), [REQUIRED]);
}

#[test]
async fn test_retrieve_university_not_found() {
    let state = create_test_state();
    let result = handlers::retrieve_university(State(state), UniversityId(99999)).await;

    let response = result.unwrap_err().into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_update_missing_university_is_not_found_before_validation() {
    let state = create_test_state();
    // The body is invalid too; absence wins.
    let result = handlers::update_university(
        State(state),
        UniversityId(42),
        Payload(UniversityPayload::default()),
    )
    .await;

    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[test]
async fn test_put_requires_every_field_but_patch_does_not() {
    let state = create_test_state();
    let university = seed_university(&state, "Before").await;

    let err = handlers::update_university(
        State(state.clone()),
        UniversityId(university.id),
        Payload(UniversityPayload::default()),
    )
    .await
    .unwrap_err();
    assert_eq!(field_errors(err).get("name"), [REQUIRED]);

    let Json(same) = handlers::partial_update_university(
        State(state.clone()),
        UniversityId(university.id),
        Payload(UniversityPayload::default()),
    )
    .await
    .unwrap();
    assert_eq!(same, university);

    let Json(renamed) = handlers::update_university(
        State(state),
        UniversityId(university.id),
        Payload(university_payload("After")),
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "After");
    assert_eq!(renamed.id, university.id);
}

#[test]
async fn test_destroy_university_cascades() {
    let state = create_test_state();
    let university = seed_university(&state, "Closing Down").await;
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        ids.push(seed_student(&state, university.id, name).await.id);
    }

    let status = handlers::destroy_university(State(state.clone()), UniversityId(university.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    for id in ids {
        let result =
            handlers::retrieve_student(State(state.clone()), StudentScope::All, StudentId(id))
                .await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    let again = handlers::destroy_university(State(state), UniversityId(university.id)).await;
    assert!(matches!(again, Err(ApiError::NotFound)));
}

// --- STUDENT HANDLER TESTS ---

#[test]
async fn test_create_student_reports_every_bad_field() {
    let state = create_test_state();
    let err = handlers::create_student(
        State(state),
        StudentScope::All,
        Payload(StudentPayload {
            university: Field::Present(json!(12345)),
            first_name: Field::Present(json!("   ")),
            last_name: Field::Missing,
        }),
    )
    .await
    .unwrap_err();

    let errors = field_errors(err);
    assert_eq!(
        errors.get("university"),
        ["Invalid pk \"12345\" - object does not exist."]
    );
    assert_eq!(errors.get("first_name"), [NOT_BLANK]);
    assert_eq!(errors.get("last_name"), [REQUIRED]);
}

#[test]
async fn test_nested_create_takes_university_from_scope() {
    let state = create_test_state();
    let parent = seed_university(&state, "Parent").await;
    let decoy = seed_university(&state, "Decoy").await;

    let (status, Json(student)) = handlers::create_student(
        State(state.clone()),
        StudentScope::University(parent.id),
        Payload(student_payload(json!(decoy.id).into(), "Nikos", "K")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student.university, parent.id);

    // The body may omit the university entirely under a scope.
    let (_, Json(student)) = handlers::create_student(
        State(state),
        StudentScope::University(parent.id),
        Payload(student_payload(Field::Missing, "Maria", "K")),
    )
    .await
    .unwrap();
    assert_eq!(student.university, parent.id);
}

#[test]
async fn test_nested_list_and_retrieve_are_scoped() {
    let state = create_test_state();
    let a = seed_university(&state, "A").await;
    let b = seed_university(&state, "B").await;
    let in_a = seed_student(&state, a.id, "Alpha").await;
    let in_b = seed_student(&state, b.id, "Beta").await;

    let Json(listed) =
        handlers::list_students(State(state.clone()), StudentScope::University(a.id))
            .await
            .unwrap();
    assert_eq!(listed, vec![in_a.clone()]);

    let Json(everyone) = handlers::list_students(State(state.clone()), StudentScope::All)
        .await
        .unwrap();
    assert_eq!(everyone.len(), 2);

    let cross = handlers::retrieve_student(
        State(state.clone()),
        StudentScope::University(a.id),
        StudentId(in_b.id),
    )
    .await;
    assert!(matches!(cross, Err(ApiError::NotFound)));

    let cross_delete = handlers::destroy_student(
        State(state.clone()),
        StudentScope::University(a.id),
        StudentId(in_b.id),
    )
    .await;
    assert!(matches!(cross_delete, Err(ApiError::NotFound)));

    let Json(found) = handlers::retrieve_student(
        State(state),
        StudentScope::University(b.id),
        StudentId(in_b.id),
    )
    .await
    .unwrap();
    assert_eq!(found, in_b);
}

#[test]
async fn test_partial_update_student_keeps_created_at() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;
    let student = seed_student(&state, home.id, "Old").await;

    let Json(updated) = handlers::partial_update_student(
        State(state.clone()),
        StudentScope::All,
        StudentId(student.id),
        Payload(StudentPayload {
            first_name: Field::Present(json!("New")),
            ..StudentPayload::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.first_name, "New");
    assert_eq!(updated.last_name, student.last_name);
    assert_eq!(updated.university, student.university);
    assert_eq!(updated.created_at, student.created_at);
}

#[test]
async fn test_nested_put_ignores_body_university() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;
    let elsewhere = seed_university(&state, "Elsewhere").await;
    let student = seed_student(&state, home.id, "Stays").await;

    let Json(updated) = handlers::update_student(
        State(state),
        StudentScope::University(home.id),
        StudentId(student.id),
        Payload(student_payload(json!(elsewhere.id).into(), "Stays", "Home")),
    )
    .await
    .unwrap();

    assert_eq!(updated.university, home.id);
    assert_eq!(updated.last_name, "Home");
}

#[test]
async fn test_flat_put_rejects_unknown_university_and_keeps_record() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;
    let student = seed_student(&state, home.id, "Kept").await;

    let err = handlers::update_student(
        State(state.clone()),
        StudentScope::All,
        StudentId(student.id),
        Payload(student_payload(Field::Present(json!(777)), "Changed", "Name")),
    )
    .await
    .unwrap_err();
    assert_eq!(
        field_errors(err).get("university"),
        ["Invalid pk \"777\" - object does not exist."]
    );

    let Json(stored) =
        handlers::retrieve_student(State(state), StudentScope::All, StudentId(student.id))
            .await
            .unwrap();
    assert_eq!(stored, student);
}

#[test]
async fn test_destroy_student() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;
    let student = seed_student(&state, home.id, "Leaving").await;

    let status =
        handlers::destroy_student(State(state.clone()), StudentScope::All, StudentId(student.id))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(remaining) = handlers::list_students(State(state), StudentScope::All)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[test]
async fn test_partial_update_with_long_values_keeps_records() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;
    let student = seed_student(&state, home.id, "Short").await;
    let long = "x".repeat(51);

    let err = handlers::partial_update_university(
        State(state.clone()),
        UniversityId(home.id),
        Payload(university_payload(&long)),
    )
    .await
    .unwrap_err();
    assert_eq!(field_errors(err).get("name"), [too_long(50)]);

    let err = handlers::partial_update_student(
        State(state.clone()),
        StudentScope::All,
        StudentId(student.id),
        Payload(StudentPayload {
            first_name: Field::Present(json!(long)),
            ..StudentPayload::default()
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(field_errors(err).get("first_name"), [too_long(50)]);

    let Json(stored_university) =
        handlers::retrieve_university(State(state.clone()), UniversityId(home.id))
            .await
            .unwrap();
    assert_eq!(stored_university, home);

    let Json(stored_student) =
        handlers::retrieve_student(State(state), StudentScope::All, StudentId(student.id))
            .await
            .unwrap();
    assert_eq!(stored_student, student);
}

#[test]
async fn test_nested_create_under_vanished_parent_is_not_found() {
    // The route layer resolved the parent, then it was deleted.
    let state = create_test_state();
    let parent = seed_university(&state, "Closing").await;
    handlers::destroy_university(State(state.clone()), UniversityId(parent.id))
        .await
        .unwrap();

    let err = handlers::create_student(
        State(state.clone()),
        StudentScope::University(parent.id),
        Payload(student_payload(Field::Missing, "Late", "Arrival")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let Json(all) = handlers::list_students(State(state), StudentScope::All)
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[test]
async fn test_flat_create_with_wrong_types_reports_fields() {
    let state = create_test_state();
    let home = seed_university(&state, "Home").await;

    let err = handlers::create_student(
        State(state),
        StudentScope::All,
        Payload(StudentPayload {
            university: Field::Present(json!("abc")),
            first_name: Field::Present(json!(true)),
            last_name: Field::Present(json!(home.id)),
        }),
    )
    .await
    .unwrap_err();

    let errors = field_errors(err);
    assert_eq!(
        errors.get("university"),
        ["Incorrect type. Expected pk value, received str."]
    );
    assert_eq!(errors.get("first_name"), ["Not a valid string."]);
    assert!(errors.get("last_name").is_empty());
}
