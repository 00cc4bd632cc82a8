use crate::{AppState, handlers, nesting, permissions};
use axum::{Router, middleware, routing::get};

/// Resource Router Module
///
/// The route table for the two resources. Built once at startup:
///
/// - `/universities/` and `/universities/{university_id}/`
/// - `/students/` and `/students/{id}/`
/// - `/universities/{university_id}/students/` and
///   `/universities/{university_id}/students/{id}/`, which reuse the student
///   handlers behind the parent lookup layer.
///
/// Every route is wrapped in the "authenticated or read-only" policy, which runs
/// before the parent lookup.
pub fn resource_routes(state: AppState) -> Router<AppState> {
    let nested_students = student_routes("/universities/{university_id}").route_layer(
        middleware::from_fn_with_state(state.clone(), nesting::resolve_parent_university),
    );

    Router::new()
        .merge(university_routes())
        .merge(student_routes(""))
        .merge(nested_students)
        .route_layer(middleware::from_fn_with_state(
            state,
            permissions::authenticated_or_read_only,
        ))
}

fn university_routes() -> Router<AppState> {
    Router::new()
        // GET lists, POST creates.
        .route(
            "/universities/",
            get(handlers::list_universities).post(handlers::create_university),
        )
        // DELETE cascades to the university's students.
        .route(
            "/universities/{university_id}/",
            get(handlers::retrieve_university)
                .put(handlers::update_university)
                .patch(handlers::partial_update_university)
                .delete(handlers::destroy_university),
        )
}

/// Student collection and detail routes under `prefix`.
fn student_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{prefix}/students/"),
            get(handlers::list_students).post(handlers::create_student),
        )
        .route(
            &format!("{prefix}/students/{{id}}/"),
            get(handlers::retrieve_student)
                .put(handlers::update_student)
                .patch(handlers::partial_update_student)
                .delete(handlers::destroy_student),
        )
}
