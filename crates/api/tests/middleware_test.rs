use axum::extract::FromRequestParts;
use axum::http::Request;
use pretty_assertions::assert_eq;
use rosterd_api::middleware::actor::{ActorId, ACTOR_HEADER};
use rosterd_api::middleware::error_handling::map_error;
use rosterd_core::errors::RosterError;
use uuid::Uuid;

#[tokio::test]
async fn test_error_handling_not_found() {
    let error = RosterError::NotFound("Resource not found".to_string());
    let response = map_error(error);
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_handling_validation() {
    let error = RosterError::Validation("Invalid input".to_string());
    let response = map_error(error);
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_handling_authorization() {
    let error = RosterError::Authorization("Not authorized".to_string());
    let response = map_error(error);
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_error_handling_conflict() {
    let error = RosterError::Conflict("Shift already assigned".to_string());
    let response = map_error(error);
    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_error_handling_database() {
    let error = RosterError::Database(eyre::eyre!("Database error"));
    let response = map_error(error);
    assert_eq!(
        response.status(),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_actor_id_extraction() {
    let id = Uuid::new_v4();
    let request = Request::builder()
        .header(ACTOR_HEADER, id.to_string())
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let actor_id = ActorId::from_request_parts(&mut parts, &())
        .await
        .expect("extraction should succeed");
    assert_eq!(actor_id.0, id);
}

#[tokio::test]
async fn test_actor_id_missing_header_rejected() {
    let request = Request::builder().body(()).unwrap();
    let (mut parts, _) = request.into_parts();

    let result = ActorId::from_request_parts(&mut parts, &()).await;
    let response = axum::response::IntoResponse::into_response(result.unwrap_err());
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_actor_id_invalid_uuid_rejected() {
    let request = Request::builder()
        .header(ACTOR_HEADER, "not-a-uuid")
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let result = ActorId::from_request_parts(&mut parts, &()).await;
    assert!(result.is_err());
}
