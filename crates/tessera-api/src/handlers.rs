//! REST API handlers.
//!
//! Handlers are generic over the record type and registered once per
//! collection. Bodies are read as raw bytes and decoded with `serde_json`
//! so the content type is never checked and every decode failure gets the
//! same `invalid_format` envelope.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tessera_core::*;
use tessera_store::ServiceError;
use tracing::{debug, error};

use crate::ApiState;

fn reply<R: Record>(status: StatusCode, envelope: Envelope<R>) -> Response {
    (status, Json(envelope)).into_response()
}

fn rejection<R: Record>(status: StatusCode, errors: RequestErrors) -> Response {
    reply::<R>(status, Envelope::errors(errors))
}

/// Decode and validate a request body. A body axum could not read (too
/// large, aborted) gets the same `invalid_format` envelope under the
/// status axum chose.
fn decode<R: Record>(body: Result<Bytes, BytesRejection>) -> Result<R, Response> {
    let body = body.map_err(|err| {
        debug!(kind = R::KIND, error = %err.body_text(), "unreadable request body");
        rejection::<R>(err.status(), vec![RequestError::invalid_format()])
    })?;

    let record: R = serde_json::from_slice(&body).map_err(|e| {
        debug!(kind = R::KIND, error = %e, "malformed request body");
        rejection::<R>(StatusCode::BAD_REQUEST, vec![RequestError::invalid_format()])
    })?;

    let missing = record.validate();
    if !missing.is_empty() {
        return Err(rejection::<R>(StatusCode::BAD_REQUEST, missing));
    }
    Ok(record)
}

/// The `{id}` path segment. One that does not decode (invalid UTF-8)
/// cannot name a stored record.
fn path_id<R: Record>(path: Result<Path<String>, PathRejection>) -> Result<String, Response> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(err) => {
            debug!(kind = R::KIND, error = %err.body_text(), "undecodable path id");
            Err(rejection::<R>(
                StatusCode::NOT_FOUND,
                vec![RequestError::at_param(ErrorSlug::NotFound, "id")],
            ))
        }
    }
}

/// Translate a service failure into its status code and envelope.
fn failure<R: Record>(err: ServiceError) -> Response {
    let (status, error) = match err {
        ServiceError::MissingId => (
            StatusCode::BAD_REQUEST,
            RequestError::at_param(ErrorSlug::Missing, "id"),
        ),
        ServiceError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            RequestError::at_param(ErrorSlug::NotFound, "id"),
        ),
        ServiceError::AlreadyExists { .. } => (
            StatusCode::BAD_REQUEST,
            RequestError::at_field(ErrorSlug::Conflict, "/id"),
        ),
        ServiceError::UnresolvedReference { field, id } => {
            debug!(kind = R::KIND, %field, %id, "unresolved reference");
            (
                StatusCode::BAD_REQUEST,
                RequestError::at_field(ErrorSlug::NotFound, field),
            )
        }
        ServiceError::Internal(msg) => {
            error!(kind = R::KIND, error = %msg, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, RequestError::act_of_god())
        }
    };
    rejection::<R>(status, vec![error])
}

// ── Collection routes ──────────────────────────────────────────

/// POST /{collection}
pub async fn create<R: Record>(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let input = match decode::<R>(body) {
        Ok(input) => input,
        Err(resp) => return resp,
    };

    match state.service::<R>().create(input) {
        Ok(created) => reply(StatusCode::CREATED, Envelope::one(created)),
        Err(e) => failure::<R>(e),
    }
}

/// GET /{collection}/{id}
pub async fn get<R: Record>(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let id = match path_id::<R>(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.service::<R>().get(&id) {
        Ok(record) => reply(StatusCode::OK, Envelope::one(record)),
        Err(e) => failure::<R>(e),
    }
}

/// PUT /{collection}/{id}
pub async fn update<R: Record>(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let input = match decode::<R>(body) {
        Ok(input) => input,
        Err(resp) => return resp,
    };
    let id = match path_id::<R>(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.service::<R>().update(&id, input) {
        Ok(updated) => reply(StatusCode::OK, Envelope::one(updated)),
        Err(e) => failure::<R>(e),
    }
}

/// DELETE /{collection}/{id}
pub async fn delete<R: Record>(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let id = match path_id::<R>(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.service::<R>().delete(&id) {
        Ok(deleted) => reply(StatusCode::OK, Envelope::one(deleted)),
        Err(e) => failure::<R>(e),
    }
}

// ── Fallbacks ──────────────────────────────────────────────────

/// Any path outside the collection routes.
pub async fn unknown_route() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::single(RequestError::new(ErrorSlug::NotFound))),
    )
}

/// A collection path with a method it does not serve.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::single(RequestError::new(ErrorSlug::NotFound))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_store::StateStore;

    fn test_state() -> ApiState {
        ApiState {
            store: StateStore::open_in_memory().unwrap(),
        }
    }

    fn worker_body() -> Result<Bytes, BytesRejection> {
        Ok(Bytes::from_static(
            br#"{"concurrent_users":5,"ehs_cluster_id":"c1","dicom_endpoint":"d1"}"#,
        ))
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn created_id(state: &ApiState) -> String {
        let resp = create::<Worker>(State(state.clone()), worker_body()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        body["workers"][0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_and_get_worker() {
        let state = test_state();
        let resp = create::<Worker>(State(state.clone()), worker_body()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = body_json(resp).await;
        assert_eq!(body["errors"], serde_json::json!([]));
        let worker = &body["workers"][0];
        assert_eq!(worker["concurrent_users"], 5);
        let id = worker["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let resp = get::<Worker>(State(state), Ok(Path(id.clone()))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["workers"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn create_ignores_content_type_and_body_id() {
        let state = test_state();
        let body = Bytes::from_static(
            br#"{"id":"mine","concurrent_users":1,"ehs_cluster_id":"c","dicom_endpoint":"d"}"#,
        );
        let resp = create::<Worker>(State(state), Ok(body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_ne!(body["workers"][0]["id"], "mine");
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_format() {
        let state = test_state();
        let resp = create::<Worker>(State(state), Ok(Bytes::from_static(b"{not json"))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(
            body["errors"],
            serde_json::json!([{"error": "invalid_format", "field": "/"}])
        );
        assert_eq!(body["workers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn absent_required_fields_are_listed() {
        let state = test_state();
        let resp = create::<Worker>(State(state), Ok(Bytes::from_static(b"{}"))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e["error"] == "missing"));
        assert_eq!(errors[0]["field"], "/concurrent_users");
    }

    #[tokio::test]
    async fn get_nonexistent_worker() {
        let state = test_state();
        let resp = get::<Worker>(State(state), Ok(Path("nope".to_string()))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = body_json(resp).await;
        assert_eq!(
            body["errors"],
            serde_json::json!([{"error": "not_found", "param": "id"}])
        );
    }

    #[tokio::test]
    async fn blank_path_id_is_missing() {
        let state = test_state();
        let resp = get::<Worker>(State(state), Ok(Path(" ".to_string()))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(
            body["errors"],
            serde_json::json!([{"error": "missing", "param": "id"}])
        );
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let state = test_state();
        let id = created_id(&state).await;

        let body = Bytes::from_static(
            br#"{"concurrent_users":9,"ehs_cluster_id":"c2","dicom_endpoint":"d2"}"#,
        );
        let resp = update::<Worker>(State(state.clone()), Ok(Path(id.clone())), Ok(body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["workers"][0]["id"], id.as_str());
        assert_eq!(body["workers"][0]["concurrent_users"], 9);

        let resp = get::<Worker>(State(state), Ok(Path(id))).await;
        let body = body_json(resp).await;
        assert_eq!(body["workers"][0]["ehs_cluster_id"], "c2");
    }

    #[tokio::test]
    async fn update_nonexistent_worker() {
        let state = test_state();
        let resp = update::<Worker>(State(state), Ok(Path("nope".to_string())), worker_body()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_returns_record_then_not_found() {
        let state = test_state();
        let id = created_id(&state).await;

        let resp = delete::<Worker>(State(state.clone()), Ok(Path(id.clone()))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["workers"][0]["id"], id.as_str());

        let resp = get::<Worker>(State(state.clone()), Ok(Path(id.clone()))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = delete::<Worker>(State(state), Ok(Path(id))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn talk_with_unknown_speaker_names_the_field() {
        let state = test_state();
        let resp = create::<Speaker>(
            State(state.clone()),
            Ok(Bytes::from_static(br#"{"name":"Ada"}"#)),
        )
        .await;
        let body = body_json(resp).await;
        let ada = body["speakers"][0]["id"].as_str().unwrap().to_string();

        let talk = format!(r#"{{"title":"Engines","speakerIDs":["{ada}","ghost"]}}"#);
        let resp = create::<Talk>(State(state), Ok(Bytes::from(talk))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(
            body["errors"],
            serde_json::json!([{"error": "not_found", "field": "/speakerIDs/1"}])
        );
    }

    #[tokio::test]
    async fn talk_recordings_are_derived() {
        let state = test_state();
        let resp = create::<Speaker>(
            State(state.clone()),
            Ok(Bytes::from_static(br#"{"name":"Ada"}"#)),
        )
        .await;
        let body = body_json(resp).await;
        let ada = body["speakers"][0]["id"].as_str().unwrap().to_string();

        let talk = format!(r#"{{"title":"Engines","speakerIDs":["{ada}"]}}"#);
        let resp = create::<Talk>(State(state), Ok(Bytes::from(talk))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = body_json(resp).await;
        let recording = &body["talks"][0]["recordings"]["Ada"];
        assert_eq!(recording["codec"], "h264");
        assert_eq!(recording["resolution"]["width"], 3840);
        assert_eq!(recording["resolution"]["height"], 2160);
    }

    #[tokio::test]
    async fn unknown_route_is_json() {
        let resp = unknown_route().await.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body, serde_json::json!({"errors": [{"error": "not_found"}]}));
    }
}
