use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, Claims, PermissionGate, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
    require_permissions,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{EventError, EventResult};
use crate::models::{CreateEvent, Event, EventSearch};
use crate::repository::EventRepository;
use crate::service::EventService;

const TAG: &str = "events";

/// OpenAPI documentation for the events API
#[derive(OpenApi)]
#[openapi(
    paths(create_event, list_events, search_events, get_event),
    components(
        schemas(Event, CreateEvent),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Events owned by the calling client")
    )
)]
pub struct ApiDoc;

/// Event routes, every one behind an authenticated-caller gate.
pub fn router<R: EventRepository + 'static>(
    service: EventService<R>,
    gate: PermissionGate,
) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_events))
        .route("/create", post(create_event))
        .route("/search", get(search_events))
        .route("/{id}", get(get_event))
        .layer(middleware::from_fn_with_state(gate, require_permissions))
        .with_state(shared_service)
}

fn caller(claims: &Claims) -> EventResult<&str> {
    claims.client_id().ok_or(EventError::MissingClient)
}

/// Create an event owned by the caller's client
#[utoipa::path(
    post,
    path = "/create",
    tag = TAG,
    request_body = CreateEvent,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(input): ValidatedJson<CreateEvent>,
) -> EventResult<impl IntoResponse> {
    let event = service.create_event(input, caller(&claims)?).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// List the caller's events
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Events owned by the caller", body = Vec<Event>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Extension(claims): Extension<Claims>,
) -> EventResult<Json<Vec<Event>>> {
    let events = service.list_events(caller(&claims)?).await?;
    Ok(Json(events))
}

/// Search the caller's events by case-insensitive substring
#[utoipa::path(
    get,
    path = "/search",
    tag = TAG,
    security(("bearer" = [])),
    params(
        ("name" = Option<String>, Query, description = "Substring of the event name"),
        ("date" = Option<String>, Query, description = "Substring of the ISO date"),
        ("client_info" = Option<String>, Query, description = "Substring of the owning client")
    ),
    responses(
        (status = 200, description = "Matching events", body = Vec<Event>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Extension(claims): Extension<Claims>,
    search: Result<Query<EventSearch>, QueryRejection>,
) -> Result<Json<Vec<Event>>, AppError> {
    let Query(search) = search?;
    let events = service
        .search_events(search.into(), caller(&claims)?)
        .await?;
    Ok(Json(events))
}

/// Get one of the caller's events
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    security(("bearer" = [])),
    params(
        ("id" = i32, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> EventResult<Json<Event>> {
    let event = service.get_event(id, caller(&claims)?).await?;
    Ok(Json(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventsConfig;
    use crate::notifier::MockEventNotifier;
    use crate::repository::MockEventRepository;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum_helpers::auth::testing::{bearer, claims_for, sign, static_verifier};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(repo: MockEventRepository) -> Router {
        let mut notifier = MockEventNotifier::new();
        notifier.expect_publish().returning(|_, _| Ok(()));
        let service = EventService::new(repo, Arc::new(notifier), EventsConfig::default());
        router(service, PermissionGate::authenticated(static_verifier("backend")))
    }

    fn token(client: &str) -> String {
        bearer(&sign(&claims_for(client, "alice", &[])))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected() {
        let (status, body) = send(
            app(MockEventRepository::new()),
            Request::get("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_returns_201_with_caller_client() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name().returning(|_| Ok(false));
        repo.expect_create().returning(|input, client, _| {
            Ok((
                Event {
                    id: 1,
                    name: input.name,
                    date: input.date,
                    client_info: Some(client.to_string()),
                },
                1,
            ))
        });
        repo.expect_mark_delivered().returning(|_| Ok(()));

        let request = Request::post("/create")
            .header(header::AUTHORIZATION, token("app-1"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Launch","date":"2025-01-01"}"#))
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["client_info"], "app-1");
        assert_eq!(body["date"], "2025-01-01");
    }

    #[tokio::test]
    async fn test_duplicate_create_is_409() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name().returning(|_| Ok(true));

        let request = Request::post("/create")
            .header(header::AUTHORIZATION, token("app-1"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Launch","date":"2025-01-01"}"#))
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Event already exists in system");
    }

    #[tokio::test]
    async fn test_empty_name_is_400() {
        let request = Request::post("/create")
            .header(header::AUTHORIZATION, token("app-1"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"","date":"2025-01-01"}"#))
            .unwrap();
        let (status, _) = send(app(MockEventRepository::new()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_passes_filters_and_caller() {
        let mut repo = MockEventRepository::new();
        repo.expect_search()
            .withf(|filters, client| {
                client == "app-2" && filters.get("name").map(String::as_str) == Some("lau")
            })
            .returning(|_, client| {
                Ok(vec![Event {
                    id: 4,
                    name: "Launch".into(),
                    date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    client_info: Some(client.to_string()),
                }])
            });

        let request = Request::get("/search?name=lau")
            .header(header::AUTHORIZATION, token("app-2"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], 4);
    }

    #[tokio::test]
    async fn test_search_unknown_field_is_400() {
        let mut repo = MockEventRepository::new();
        repo.expect_search()
            .returning(|_, _| Err(EventError::UnknownFilter("owner".into())));

        let request = Request::get("/search?owner=x")
            .header(header::AUTHORIZATION, token("app-1"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unknown filter field 'owner'");
    }

    #[tokio::test]
    async fn test_get_missing_event_is_404() {
        let mut repo = MockEventRepository::new();
        repo.expect_get_for_client().returning(|_, _| Ok(None));

        let request = Request::get("/9")
            .header(header::AUTHORIZATION, token("app-1"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(repo), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
