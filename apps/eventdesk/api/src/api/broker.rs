//! Kafka topic administration and ad-hoc publishing, for administrators only.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{delete, get, post},
};
use axum_helpers::{
    AppError, ErrorCode, PermissionGate, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, RequestTimeoutResponse,
        UnauthorizedResponse,
    },
    require_permissions,
};
use domain_identity::MessageResponse;
use messaging::{BrokerError, KafkaBroker, ReadyBroker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

const TAG: &str = "kafka";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessage {
    /// Topic to publish to
    #[validate(length(min = 1, message = "Topic cannot be empty"))]
    pub topic: String,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTopic {
    #[validate(length(min = 1, max = 249))]
    pub topic_name: String,
    #[serde(default = "one", alias = "num_partitions")]
    #[validate(range(min = 1))]
    #[schema(default = 1, minimum = 1)]
    pub partitions: i32,
    #[serde(default = "one", alias = "replication_factor")]
    #[validate(range(min = 1))]
    #[schema(default = 1, minimum = 1)]
    pub replication: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicList {
    pub topics: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(send_message, create_topic, delete_topic, list_topics),
    components(schemas(SendMessage, CreateTopic, TopicList)),
    tags((name = TAG, description = "Kafka topics and messages"))
)]
pub struct BrokerApiDoc;

pub fn router(broker: Arc<KafkaBroker>, gate: PermissionGate) -> Router {
    Router::new()
        .route("/send", post(send_message))
        .route("/create/topic", post(create_topic))
        .route("/topics", get(list_topics))
        .route("/topics/{name}", delete(delete_topic))
        .layer(middleware::from_fn_with_state(gate, require_permissions))
        .with_state(broker)
}

/// Broker failures as HTTP errors: timeouts 408, existing topic 409, unknown topic 404,
/// anything else 500 with the broker's message.
pub fn broker_error(err: BrokerError) -> AppError {
    let message = err.to_string();
    match err {
        BrokerError::Timeout(_) => AppError::Timeout {
            code: ErrorCode::BrokerTimeout,
            message,
        },
        BrokerError::TopicAlreadyExists(_) => AppError::Conflict(message),
        BrokerError::UnknownTopic(_) => AppError::NotFound(message),
        BrokerError::Connection(_) | BrokerError::Unavailable(_) | BrokerError::Broker(_) => {
            AppError::Upstream {
                code: ErrorCode::BrokerError,
                message,
            }
        }
    }
}

/// Clients for one request. Outside `Ready`, including mid-shutdown, the request gets a 503.
async fn ready(broker: &KafkaBroker) -> Result<ReadyBroker<'_>, AppError> {
    broker.try_ready().await.map_err(|err| match err {
        BrokerError::Unavailable(state) => {
            AppError::ServiceUnavailable(format!("Kafka broker is {}", state))
        }
        other => broker_error(other),
    })
}

/// Publish a message to a topic
#[utoipa::path(
    post,
    path = "/send",
    tag = TAG,
    request_body = SendMessage,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Message acknowledged by the broker", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 408, response = RequestTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
#[instrument(skip(broker, request), fields(topic = %request.topic))]
async fn send_message(
    State(broker): State<Arc<KafkaBroker>>,
    ValidatedJson(request): ValidatedJson<SendMessage>,
) -> Result<Json<MessageResponse>, AppError> {
    ready(&broker)
        .await?
        .send_message(&request.topic, request.message)
        .await
        .map_err(broker_error)?;
    Ok(Json(MessageResponse::new(format!(
        "Message sent to Kafka topic {}",
        request.topic
    ))))
}

/// Create a topic
#[utoipa::path(
    post,
    path = "/create/topic",
    tag = TAG,
    request_body = CreateTopic,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Topic created", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 408, response = RequestTimeoutResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
#[instrument(skip(broker))]
async fn create_topic(
    State(broker): State<Arc<KafkaBroker>>,
    ValidatedJson(request): ValidatedJson<CreateTopic>,
) -> Result<Json<MessageResponse>, AppError> {
    ready(&broker)
        .await?
        .create_topic(&request.topic_name, request.partitions, request.replication)
        .await
        .map_err(broker_error)?;
    Ok(Json(MessageResponse::new(format!(
        "Topic '{}' was created",
        request.topic_name
    ))))
}

/// Delete a topic
#[utoipa::path(
    delete,
    path = "/topics/{name}",
    tag = TAG,
    security(("bearer" = [])),
    params(("name" = String, Path, description = "Topic name")),
    responses(
        (status = 200, description = "Topic deleted", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 408, response = RequestTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
#[instrument(skip(broker))]
async fn delete_topic(
    State(broker): State<Arc<KafkaBroker>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    ready(&broker)
        .await?
        .delete_topic(&name)
        .await
        .map_err(broker_error)?;
    Ok(Json(MessageResponse::new(format!("Topic '{}' was deleted", name))))
}

/// List topics, without internal ones
#[utoipa::path(
    get,
    path = "/topics",
    tag = TAG,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Topic names, sorted", body = TopicList),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 408, response = RequestTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_topics(State(broker): State<Arc<KafkaBroker>>) -> Result<Json<TopicList>, AppError> {
    let topics = ready(&broker)
        .await?
        .list_topics()
        .await
        .map_err(broker_error)?;
    Ok(Json(TopicList { topics }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum_helpers::auth::testing::{bearer, claims_for, sign, static_verifier};
    use http_body_util::BodyExt;
    use messaging::KafkaConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let broker = Arc::new(KafkaBroker::new(KafkaConfig::new("127.0.0.1:1")));
        router(
            broker,
            PermissionGate::require(static_verifier("backend"), ["admin"]),
        )
    }

    fn post_as(roles: &[&str], uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(
                header::AUTHORIZATION,
                bearer(&sign(&claims_for("frontend", "root", roles))),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[test]
    fn test_broker_error_statuses() {
        let cases = [
            (BrokerError::Timeout("metadata".into()), StatusCode::REQUEST_TIMEOUT),
            (BrokerError::TopicAlreadyExists("events".into()), StatusCode::CONFLICT),
            (BrokerError::UnknownTopic("gone".into()), StatusCode::NOT_FOUND),
            (BrokerError::Broker("InvalidReplicationFactor".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (BrokerError::Connection("refused".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(broker_error(err).status(), status);
        }
    }

    #[test]
    fn test_create_topic_defaults_and_aliases() {
        let request: CreateTopic = serde_json::from_value(json!({ "topic_name": "events" })).unwrap();
        assert_eq!((request.partitions, request.replication), (1, 1));

        let request: CreateTopic = serde_json::from_value(json!({
            "topic_name": "events",
            "num_partitions": 3,
            "replication_factor": 2
        }))
        .unwrap();
        assert_eq!((request.partitions, request.replication), (3, 2));
    }

    #[tokio::test]
    async fn test_requires_admin() {
        let (status, _) = send(post_as(
            &["user"],
            "/send",
            json!({ "topic": "events", "message": "hi" }),
        ))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (status, body) = send(post_as(
            &["admin"],
            "/send",
            json!({ "topic": "events", "message": "" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_zero_partitions_rejected() {
        let (status, _) = send(post_as(
            &["admin"],
            "/create/topic",
            json!({ "topic_name": "events", "partitions": 0 }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_broker_not_started_is_unavailable() {
        let (status, body) = send(post_as(
            &["admin"],
            "/send",
            json!({ "topic": "events", "message": "hi" }),
        ))
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "Kafka broker is uninitialized");
    }

    #[tokio::test]
    async fn test_every_operation_checks_readiness() {
        let admin = bearer(&sign(&claims_for("frontend", "root", &["admin"])));
        let requests = [
            Request::get("/topics"),
            Request::delete("/topics/events"),
        ];
        for request in requests {
            let request = request
                .header(header::AUTHORIZATION, &admin)
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(request).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        }

        let (status, _) = send(post_as(
            &["admin"],
            "/create/topic",
            json!({ "topic_name": "events" }),
        ))
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
