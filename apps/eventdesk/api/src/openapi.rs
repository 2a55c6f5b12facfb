use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer` scheme every protected path refers to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(|| utoipa::openapi::ComponentsBuilder::new().build());
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Eventdesk API",
        version = "0.1.0",
        description = "Events owned by authenticated clients, Keycloak accounts and Kafka administration"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/v1/events", api = domain_events::handlers::ApiDoc),
        (path = "/v1/auth", api = domain_identity::ApiDoc),
        (path = "/v1/kafka", api = crate::api::broker::BrokerApiDoc),
        (path = "/v1/admin", api = crate::api::admin::AdminApiDoc)
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
