//! OpenAPI document, served as YAML under `/openapi.yaml` with a RapiDoc UI
//! at `/docs` when docs are enabled.

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::handlers;
use crate::listing::Page;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "atlas inventory API",
        description = "Multi-tenant asset inventory service",
        version = "1.0.0"
    ),
    paths(
        handlers::health::health,
        handlers::health::dbping,
        handlers::auth::login,
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::auth::change_password,
        handlers::organizations::list,
        handlers::organizations::create,
        handlers::organizations::get,
        handlers::organizations::update,
        handlers::organizations::delete,
        handlers::organizations::stats,
        handlers::users::list,
        handlers::users::create,
        handlers::users::get,
        handlers::users::update,
        handlers::users::delete,
        handlers::sites::list,
        handlers::sites::create,
        handlers::sites::get,
        handlers::sites::update,
        handlers::sites::delete,
        handlers::vendors::list,
        handlers::vendors::create,
        handlers::vendors::get,
        handlers::vendors::update,
        handlers::vendors::delete,
        handlers::projects::list,
        handlers::projects::create,
        handlers::projects::get,
        handlers::projects::update,
        handlers::projects::delete,
        handlers::items::list,
        handlers::items::create,
        handlers::items::get,
        handlers::items::update,
        handlers::items::delete,
        handlers::assets::list,
        handlers::assets::create,
        handlers::assets::get,
        handlers::assets::update,
        handlers::assets::delete,
        handlers::assets::list_switches,
        handlers::assets::list_vlans,
        handlers::assets::site_categories,
        handlers::imports::upload_excel,
    ),
    components(schemas(ErrorBody, Page)),
    tags(
        (name = "system", description = "Health probes"),
        (name = "auth", description = "Login and self-service"),
        (name = "organizations", description = "Tenant management (main tenant only)"),
        (name = "users", description = "User management"),
        (name = "sites", description = "Sites"),
        (name = "vendors", description = "Vendors"),
        (name = "projects", description = "Projects"),
        (name = "items", description = "Generic inventory"),
        (name = "assets", description = "Polymorphic assets and subtypes"),
        (name = "imports", description = "Spreadsheet ingestion"),
    )
)]
pub struct ApiDoc;

pub fn openapi_yaml() -> Result<String, serde_norway::Error> {
    ApiDoc::openapi().to_yaml()
}
