//! `OpenAPI` (3.1) document for the `/v1` endpoints, served as JSON and through
//! Swagger UI.

use utoipa::OpenApi;

/// Route of the JSON document.
pub const OPENAPI_JSON_PATH: &str = "/v1/openapi.json";
/// Mount point of Swagger UI.
pub const SWAGGER_UI_PATH: &str = "/v1/swagger";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Product catalog and shopping carts"
    ),
    paths(
        crate::app::routes::products::list_products,
        crate::app::routes::products::create_product,
        crate::app::routes::products::get_product,
        crate::app::routes::products::update_product,
        crate::app::routes::products::delete_product,
        crate::app::routes::carts::create_cart,
        crate::app::routes::carts::get_cart,
        crate::app::routes::carts::add_item,
        crate::app::routes::carts::remove_items,
    ),
    components(
        schemas(
            crate::app::errors::ErrorBody,
            crate::app::dto::MessageResp,
            crate::app::dto::ProductData,
            crate::app::dto::ProductPatch,
            crate::app::dto::ProductDto,
            crate::app::dto::ProductsListResp,
            crate::app::dto::ItemData,
            crate::app::dto::ItemCartDto,
            crate::app::dto::ShoppingCartDto,
        )
    ),
    tags(
        (name = "products", description = "Catalog operations"),
        (name = "carts", description = "Shopping cart operations"),
    ),
)]
pub struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
