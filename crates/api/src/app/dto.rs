use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use storefront_cart::{Cart, CartItem, CartLine};
use storefront_core::{CartId, ProductId};
use storefront_infra::ProductPage;
use storefront_products::{ListProducts, NewProduct, Product};

// -------------------------
// Request DTOs
// -------------------------

/// `GET /v1/products` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub search_term: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_order_by() -> String {
    "price".to_string()
}

fn default_ascending() -> bool {
    true
}

impl From<ListProductsParams> for ListProducts {
    fn from(params: ListProductsParams) -> Self {
        ListProducts {
            page: params.page,
            page_size: params.page_size,
            search_term: params.search_term,
            order_by: params.order_by,
            ascending: params.ascending,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductData {
    pub code: String,
    pub name: String,
    pub price: f64,
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

impl From<ProductData> for NewProduct {
    fn from(data: ProductData) -> Self {
        NewProduct {
            code: data.code,
            name: data.name,
            price: data.price,
            image_url: data.image_url,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemData {
    #[serde(rename = "productID")]
    #[schema(value_type = String, format = Uuid)]
    pub product_id: ProductId,
    pub count: u32,
}

impl From<ItemData> for CartItem {
    fn from(item: ItemData) -> Self {
        CartItem::new(item.product_id, item.count)
    }
}

/// `PATCH /v1/product/{id}` body as documented. The handler reads the raw
/// JSON object so unknown or mistyped fields reach validation.
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

pub fn to_cart_items(items: Vec<ItemData>) -> Vec<CartItem> {
    items.into_iter().map(CartItem::from).collect()
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResp {
    #[schema(value_type = String)]
    pub message: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDto {
    #[schema(value_type = String, format = Uuid)]
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub price: f64,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name,
            price: p.price,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsListResp {
    pub total: u64,
    pub products: Vec<ProductDto>,
}

impl From<ProductPage> for ProductsListResp {
    fn from(page: ProductPage) -> Self {
        Self {
            total: page.total,
            products: page.items.into_iter().map(ProductDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemCartDto {
    pub product: ProductDto,
    #[serde(rename = "productID")]
    #[schema(value_type = String, format = Uuid)]
    pub product_id: ProductId,
    pub count: u32,
}

impl From<CartLine> for ItemCartDto {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product_id(),
            count: line.count,
            product: line.product.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShoppingCartDto {
    #[schema(value_type = String, format = Uuid)]
    pub id: CartId,
    pub items: Vec<ItemCartDto>,
    pub subtotal: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Cart> for ShoppingCartDto {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            subtotal: cart.subtotal(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
            items: cart.items.into_iter().map(ItemCartDto::from).collect(),
        }
    }
}
