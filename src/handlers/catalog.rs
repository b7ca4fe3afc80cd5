use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::Storefront;
use crate::domain::cart::format_amount;
use crate::domain::catalog::{Category, Product};
use crate::errors::AppError;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Decimal price as a string, e.g. "39.99"
    pub price: String,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub sku: String,
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            price: format_amount(&p.price),
            name: p.name,
            description: p.description,
            image_url: p.image_url,
            stock_quantity: p.stock_quantity,
            sku: p.sku,
            category_id: p.category_id,
            is_featured: p.is_featured,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            image_url: c.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithProductsResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Search term; blank or absent returns the featured list.
    pub q: Option<String>,
    /// Maximum number of results, capped at 100.
    pub limit: Option<i64>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
///
/// Featured products when no term is given, otherwise a case-insensitive
/// match on name and description.
#[utoipa::path(
    get,
    path = "/products",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    store: web::Data<Storefront>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let SearchParams { q, limit } = query.into_inner();

    let products = web::block(move || match q {
        Some(term) => store.catalog.search(&term, limit),
        None => store.catalog.featured(limit),
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    store: web::Data<Storefront>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = web::block(move || store.catalog.product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// GET /categories
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse]),
    ),
    tag = "catalog"
)]
pub async fn list_categories(store: web::Data<Storefront>) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || store.catalog.categories())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /categories/{id}
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category UUID"),
    ),
    responses(
        (status = 200, description = "Category with its products", body = CategoryWithProductsResponse),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn get_category(
    store: web::Data<Storefront>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (category, products) = web::block(move || store.catalog.category(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CategoryWithProductsResponse {
        category: category.into(),
        products: products.into_iter().map(Into::into).collect(),
    }))
}
