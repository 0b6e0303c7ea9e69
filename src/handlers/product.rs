// src/handlers/product.rs
use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    Json,
};
use tracing::{error, info, instrument};

use crate::dtos::product::{MessageResponse, ProductRequest};
use crate::error::AppError;
use crate::models::product::Product;
use crate::state::AppState;

fn require_name(payload: &ProductRequest) -> Result<(), AppError> {
    if payload.has_name() {
        Ok(())
    } else {
        Err(AppError::bad_request("The Name field is required."))
    }
}

// GET /products - List all products
#[instrument(skip(state))]
pub async fn get_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let mut store = state.db.session().await?;
    match store.list().await {
        Ok(products) if products.is_empty() => Err(AppError::not_found("Products not available")),
        Ok(products) => Ok(Json(products)),
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/{id} - Get single product
#[instrument(skip(state, id))]
pub async fn get_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = id?;
    let mut store = state.db.session().await?;
    let product = store
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(product))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    require_name(&payload)?;

    let mut store = state.db.session().await?;
    let product = store.add(payload.into()).await?;
    store.save().await?;

    info!(id = product.id, "Product created");
    Ok(Json(MessageResponse::with_id("Product created successfully.", product.id)))
}

// PUT /products - Overwrite an existing product identified by the body's id
#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    if payload.id == 0 {
        return Err(AppError::bad_request(format!("Product Id {} is invalid", payload.id)));
    }
    require_name(&payload)?;

    let mut store = state.db.session().await?;
    let mut product = store
        .find(payload.id)
        .await?
        .ok_or_else(|| AppError::bad_request(format!("Product with {} is not found", payload.id)))?;

    product.name = payload.name;
    product.price = payload.price;
    product.qty = payload.qty;
    store.update(&product).await?;
    store.save().await?;

    info!(id = product.id, "Product updated");
    Ok(Json(MessageResponse::new("Product details updated.")))
}

// DELETE /products/{id} - Delete product
#[instrument(skip(state, id))]
pub async fn delete_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    let mut store = state.db.session().await?;
    let product = store
        .find(id)
        .await?
        .ok_or_else(|| AppError::bad_request(format!("Product with id {id} not found")))?;

    store.remove(&product).await?;
    store.save().await?;

    info!(id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted.")))
}
