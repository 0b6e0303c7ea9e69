// src/dtos/product.rs
use serde::{Deserialize, Serialize};

use crate::models::product::NewProduct;

/// Body accepted by both POST and PUT. `id` is only meaningful for PUT.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub qty: i32,
}

impl ProductRequest {
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl From<ProductRequest> for NewProduct {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            price: req.price,
            qty: req.qty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), id: None }
    }

    pub fn with_id(message: impl Into<String>, id: i32) -> Self {
        Self { message: message.into(), id: Some(id) }
    }
}
