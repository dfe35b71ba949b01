//! Data models for back-office entities.
//!
//! This module contains the wire types exchanged with the admin REST API:
//!
//! - `StoreInfo`, `Branch`, `Category`: catalog and storefront records
//! - `User`: back-office and customer accounts
//! - `Product`, `ProductVariant`, `ProductSize`, `MediaItem`: product catalog
//! - `Order`, `OrderItem`, `OrderStatus`: customer orders

pub mod catalog;
pub mod order;
pub mod product;
pub mod user;

pub use catalog::{Branch, Category, StoreInfo};
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{MediaItem, Product, ProductSize, ProductVariant};
pub use user::User;

/// Display label for the integer `status` used by most records.
pub fn status_label(status: i32) -> &'static str {
    match status {
        1 => "Active",
        0 => "Paused",
        _ => "Unknown",
    }
}

fn default_status() -> i32 {
    1
}
