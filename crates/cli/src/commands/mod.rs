//! Command implementations. Each prints its result as JSON.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod shop;
pub mod wishlist;
