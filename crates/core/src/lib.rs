//! Zone7 Core - Shared domain types and rules.
//!
//! This crate provides the types and pure logic used by every Zone7 component:
//! - `storefront` - CMS client, cart/wishlist reconciliation and the JSON API
//! - `cli` - Terminal front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, credentials and statuses
//! - [`cart`] - Cart lines, shipping policy, derived totals and the guest cart
//! - [`wishlist`] - Wishlist entries
//! - [`catalog`] - Products, categories and price derivation
//! - [`filters`] - Shop filter state, the filter predicate and pagination
//! - [`order`] - Checkout form and placed orders
//! - [`user`] - Authenticated user profile

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod filters;
pub mod order;
pub mod types;
pub mod user;
pub mod wishlist;

pub use types::*;
