//! Zone7 storefront library.
//!
//! Cart and wishlist reconciliation over a headless CMS, exposed as a
//! library so the JSON server and the `z7` CLI share one implementation.
//!
//! # Modules
//!
//! - [`cms`] - REST client and the repository traits it implements
//! - [`services`] - Cart, wishlist, auth, checkout and catalog logic
//! - [`store`] - Local key/value storage (memory, file, session)
//! - [`routes`] / [`middleware`] - The axum JSON API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cms;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
