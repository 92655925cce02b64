//! Bakery Core - Shared domain library.
//!
//! This crate provides the domain model used by every bakery component:
//! - `storefront` - Cart store, checkout sequencer and backend clients
//! - `cli` - Terminal storefront
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no storage, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, products, addresses, orders and statuses
//! - [`cart`] - The shopping cart and its quantity rules
//! - [`pricing`] - Shipping and tax policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartEntry, StockAdjustment};
pub use pricing::{PriceQuote, PricingPolicy, TotalCheck};
pub use types::*;
