//! Core types for the bakery storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod money;
pub mod order;
pub mod product;
pub mod status;

pub use address::{Address, AddressError, AddressForm, DeliveryArea};
pub use id::*;
pub use money::{CURRENCY_CODE, CURRENCY_SYMBOL, Money};
pub use order::{OrderItem, OrderLine, OrderReceipt, OrderRequest, OrderSummary};
pub use product::Product;
pub use status::*;
