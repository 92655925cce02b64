//! Casa del Pan storefront library.
//!
//! Cart store, checkout sequencer and the clients they talk to: the bakery
//! backend and the card processor. Front ends (the `bakery` CLI, tests)
//! build an [`state::AppState`] from [`config::StorefrontConfig`] and drive
//! the rest through it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod payment;
pub mod state;
