//! QKart Core - Shared types library.
//!
//! This crate provides the data types exchanged between the QKart backend and
//! the storefront client:
//! - `storefront` - Cart and search synchronization engine
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, catalog products, and cart entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
