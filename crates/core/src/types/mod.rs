//! Core types for QKart.
//!
//! This module provides type-safe wrappers for the catalog and cart shapes
//! returned by the backend.

pub mod cart;
pub mod id;
pub mod product;

pub use cart::{CartItem, RawCartEntry};
pub use id::*;
pub use product::Product;
