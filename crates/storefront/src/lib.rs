//! QKart Storefront - cart and search synchronization engine.
//!
//! This crate keeps a storefront client's view of the catalog, the search
//! results and the shopping cart consistent with the QKart backend.
//!
//! # Architecture
//!
//! - [`catalog`] - Read-only product list fetched once per session
//! - [`cart`] - Reconciliation of the backend cart with the catalog, and the
//!   add / update-quantity state machine
//! - [`search`] - Debounced, last-issued-wins product search
//! - [`state`] - Page loader wiring the above together
//! - [`backend`] - The `StoreApi` seam and its `reqwest` implementation
//! - [`session`] - Explicit session context read from a token store
//! - [`notify`] - User-facing notices
//!
//! All failures stop at a component boundary and become a [`notify::Notice`]
//! plus a safe fallback state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod search;
pub mod session;
pub mod state;

pub use backend::{ApiError, BackendClient, StoreApi};
pub use cart::{AddPolicy, Cart, CartMutator, CartPhase, CartSession, CartView, reconcile};
pub use catalog::ProductCatalog;
pub use config::StorefrontConfig;
pub use error::CartError;
pub use notify::{Notice, Notifier, Severity};
pub use search::{SearchController, SearchPhase, SearchView};
pub use session::{AuthToken, FileTokenStore, MemoryTokenStore, SessionContext, TokenStore};
pub use state::Storefront;
