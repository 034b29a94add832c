//! Fragranza Olio Core - Shared types library.
//!
//! Common types used by the storefront service and its vendor clients.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. Anything that talks to Firebase or Supabase lives in the
//! storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
