//! Fragranza Olio storefront library.
//!
//! Supabase holds identities, profiles, and the catalog; Firebase delivers
//! verification and password reset emails. This crate reconciles the two
//! and serves the JSON API the shop frontend talks to.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod firebase;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;

#[cfg(test)]
mod testing;
