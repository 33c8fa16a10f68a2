//! Lenspool backend library
//!
//! Backend for a photo collection marketplace: paid campaigns define what
//! images are wanted, contributors upload against them, an automated quality
//! pipeline vets each upload, and approvals credit an append-only payout
//! ledger.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
