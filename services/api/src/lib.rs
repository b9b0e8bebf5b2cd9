//! Game backend API service for Critter Cove
//!
//! Exposes user accounts, the credit ledger, the character catalog and
//! per-user inventory, direct messaging, and the gift-transfer protocol.

pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod state;
pub mod validation;
