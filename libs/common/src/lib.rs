//! Common library for the Critter Cove backend
//!
//! This crate provides shared functionality used across the game services,
//! including database connectivity and error handling.

pub mod database;
pub mod error;
