//! Token wire format: compact splitting and decoded header/claims models.

pub mod models;
pub mod token;
