//! Access policy for verified tokens.

pub mod access;
