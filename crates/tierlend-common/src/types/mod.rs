//! Core data types for the Tierlend engine

pub mod asset;
pub mod loan;
pub mod quote;
pub mod session;
pub mod tier;
