//! Core modules for promptvault's persistence corridor and shared primitives.

pub mod broker;
pub mod config;
pub mod error;
pub mod output;
pub mod store;
pub mod time;
