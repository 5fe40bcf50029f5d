#![warn(clippy::unwrap_used)]

pub mod dashboard_rest;
pub mod rest;
pub mod server;

pub use server::{create_router, ApiServer};
