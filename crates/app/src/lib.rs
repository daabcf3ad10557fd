//! Persistence and services around the checkout-to-order transition.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod identity;
pub mod observability;
pub mod retry;

#[cfg(test)]
mod test;

mod uuids;
