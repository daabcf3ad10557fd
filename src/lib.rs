//! Kasa
//!
//! Kasa turns a customer's selected cart lines into an immutable, priced order. This crate
//! holds the pure parts of that transition: minor-unit money handling, the pricing engine,
//! order assembly and the order lifecycle. Persistence and the transactional checkout
//! live in `kasa-app`.

pub mod money;
pub mod orders;
pub mod prelude;
pub mod pricing;
