//! Products domain module.
//!
//! This crate contains the product catalog rules (field validation, typed CRUD
//! requests), implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod action;
pub mod product;

pub use action::{ActionError, ActionKind, FormFields, ProductAction};
pub use product::{NewProduct, Price, Product, ProductFields, ProductUpdate};
