//! Language frontends
//!
//! Implementations of the [`Frontend`](crate::Frontend) trait that lower a
//! host language's syntax tree into an [`ExprTree`](crate::ExprTree).

pub mod rust;

pub use rust::RustFrontend;
