//! Dependency injection infrastructure.
//!
//! This module provides compile-time dependency injection using the `FromRef` trait
//! and derive macros from `di-macros`.
//!
//! # Overview
//!
//! - `FromRef<T>`: Trait for extracting a value from a reference to `T`
//! - `#[derive(Context)]`: Makes each field of a struct extractable via `FromRef`
//! - `#[derive(FromContext)]`: Generates `FromRef` impl by resolving each field
//!
//! # Example
//!
//! ```ignore
//! use crate::di::{Context as ContextDerive, FromContext, FromRef};
//!
//! #[derive(ContextDerive, Clone)]
//! pub struct Context {
//!     pub namespaces: AppNamespaces,
//!     pub transactions: AppTransactions,
//! }
//!
//! #[derive(FromContext, Clone)]
//! pub struct NamespaceService {
//!     namespaces: AppNamespaces,  // resolved via FromRef<Context>
//!     transactions: AppTransactions,
//! }
//!
//! let ctx = Context::in_memory(Config::default());
//! let namespaces = NamespaceService::from_ref(&ctx);
//! ```

/// Trait for extracting a value from a reference to another type.
///
/// This is the core trait for compile-time dependency injection.
/// Types that implement `FromRef<T>` can be extracted from `&T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any `Clone` type can be extracted from itself, so a `Context` can be
/// handed to code generic over `FromRef<Context>`.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
