//! Procedural macros for `stackbind`.
//!
//! # Example
//!
//! ```ignore
//! use stackbind_macros::NativeClass;
//!
//! #[derive(Clone, NativeClass)]
//! #[stackbind(name = "Point")]
//! pub struct Point {
//!     x: f64,
//!     y: f64,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_class;

/// Derive `NativeClass` together with the marshaling traits.
///
/// The generated code implements:
///
/// - `NativeClass`, with `NAME` taken from `#[stackbind(name = "...")]` or
///   the Rust type name
/// - `IntoStack`, pushing the value as a new block of the bound class
/// - `FromStack`, reading a copy of the object out of a block (requires
///   `Clone`; skipped with `#[stackbind(no_clone)]`)
///
/// Generated paths refer to `::stackbind_core` unless overridden, e.g.
/// `#[stackbind(crate = "::stackbind::stackbind_core")]` for crates that
/// depend only on `stackbind`.
///
/// # Attributes
///
/// - `#[stackbind(name = "...")]` - Override the script-visible class name
/// - `#[stackbind(no_clone)]` - Do not generate `FromStack`
/// - `#[stackbind(crate = "...")]` - Path to `stackbind_core`
#[proc_macro_derive(NativeClass, attributes(stackbind))]
pub fn derive_native_class(input: TokenStream) -> TokenStream {
    derive_class::derive_native_class_impl(input)
}
