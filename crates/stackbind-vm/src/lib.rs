//! A small stack based reference runtime for `stackbind`.
//!
//! The runtime implements [`stackbind_core::Runtime`] with tables, native
//! function values, opaque blocks and a mark-and-sweep collector. It has no
//! source language; code runs by calling function values directly.

pub mod config;
pub mod error;
pub mod gc;
mod slab;
pub mod table;
pub mod vm;

pub use config::VmConfig;
pub use error::VmError;
pub use gc::GcStats;
pub use table::{Table, TableKey};
pub use vm::Vm;
