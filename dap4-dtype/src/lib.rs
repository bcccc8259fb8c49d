#![deny(missing_docs)]

//! The DAP4 atomic type system.
//!
//! This crate maps every DAP4 primitive type to its serialized width, defines the value and
//! vector representations handed out by data cursors, and implements the numeric conversion
//! rules between primitive types.

pub use atomic::*;
pub use byte_order::*;
pub use convert::*;
pub use dtype::*;
pub use native::*;
pub use value::*;
pub use vector::*;

mod atomic;
mod byte_order;
mod convert;
mod dtype;
mod native;
mod value;
mod vector;
