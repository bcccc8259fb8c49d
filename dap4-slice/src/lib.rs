#![deny(missing_docs)]

//! Hyperslab selection over multi-dimensional DAP4 variables.
//!
//! A [`Slice`] selects `first, first + stride, ...` along one dimension. An [`Odometer`] walks
//! the cartesian product of one slice per dimension in row-major order, yielding the linear
//! element offset of every selected element.

pub use odometer::*;
pub use slice::*;

mod odometer;
mod slice;
