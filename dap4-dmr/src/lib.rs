#![deny(missing_docs)]

//! The dataset metadata tree (DMR) of a DAP4 response.
//!
//! The tree is built by a DMR parser, or programmatically, and is read-only afterwards. It
//! describes every variable in a dataset: its sort, its base type, its dimensions and, for
//! structures and sequences, its fields. The data compiler walks it to locate values in a data
//! response.

pub use dataset::*;
pub use dimension::*;
pub use field::*;
pub use variable::*;

mod dataset;
mod dimension;
mod field;
mod variable;
