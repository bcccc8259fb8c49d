//! Read DAP4 data responses.
//!
//! A [`Dap4Reader`] splits a chunked response into its DMR and data, hands the DMR to a
//! [`DmrParser`] and returns a [`Dap4Data`] that compiles the data into typed cursors.
//! The building blocks are re-exported for callers that need them on their own.

pub use reader::*;
pub use {
    dap4_buffer as buffer, dap4_compiler as compiler, dap4_dmr as dmr, dap4_dtype as dtype,
    dap4_error as error, dap4_ipc as ipc, dap4_slice as slice,
};

mod reader;
