//! Compiles DAP4 data responses.
//!
//! A data response is the serialized values of every top-level variable of a dataset, in
//! declaration order, with no framing of its own: the layout is only known from the metadata.
//! The [`DataCompiler`] walks the metadata once, records where every instance of every variable
//! begins, and returns a [`CompiledData`] whose [`Cursor`]s decode values on demand.
//!
//! ```
//! use dap4_buffer::DataWriter;
//! use dap4_compiler::{ChecksumMode, CompileOptions, compile};
//! use dap4_dmr::{Dataset, Dimension, Group, Variable};
//! use dap4_dtype::{AtomicType, ByteOrder, Value};
//!
//! let dataset = Dataset::new(
//!     "example",
//!     Group::new("/").with_variable(Variable::atomic(
//!         "temp",
//!         AtomicType::Float32,
//!         [Dimension::new("time", 2)],
//!     )),
//! );
//!
//! let mut writer = DataWriter::new(ByteOrder::LittleEndian);
//! writer.put(20.5f32).put(21.0f32);
//!
//! let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
//! let data = compile(&dataset, writer.finish(), &options).unwrap();
//! let temp = data.variable("temp").unwrap().as_atomic().unwrap();
//! assert_eq!(temp.read(1).unwrap(), Value::Float32(21.0));
//! ```

pub use compiled::*;
pub use compiler::*;
pub use cursor::*;
pub use options::*;

mod compiled;
mod compiler;
pub mod cursor;
mod node;
mod options;
