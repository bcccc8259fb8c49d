mod decoder;
mod encoder;
mod header;
mod reader_async;
mod reader_sync;
mod response;
mod writer_async;
mod writer_sync;

pub use decoder::*;
pub use encoder::*;
pub use header::*;
pub use reader_async::*;
pub use reader_sync::*;
pub use response::*;
pub use writer_async::*;
pub use writer_sync::*;
