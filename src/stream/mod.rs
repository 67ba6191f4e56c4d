//! Reader and writer buffers between callers and the codec backends

pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use reader::Reader;
pub use writer::Writer;
