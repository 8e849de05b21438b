pub mod shared_buffer;

pub mod fixtures;

pub use shared_buffer::SharedBuf;
