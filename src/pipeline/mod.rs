pub mod buffer;
pub mod flush;
pub mod transport;
