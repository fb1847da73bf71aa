//! Error types for the Portico protocol layer.

mod kernel;
mod portal;
mod transport;

pub use kernel::*;
pub use portal::*;
pub use transport::*;
