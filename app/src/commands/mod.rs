//! Command handlers. Each returns a serializable response.

pub mod node;
pub mod pools;

pub use node::*;
pub use pools::*;
