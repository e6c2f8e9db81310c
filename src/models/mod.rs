pub mod errors;
pub mod sentence;

pub use errors::*;
pub use sentence::*;
