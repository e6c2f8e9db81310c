pub mod delay;

pub use delay::{DelaySource, MAX_DELAY_MS};
