mod catalog;
mod platform;
mod sample;
mod score;
mod snapshot;

pub use catalog::*;
pub use platform::*;
pub use sample::*;
pub use score::*;
pub use snapshot::*;
