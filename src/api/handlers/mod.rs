pub mod scores;
pub mod system;

pub use scores::*;
pub use system::*;
