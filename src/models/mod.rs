pub mod artifact;
pub mod enums;
pub mod stage_result;
pub mod stats;

pub use artifact::*;
pub use enums::*;
pub use stage_result::*;
pub use stats::*;
