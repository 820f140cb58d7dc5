pub mod detector;
pub mod types;

pub use detector::{is_applying, AspectDetector};
pub use types::{Aspect, AspectKind};
