pub mod rulers;

pub use rulers::{house_ruler, ruler_label, sign_rulers};
