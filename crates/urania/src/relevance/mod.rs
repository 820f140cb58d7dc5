pub mod filter;
pub mod keywords;

pub use filter::{filter_relevant, RelevanceFilter};
pub use keywords::{KeywordDictionary, KeywordError};
