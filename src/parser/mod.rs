pub mod types;
pub mod yaml;

pub use types::{Feature, Keyword, Scenario, Step};
