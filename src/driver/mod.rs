pub mod common;
pub mod traits;
pub mod web;

#[cfg(test)]
pub mod fake;

pub use traits::{Browser, Locator};
