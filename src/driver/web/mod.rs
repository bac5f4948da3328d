pub mod driver;

pub use driver::{BrowserConfig, BrowserType, PlaywrightBrowser};
