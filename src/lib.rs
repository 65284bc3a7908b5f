pub mod browser;
pub mod config;
pub mod cookie;
pub mod dom;
pub mod error;
pub mod theme;
pub mod toggle;

pub use config::ThemeConfig;
pub use error::{Error, Result};
pub use theme::{ThemeController, ThemePreference};
