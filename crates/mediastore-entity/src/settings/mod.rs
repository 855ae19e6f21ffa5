//! Singleton site settings document.

pub mod model;

pub use model::{SettingsPatch, SiteSettings};
