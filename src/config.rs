use serde::de::{Deserialize, Deserializer, Error as _};

use crate::cookie::{CookieOptions, SameSite};
use crate::dom::Selector;
use crate::error::Result;

/// Where the theme is persisted and which parts of the page it styles.
///
/// Every field has a default matching the stock page markup, so a JSON
/// document only needs the fields it changes.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeConfig {
    pub cookie_name: String,
    /// The only cookie value that reads as dark.
    pub cookie_value: String,
    #[serde(deserialize_with = "expires_days")]
    pub expires_days: u32,
    #[serde(deserialize_with = "cookie_path")]
    pub path: String,
    #[serde(deserialize_with = "same_site")]
    pub same_site: SameSite,
    pub dark_class: String,
    pub hidden_class: String,
    /// Elements that receive `dark_class` while dark.
    pub styled: Vec<Selector>,
    /// Shown while dark.
    pub dark_on: Selector,
    /// Shown while light.
    pub dark_off: Selector,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            cookie_name: "dark".to_string(),
            cookie_value: "true".to_string(),
            expires_days: 365,
            path: "/".to_string(),
            same_site: SameSite::Lax,
            dark_class: "dark".to_string(),
            hidden_class: "d-none".to_string(),
            styled: vec![
                Selector::tag("body"),
                Selector::tag("table"),
                Selector::class("dropdown-menu"),
            ],
            dark_on: Selector::id("dark-on"),
            dark_off: Selector::id("dark-off"),
        }
    }
}

impl ThemeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: self.path.clone(),
            expires_days: Some(self.expires_days),
            same_site: self.same_site,
        }
    }
}

/// A zero lifetime would make the browser drop the cookie as soon as it is set.
fn expires_days<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    match u32::deserialize(d)? {
        0 => Err(D::Error::custom("expiresDays must be at least 1")),
        days => Ok(days),
    }
}

fn cookie_path<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let path = String::deserialize(d)?;
    if !path.starts_with('/') || path.contains(';') || path.chars().any(char::is_control) {
        return Err(D::Error::custom(format!("invalid cookie path {path:?}")));
    }
    Ok(path)
}

fn same_site<'de, D: Deserializer<'de>>(d: D) -> Result<SameSite, D::Error> {
    let raw = String::deserialize(d)?;
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        _ => Err(D::Error::custom(format!("unknown sameSite {raw:?}"))),
    }
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[test]
fn test_default_config() {
    let config = ThemeConfig::default();
    assert_eq!(config.cookie_name, "dark");
    assert_eq!(
        config.cookie_options().max_age(),
        Some(::cookie::time::Duration::seconds(31_536_000)),
    );
    assert_eq!(config.cookie_options().path, "/");
    assert_eq!(ThemeConfig::from_json("{}").unwrap(), config);
}

#[test]
fn test_partial_config() {
    let config = ThemeConfig::from_json(
        r#"{
    "cookieName": "theme-dark",
    "expiresDays": 30,
    "sameSite": "strict",
    "styled": ["body", ".card"]
}"#,
    )
    .unwrap();
    assert_eq!(config.cookie_name, "theme-dark");
    assert_eq!(config.expires_days, 30);
    assert_eq!(config.same_site, SameSite::Strict);
    assert_eq!(
        config.styled,
        vec![Selector::tag("body"), Selector::class("card")],
    );
    assert_eq!(config.dark_class, "dark");
    assert_eq!(config.dark_on, Selector::id("dark-on"));
}

#[test]
fn test_invalid_config() {
    assert!(ThemeConfig::from_json(r#"{ "styled": ["div > p"] }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "expiresDays": -1 }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "expiresDays": 0 }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "path": "/; domain=example.com" }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "path": "docs" }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "path": "" }"#).is_err());
    assert!(ThemeConfig::from_json(r#"{ "sameSite": "sometimes" }"#).is_err());
    assert!(ThemeConfig::from_json("not json").is_err());
}
