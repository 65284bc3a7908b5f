//! Cookie persistence: the `CookieStore` capability, the `document.cookie`
//! string format, and an in-memory store.

use std::collections::BTreeMap;

use ::cookie::time::Duration;
use ::cookie::Cookie;
pub use ::cookie::SameSite;

use crate::error::Result;

/// Attributes written alongside a cookie value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CookieOptions {
    pub path: String,
    /// Lifetime counted from the moment the cookie is written. `None` makes a
    /// session cookie.
    pub expires_days: Option<u32>,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        CookieOptions {
            path: "/".to_string(),
            expires_days: None,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieOptions {
    pub fn max_age(&self) -> Option<Duration> {
        self.expires_days.map(|days| Duration::days(i64::from(days)))
    }
}

pub trait CookieStore {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&mut self, name: &str, value: &str, options: &CookieOptions) -> Result<()>;
    fn remove(&mut self, name: &str, options: &CookieOptions) -> Result<()>;
}

/// The first cookie called `name` in a `document.cookie` string, as the
/// browser lists the most specific path first. Pairs that fail to parse or
/// percent-decode are skipped.
pub fn lookup(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == name)
        .map(|c| c.value_trimmed().to_string())
}

pub fn serialize(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .path(options.path.clone())
        .same_site(options.same_site);
    if let Some(max_age) = options.max_age() {
        builder = builder.max_age(max_age);
    }
    builder.build().encoded().to_string()
}

pub fn serialize_removal(name: &str, options: &CookieOptions) -> String {
    Cookie::build((name.to_string(), ""))
        .path(options.path.clone())
        .removal()
        .build()
        .encoded()
        .to_string()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredCookie {
    pub value: String,
    pub options: CookieOptions,
}

/// A cookie jar held in memory, for running the controller without a browser.
#[derive(Clone, Debug, Default)]
pub struct MemoryCookies {
    jar: BTreeMap<String, StoredCookie>,
}

impl MemoryCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.jar.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                options: CookieOptions::default(),
            },
        );
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&StoredCookie> {
        self.jar.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.jar.get(name).map(|c| c.value.clone()))
    }

    fn set(&mut self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        self.jar.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                options: options.clone(),
            },
        );
        Ok(())
    }

    fn remove(&mut self, name: &str, _options: &CookieOptions) -> Result<()> {
        self.jar.remove(name);
        Ok(())
    }
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[test]
fn test_lookup() {
    assert_eq!(lookup("dark=true", "dark"), Some("true".to_string()));
    assert_eq!(lookup("a=1; dark=true; b=x%20y", "dark"), Some("true".to_string()));
    assert_eq!(lookup("a=1; dark=true; b=x%20y", "b"), Some("x y".to_string()));
    assert_eq!(lookup("dark=false; dark=true", "dark"), Some("false".to_string()));
    assert_eq!(lookup("q=\"quoted\"", "q"), Some("quoted".to_string()));
    assert_eq!(lookup("novalue; k=v", "k"), Some("v".to_string()));
    assert_eq!(lookup("darker=true", "dark"), None);
    assert_eq!(lookup("", "dark"), None);
}

#[test]
fn test_serialize() {
    let options = CookieOptions {
        expires_days: Some(365),
        ..CookieOptions::default()
    };
    let set = serialize("dark", "true", &options);
    assert!(set.starts_with("dark=true;"), "{set}");
    let parsed = Cookie::parse_encoded(set).unwrap();
    assert_eq!(parsed.value(), "true");
    assert_eq!(parsed.path(), Some("/"));
    assert_eq!(parsed.max_age(), Some(Duration::seconds(31_536_000)));
    assert_eq!(parsed.same_site(), Some(SameSite::Lax));

    let note = serialize("note", "a b;c", &CookieOptions::default());
    assert!(note.starts_with("note=a%20b%3Bc;"), "{note}");
    assert_eq!(lookup(&note, "note"), Some("a b;c".to_string()));
    assert_eq!(Cookie::parse_encoded(note).unwrap().max_age(), None);

    let removal = Cookie::parse_encoded(serialize_removal("dark", &options)).unwrap();
    assert_eq!(removal.name(), "dark");
    assert_eq!(removal.value(), "");
    assert_eq!(removal.path(), Some("/"));
    assert_eq!(removal.max_age(), Some(Duration::ZERO));
}

#[test]
fn test_memory_cookies() {
    let mut jar = MemoryCookies::new().with("other", "1");
    assert_eq!(jar.get("dark").unwrap(), None);

    let options = CookieOptions {
        expires_days: Some(365),
        ..CookieOptions::default()
    };
    jar.set("dark", "true", &options).unwrap();
    assert_eq!(jar.get("dark").unwrap(), Some("true".to_string()));
    assert_eq!(
        jar.cookie("dark").unwrap().options.max_age(),
        Some(Duration::days(365)),
    );

    jar.remove("dark", &options).unwrap();
    assert_eq!(jar.get("dark").unwrap(), None);
    assert_eq!(jar.get("other").unwrap(), Some("1".to_string()));
}
