use std::fmt;

use crate::config::ThemeConfig;
use crate::cookie::CookieStore;
use crate::dom::{Dom, Selector};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThemePreference {
    Light,
    Dark,
}

impl ThemePreference {
    /// Only the exact `expected` value reads as dark. Anything else,
    /// including a missing cookie, is light.
    pub fn from_cookie(value: Option<&str>, expected: &str) -> Self {
        match value {
            Some(v) if v == expected => ThemePreference::Dark,
            _ => ThemePreference::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemePreference::Dark
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThemePreference::Light => write!(f, "light"),
            ThemePreference::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ClassOp {
    Add,
    Remove,
}

/// Reads the persisted preference and mirrors it onto the page.
///
/// Nothing is cached: every call goes back to the cookie store. Failures
/// from either capability are logged and skipped.
pub struct ThemeController<C, D> {
    config: ThemeConfig,
    cookies: C,
    dom: D,
}

impl<C, D> ThemeController<C, D>
where
    C: CookieStore,
    D: Dom,
{
    pub fn new(config: ThemeConfig, cookies: C, dom: D) -> Self {
        ThemeController {
            config,
            cookies,
            dom,
        }
    }

    pub fn cookies(&self) -> &C {
        &self.cookies
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn preference(&self) -> ThemePreference {
        let value = match self.cookies.get(&self.config.cookie_name) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("reading cookie {:?}: {err}", self.config.cookie_name);
                None
            }
        };
        ThemePreference::from_cookie(value.as_deref(), &self.config.cookie_value)
    }

    pub fn has_darkmode(&self) -> bool {
        self.preference().is_dark()
    }

    /// Page-ready hook: logs the stored preference and syncs the page to it.
    pub fn ready(&mut self) {
        tracing::info!("Darkmode? {}", self.has_darkmode());
        self.update_site();
    }

    pub fn update_site(&mut self) {
        let config = self.config.clone();
        let (styled, shown, hidden) = if self.has_darkmode() {
            (ClassOp::Add, &config.dark_on, &config.dark_off)
        } else {
            (ClassOp::Remove, &config.dark_off, &config.dark_on)
        };
        for selector in &config.styled {
            self.apply(selector, &config.dark_class, styled);
        }
        self.apply(shown, &config.hidden_class, ClassOp::Remove);
        self.apply(hidden, &config.hidden_class, ClassOp::Add);
    }

    /// Flips the stored preference, then repaints. Returns the new state.
    pub fn toggle_darkmode(&mut self) -> ThemePreference {
        let name = self.config.cookie_name.clone();
        let options = self.config.cookie_options();
        if self.has_darkmode() {
            match self.cookies.remove(&name, &options) {
                Ok(()) => tracing::info!("Darkmode disabled"),
                Err(err) => tracing::warn!("removing cookie {name:?}: {err}"),
            }
        } else {
            let value = self.config.cookie_value.clone();
            match self.cookies.set(&name, &value, &options) {
                Ok(()) => tracing::info!("Darkmode enabled"),
                Err(err) => tracing::warn!("setting cookie {name:?}: {err}"),
            }
        }
        self.update_site();
        self.preference()
    }

    fn apply(&mut self, selector: &Selector, class: &str, op: ClassOp) {
        let elements = match self.dom.select(selector) {
            Ok(elements) => elements,
            Err(err) => {
                tracing::warn!("selecting {selector}: {err}");
                return;
            }
        };
        for element in &elements {
            let result = match op {
                ClassOp::Add => self.dom.add_class(element, class),
                ClassOp::Remove => self.dom.remove_class(element, class),
            };
            if let Err(err) = result {
                tracing::warn!("{op:?} class {class:?} on {selector}: {err}");
            }
        }
        tracing::debug!("{op:?} {class:?} on {} x {selector}", elements.len());
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cookie::{CookieOptions, MemoryCookies, SameSite};
    use crate::dom::{MemoryDom, Node};
    use crate::error::{Error, Result};

    fn page() -> MemoryDom {
        MemoryDom::new()
            .with(Node::new("body"))
            .with(Node::new("nav"))
            .with(Node::new("ul").class("dropdown-menu"))
            .with(Node::new("span").id("dark-on").class("d-none"))
            .with(Node::new("span").id("dark-off"))
            .with(Node::new("table").class("table"))
            .with(Node::new("table"))
    }

    fn controller(cookies: MemoryCookies) -> ThemeController<MemoryCookies, MemoryDom> {
        let _ = tracing_subscriber::fmt::try_init();
        ThemeController::new(ThemeConfig::default(), cookies, page())
    }

    fn has_class(dom: &MemoryDom, selector: &str, class: &str) -> bool {
        dom.find(&selector.parse().unwrap()).unwrap().has_class(class)
    }

    fn has(c: &ThemeController<MemoryCookies, MemoryDom>, selector: &str, class: &str) -> bool {
        has_class(c.dom(), selector, class)
    }

    fn all_tables_dark(c: &ThemeController<MemoryCookies, MemoryDom>) -> bool {
        c.dom()
            .nodes()
            .iter()
            .filter(|n| n.tag == "table")
            .all(|n| n.has_class("dark"))
    }

    #[test]
    fn test_has_darkmode() {
        for (value, dark) in [
            (Some("true"), true),
            (Some("false"), false),
            (Some(""), false),
            (Some("TRUE"), false),
            (Some(" true"), false),
            (Some("1"), false),
            (None, false),
        ] {
            let cookies = match value {
                Some(v) => MemoryCookies::new().with("dark", v),
                None => MemoryCookies::new(),
            };
            assert_eq!(controller(cookies).has_darkmode(), dark, "cookie {value:?}");
        }
    }

    #[test]
    fn test_light_page() {
        let mut c = controller(MemoryCookies::new());
        c.ready();
        assert!(!c.has_darkmode());
        assert!(!has(&c, "body", "dark"));
        assert!(!has(&c, ".dropdown-menu", "dark"));
        assert!(has(&c, "#dark-on", "d-none"));
        assert!(!has(&c, "#dark-off", "d-none"));
        assert!(!has(&c, "nav", "dark"));
    }

    #[test]
    fn test_toggle_on() {
        let mut c = controller(MemoryCookies::new());
        c.ready();
        assert_eq!(c.toggle_darkmode(), ThemePreference::Dark);

        let cookie = c.cookies().cookie("dark").unwrap();
        assert_eq!(cookie.value, "true");
        assert_eq!(
            cookie.options,
            CookieOptions {
                path: "/".to_string(),
                expires_days: Some(365),
                same_site: SameSite::Lax,
            },
        );
        assert!(has(&c, "body", "dark"));
        assert!(all_tables_dark(&c));
        assert!(has(&c, "table", "table"));
        assert!(has(&c, ".dropdown-menu", "dark"));
        assert!(!has(&c, "#dark-on", "d-none"));
        assert!(has(&c, "#dark-off", "d-none"));
        assert!(!has(&c, "nav", "dark"));
    }

    #[test]
    fn test_toggle_twice() {
        let mut c = controller(MemoryCookies::new());
        c.ready();
        let before = c.dom().clone();

        c.toggle_darkmode();
        assert_ne!(c.dom(), &before);
        assert_eq!(c.toggle_darkmode(), ThemePreference::Light);

        assert!(c.cookies().is_empty());
        assert_eq!(c.dom(), &before);
    }

    #[test]
    fn test_toggle_twice_from_dark() {
        let mut c = controller(MemoryCookies::new().with("dark", "true"));
        c.ready();
        let before = c.dom().clone();
        assert!(has(&c, "body", "dark"));

        assert_eq!(c.toggle_darkmode(), ThemePreference::Light);
        assert_eq!(c.cookies().cookie("dark"), None);
        assert!(!has(&c, "body", "dark"));
        assert!(!all_tables_dark(&c));

        assert_eq!(c.toggle_darkmode(), ThemePreference::Dark);
        assert_eq!(c.dom(), &before);
    }

    #[test]
    fn test_toggle_lenient_value() {
        let mut c = controller(MemoryCookies::new().with("dark", "false"));
        assert_eq!(c.toggle_darkmode(), ThemePreference::Dark);
        assert_eq!(c.cookies().cookie("dark").unwrap().value, "true");
    }

    #[test]
    fn test_body_follows_cookie() {
        for cookies in [
            MemoryCookies::new(),
            MemoryCookies::new().with("dark", "true"),
            MemoryCookies::new().with("dark", "yes"),
        ] {
            let mut c = controller(cookies);
            c.update_site();
            assert_eq!(has(&c, "body", "dark"), c.has_darkmode());
        }
    }

    #[test]
    fn test_missing_elements() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut c = ThemeController::new(
            ThemeConfig::default(),
            MemoryCookies::new(),
            MemoryDom::new().with(Node::new("body")),
        );
        assert_eq!(c.toggle_darkmode(), ThemePreference::Dark);
        assert!(c.dom().nodes()[0].has_class("dark"));
    }

    struct BrokenCookies;

    impl CookieStore for BrokenCookies {
        fn get(&self, _name: &str) -> Result<Option<String>> {
            Err(Error::Js("SecurityError: cookies are disabled".to_string()))
        }

        fn set(&mut self, _name: &str, _value: &str, _options: &CookieOptions) -> Result<()> {
            Err(Error::Js("SecurityError: cookies are disabled".to_string()))
        }

        fn remove(&mut self, _name: &str, _options: &CookieOptions) -> Result<()> {
            Err(Error::Js("SecurityError: cookies are disabled".to_string()))
        }
    }

    #[test]
    fn test_broken_cookies() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut c = ThemeController::new(ThemeConfig::default(), BrokenCookies, page());
        c.ready();
        assert!(!c.has_darkmode());
        assert_eq!(c.toggle_darkmode(), ThemePreference::Light);
        assert!(has_class(c.dom(), "#dark-on", "d-none"));
    }

    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        (out, text)
    }

    #[test]
    fn test_toggle_logs() {
        let (_, text) = logged(|| {
            let mut c = ThemeController::new(ThemeConfig::default(), MemoryCookies::new(), page());
            c.ready();
            c.toggle_darkmode();
            c.toggle_darkmode();
        });
        assert!(text.contains("Darkmode? false"), "{text}");
        assert!(text.contains("Darkmode enabled"), "{text}");
        assert!(text.contains("Darkmode disabled"), "{text}");
    }

    #[test]
    fn test_failed_write_logs() {
        let (state, text) = logged(|| {
            let mut c = ThemeController::new(ThemeConfig::default(), BrokenCookies, page());
            c.toggle_darkmode()
        });
        assert_eq!(state, ThemePreference::Light);
        assert!(text.contains("setting cookie \"dark\""), "{text}");
        assert!(!text.contains("Darkmode enabled"), "{text}");

        let (state, text) = logged(|| {
            let mut c = ThemeController::new(
                ThemeConfig::default(),
                ReadOnlyCookies(MemoryCookies::new().with("dark", "true")),
                page(),
            );
            c.toggle_darkmode()
        });
        assert_eq!(state, ThemePreference::Dark);
        assert!(text.contains("removing cookie \"dark\""), "{text}");
        assert!(!text.contains("Darkmode disabled"), "{text}");
    }

    /// Reads succeed, writes throw.
    struct ReadOnlyCookies(MemoryCookies);

    impl CookieStore for ReadOnlyCookies {
        fn get(&self, name: &str) -> Result<Option<String>> {
            self.0.get(name)
        }

        fn set(&mut self, _name: &str, _value: &str, _options: &CookieOptions) -> Result<()> {
            Err(Error::Js("SecurityError: cookies are read-only".to_string()))
        }

        fn remove(&mut self, _name: &str, _options: &CookieOptions) -> Result<()> {
            Err(Error::Js("SecurityError: cookies are read-only".to_string()))
        }
    }

    #[test]
    fn test_custom_config() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = ThemeConfig::from_json(
            r#"{ "cookieName": "theme", "darkClass": "night", "styled": [".card"] }"#,
        )
        .unwrap();
        let dom = MemoryDom::new()
            .with(Node::new("body"))
            .with(Node::new("div").class("card"))
            .with(Node::new("i").id("dark-on"))
            .with(Node::new("i").id("dark-off"));
        let mut c = ThemeController::new(config, MemoryCookies::new().with("dark", "true"), dom);
        c.ready();
        assert!(!c.has_darkmode());

        c.toggle_darkmode();
        assert_eq!(c.cookies().cookie("theme").unwrap().value, "true");
        assert!(has_class(c.dom(), ".card", "night"));
        assert!(!has_class(c.dom(), "body", "night"));
        assert!(has_class(c.dom(), "#dark-off", "d-none"));
    }

    #[test]
    fn test_preference() {
        assert_eq!(ThemePreference::Light.toggled(), ThemePreference::Dark);
        assert_eq!(ThemePreference::Dark.toggled().toggled(), ThemePreference::Dark);
        assert_eq!(ThemePreference::from_cookie(Some("true"), "true").to_string(), "dark");
        assert_eq!(ThemePreference::from_cookie(None, "true").to_string(), "light");
    }
}
