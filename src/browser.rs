use wasm_bindgen::prelude::*;

use crate::config::ThemeConfig;
use crate::cookie::{self, CookieOptions, CookieStore};
use crate::dom::{Dom, Selector};
use crate::error::{Error, Result};
use crate::theme::ThemeController;

const CONFIG_ELEMENT_ID: &str = "darkmode-config";

pub type BrowserController = ThemeController<DocumentCookies, DocumentDom>;

fn document() -> Result<web_sys::Document> {
    web_sys::window()
        .ok_or(Error::NoWindow)?
        .document()
        .ok_or(Error::NoDocument)
}

/// `document.cookie`.
pub struct DocumentCookies {
    document: web_sys::HtmlDocument,
}

impl DocumentCookies {
    pub fn new(document: &web_sys::Document) -> Result<Self> {
        let document = document
            .clone()
            .dyn_into::<web_sys::HtmlDocument>()
            .map_err(|_| Error::Js("document is not an HTML document".to_string()))?;
        Ok(DocumentCookies { document })
    }
}

impl CookieStore for DocumentCookies {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(cookie::lookup(&self.document.cookie()?, name))
    }

    fn set(&mut self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let cookie = cookie::serialize(name, value, options);
        tracing::debug!("document.cookie = {cookie:?}");
        Ok(self.document.set_cookie(&cookie)?)
    }

    fn remove(&mut self, name: &str, options: &CookieOptions) -> Result<()> {
        Ok(self
            .document
            .set_cookie(&cookie::serialize_removal(name, options))?)
    }
}

pub struct DocumentDom {
    document: web_sys::Document,
}

impl DocumentDom {
    pub fn new(document: web_sys::Document) -> Self {
        DocumentDom { document }
    }
}

impl Dom for DocumentDom {
    type Element = web_sys::Element;

    fn select(&self, selector: &Selector) -> Result<Vec<web_sys::Element>> {
        if let Selector::Tag(tag) = selector {
            if tag == "body" {
                let body = self.document.body().ok_or(Error::NoBody)?;
                return Ok(vec![body.into()]);
            }
        }
        let list = self
            .document
            .query_selector_all(&selector.to_string())
            .map_err(|_| Error::InvalidSelector(selector.to_string()))?;
        Ok((0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .collect())
    }

    fn add_class(&mut self, element: &web_sys::Element, class: &str) -> Result<()> {
        Ok(element.class_list().add_1(class)?)
    }

    fn remove_class(&mut self, element: &web_sys::Element, class: &str) -> Result<()> {
        Ok(element.class_list().remove_1(class)?)
    }
}

/// Reads the JSON config embedded in the page, if any.
pub fn page_config(document: &web_sys::Document) -> Result<ThemeConfig> {
    match document.get_element_by_id(CONFIG_ELEMENT_ID) {
        Some(element) => {
            let json = element.text_content().unwrap_or_default();
            ThemeConfig::from_json(&json)
        }
        None => Ok(ThemeConfig::default()),
    }
}

/// A controller over the live page. Built fresh on every call so it always
/// sees the current cookie jar and markup.
pub fn controller() -> Result<BrowserController> {
    let document = document()?;
    let config = page_config(&document).unwrap_or_else(|err| {
        tracing::warn!("falling back to the default theme config: {err}");
        ThemeConfig::default()
    });
    let cookies = DocumentCookies::new(&document)?;
    Ok(ThemeController::new(
        config,
        cookies,
        DocumentDom::new(document),
    ))
}

fn with_controller<T>(f: impl FnOnce(&mut BrowserController) -> T) -> Option<T> {
    match controller() {
        Ok(mut controller) => Some(f(&mut controller)),
        Err(err) => {
            tracing::warn!("no page to theme: {err}");
            None
        }
    }
}

#[wasm_bindgen(js_name = "hasDarkmode")]
pub fn has_darkmode() -> bool {
    with_controller(|c| c.has_darkmode()).unwrap_or(false)
}

#[wasm_bindgen(js_name = "updateSite")]
pub fn update_site() {
    with_controller(|c| c.update_site());
}

#[wasm_bindgen(js_name = "toggleDarkmode")]
pub fn toggle_darkmode() {
    with_controller(|c| c.toggle_darkmode());
}

/// Syncs the page to the stored preference once the document is ready.
#[wasm_bindgen(js_name = "ready")]
pub fn ready() {
    with_controller(|c| c.ready());
}
