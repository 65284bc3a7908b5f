use wasm_bindgen::{JsCast, JsValue};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no global `window` exists")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("document has no body")]
    NoBody,
    #[error("javascript exception: {0}")]
    Js(String),
    #[error("invalid selector {0:?}")]
    InvalidSelector(String),
    #[error("invalid theme config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        let message = match value.dyn_ref::<js_sys::Error>() {
            Some(err) => String::from(err.message()),
            None => value.as_string().unwrap_or_else(|| format!("{value:?}")),
        };
        Error::Js(message)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
