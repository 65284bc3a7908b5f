#![allow(non_snake_case)]

use dioxus::prelude::*;

use crate::browser;

/// The navbar control. Holds both indicators; which one is visible is decided
/// by the theme controller, not by this component.
#[component]
pub fn ThemeToggle() -> Element {
    rsx! {
        button {
            class: "btn btn-link nav-link",
            title: "Toggle dark mode",
            onclick: move |_| browser::toggle_darkmode(),
            span { id: "dark-on", class: "d-none", "Dark" }
            span { id: "dark-off", "Light" }
        }
    }
}
