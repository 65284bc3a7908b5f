#![allow(non_snake_case)]

use dioxus::prelude::*;
use tracing::Level;

use darkmode::{browser, toggle::ThemeToggle};

const PAGES: &[(&str, &str)] = &[("Home", "/"), ("Sitemap", "/sitemap"), ("Admin", "/admin")];

fn main() {
    console_error_panic_hook::set_once();

    dioxus_logger::init(Level::INFO).expect("logger failed to init");

    launch(App);
}

#[component]
fn App() -> Element {
    use_effect(move || {
        browser::ready();
    });

    rsx! {
        nav { class: "navbar navbar-expand",
            span { class: "navbar-brand", "markdown" }
            div { class: "dropdown",
                button { class: "btn dropdown-toggle", "Pages" }
                ul { class: "dropdown-menu",
                    for (name , href) in PAGES.iter() {
                        li { key: "{href}",
                            a { class: "dropdown-item", href: "{href}", "{name}" }
                        }
                    }
                }
            }
            ThemeToggle {}
        }
        main { class: "container",
            h1 { "Folder overview" }
            table { class: "table",
                thead {
                    tr {
                        th { "Page" }
                        th { "Path" }
                    }
                }
                tbody {
                    for (name , href) in PAGES.iter() {
                        tr { key: "{href}",
                            td { "{name}" }
                            td { "{href}" }
                        }
                    }
                }
            }
        }
    }
}
