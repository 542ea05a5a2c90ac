//! Browser bindings of the infinite scroll: web-sys document access, fetch transport and the
//! `InfiniteAjaxScroll` class exported to javascript.

pub mod infinite_ajax_scroll;
pub mod transport;
pub mod web_dom;

pub use infinite_ajax_scroll::{InfiniteAjaxScroll, PendingRequest};
pub use transport::GlooTransport;
pub use web_dom::WebDom;

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn init() {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Info);
    console_error_panic_hook::set_once();
}
