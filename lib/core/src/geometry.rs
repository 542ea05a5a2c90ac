use crate::dom::{BoxMetrics, CompatMode, Dom, Rect, ScrollContainer, ScrollPosition};

/// Current scroll offsets of `container`.
///
/// For the viewport, the page offsets are preferred. Hosts without them fall back on the
/// `<html>` box in standards mode and on the `<body>` box in quirks mode.
pub fn get_scroll_position<D: Dom>(dom: &D, container: &ScrollContainer<D::Element>) -> ScrollPosition {
    match container {
        ScrollContainer::Element(element) => dom.scroll_offsets(element),
        ScrollContainer::Viewport => {
            let metrics = dom.viewport_metrics();
            if let Some(page_offset) = metrics.page_offset {
                return page_offset;
            }
            let scroll_box = match metrics.compat_mode {
                CompatMode::Css1Compat => metrics.document_element,
                CompatMode::BackCompat => metrics.body,
            }.unwrap_or_default();
            ScrollPosition {
                x: scroll_box.scroll_left,
                y: scroll_box.scroll_top,
            }
        }
    }
}

/// Visible rectangle of `container`.
///
/// The viewport is measured with the `<html>`/`<body>` client size rather than the window size
/// because scroll bars take up room.
pub fn get_root_rect<D: Dom>(dom: &D, container: &ScrollContainer<D::Element>) -> Rect {
    match container {
        ScrollContainer::Element(element) => dom.bounding_client_rect(element),
        ScrollContainer::Viewport => {
            let metrics = dom.viewport_metrics();
            let html = metrics.document_element.unwrap_or_default();
            let body = metrics.body.unwrap_or_default();
            viewport_rect(&html, &body)
        }
    }
}

fn viewport_rect(html: &BoxMetrics, body: &BoxMetrics) -> Rect {
    let width = html.client_width.max(body.client_width);
    let height = html.client_height.max(body.client_height);
    Rect::new(0.0, 0.0, width, height)
}

/// Vertical gap between the bottom of `sentinel` and the bottom of the visible part of `container`.
///
/// Zero or less means the sentinel reached the fold.
pub fn get_distance_to_fold<D: Dom>(dom: &D, sentinel: &D::Element, container: &ScrollContainer<D::Element>) -> f64 {
    let scroll = get_scroll_position(dom, container);
    let root_rect = get_root_rect(dom, container);
    let bounding_rect = dom.bounding_client_rect(sentinel);
    distance_to_fold(scroll, root_rect, bounding_rect)
}

/// Same as [`get_distance_to_fold`] with the scroll offsets and both rects already measured.
pub fn distance_to_fold(scroll: ScrollPosition, root_rect: Rect, sentinel_rect: Rect) -> f64 {
    let scroll_y_bottom = scroll.y + root_rect.height;
    let bottom = scroll.y + sentinel_rect.bottom - root_rect.top;
    bottom - scroll_y_bottom
}
