pub const SCROLL_THROTTLE_DELAY_MS: f64 = 200.0;


pub const WINDOW_TARGET: &str = "window";
pub const CSS1_COMPAT_MODE: &str = "CSS1Compat";
pub const CONTAINER_PROPERTY: &str = "container";
pub const SCROLL_CONTAINER_PROPERTY: &str = "options.scrollContainer";


pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
