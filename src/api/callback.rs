use std::sync::Arc;

use axum::{Extension, extract::Query, response::Html};

use crate::{server::RedirectListener, types::CallbackParams};

// The authorization window closes itself whatever the outcome; the CLI
// reports success or failure.
const CLOSE_WINDOW_PAGE: &str = "<!doctype html><html><head><title>tubify</title></head>\
<body><p>You can close this window.</p>\
<script>window.close();</script></body></html>";

pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(listener): Extension<Arc<RedirectListener>>,
) -> Html<&'static str> {
    listener.deliver(params);
    Html(CLOSE_WINDOW_PAGE)
}
