use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::request::Request;

use super::{Middleware, Next, from_fn};

/// Per-request span with method, path, status and latency.
pub fn trace() -> Middleware {
    from_fn(|req: Request, next: Next| async move {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        let start = Instant::now();

        let res = next.run(req).instrument(span.clone()).await;

        info!(
            parent: &span,
            status = res.status_code().as_u16(),
            latency_us = start.elapsed().as_micros() as u64,
            "request completed"
        );
        res
    })
}
