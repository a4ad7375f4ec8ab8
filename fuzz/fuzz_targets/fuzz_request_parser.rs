//! Fuzz target: `RequestBuffer::push` / `RequestBuffer::parse`
//!
//! The first byte picks a split point; the rest is fed in two pieces, the
//! way a request arrives over several TCP segments. The buffer must never
//! panic or grow past the request limit, and a parsed body must lie inside
//! what was received.
//!
//! cargo fuzz run fuzz_request_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use weather_station::config::MAX_REQUEST_SIZE;
use weather_station::net::request::{Progress, RequestBuffer};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(split).min(rest.len());
    let (first, second) = rest.split_at(at);

    let mut buf = RequestBuffer::new();
    let mut progress = buf.push(first);
    if matches!(progress, Ok(Progress::Partial)) {
        progress = buf.push(second);
    }
    assert!(buf.len() <= MAX_REQUEST_SIZE);

    if let Ok(Progress::Complete) = progress {
        if let Ok(req) = buf.parse() {
            assert!(req.path.starts_with('/'));
            assert!(req.body.len() <= buf.len());
        }
    }
});
