//! Request accumulation and parsing.
//!
//! Bytes are collected into one buffer per connection until the head
//! terminator (`\r\n\r\n`) and any declared `Content-Length` body have
//! arrived. The buffer never grows past [`MAX_REQUEST_SIZE`]: both the raw
//! byte count and the declared length are checked before reserving.

use core::num::IntErrorKind;

use crate::config::MAX_REQUEST_SIZE;

const HEAD_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// The request would exceed [`MAX_REQUEST_SIZE`].
    TooLarge,
    /// Buffer space could not be reserved.
    OutOfMemory,
    /// The request line is missing or malformed.
    BadRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More bytes are needed.
    Partial,
    /// The full request is buffered.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// A parsed request, borrowing from the connection's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,
    /// Target path without the query string.
    pub path: &'a str,
    pub body: &'a [u8],
}

#[derive(Debug, Default)]
pub struct RequestBuffer {
    buf: Vec<u8>,
    /// Offset of the first body byte, once the head terminator is seen.
    body_start: Option<usize>,
    content_length: usize,
}

impl RequestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append received bytes.
    pub fn push(&mut self, data: &[u8]) -> Result<Progress, RequestError> {
        if self.buf.len() + data.len() > MAX_REQUEST_SIZE {
            return Err(RequestError::TooLarge);
        }
        self.buf.try_reserve(data.len()).map_err(|_| RequestError::OutOfMemory)?;
        self.buf.extend_from_slice(data);

        if self.body_start.is_none() {
            let Some(pos) = find(&self.buf, HEAD_END) else {
                return Ok(Progress::Partial);
            };
            let body_start = pos + HEAD_END.len();
            let declared = content_length(&self.buf[..pos])?;
            if declared > MAX_REQUEST_SIZE.saturating_sub(body_start) {
                return Err(RequestError::TooLarge);
            }
            self.body_start = Some(body_start);
            self.content_length = declared;
        }

        match self.body_start {
            Some(start) if self.buf.len() >= start + self.content_length => Ok(Progress::Complete),
            _ => Ok(Progress::Partial),
        }
    }

    /// Parse the buffered request. Only meaningful once `push` reported
    /// [`Progress::Complete`].
    pub fn parse(&self) -> Result<Request<'_>, RequestError> {
        let start = self.body_start.ok_or(RequestError::BadRequest)?;
        let head = core::str::from_utf8(&self.buf[..start]).map_err(|_| RequestError::BadRequest)?;
        let line = head.lines().next().ok_or(RequestError::BadRequest)?;

        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RequestError::BadRequest);
        };
        if method.is_empty() || !target.starts_with('/') || !version.starts_with("HTTP/") {
            return Err(RequestError::BadRequest);
        }

        let method = match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other,
        };
        let path = target.split_once('?').map_or(target, |(p, _)| p);
        let end = (start + self.content_length).min(self.buf.len());
        Ok(Request { method, path, body: &self.buf[start..end] })
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Declared body length from the head; `0` when absent. A number too big
/// for `usize` is still a length, just an oversize one.
fn content_length(head: &[u8]) -> Result<usize, RequestError> {
    let head = core::str::from_utf8(head).map_err(|_| RequestError::BadRequest)?;
    for line in head.split("\r\n").skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                return value.trim().parse::<usize>().map_err(|e| match e.kind() {
                    IntErrorKind::PosOverflow => RequestError::TooLarge,
                    _ => RequestError::BadRequest,
                });
            }
        }
    }
    Ok(0)
}
