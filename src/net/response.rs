//! Response model and wire serialization.
//!
//! Every response goes through [`Response::head`], so all of them carry the
//! same cross-origin headers, an explicit `Content-Length` and
//! `Connection: close`.

use core::fmt::Write as _;
use std::borrow::Cow;

use log::error;
use serde::Serialize;

use crate::config::CHUNK_SIZE;

/// Upper bound of a serialized head (longest status line and a 5-digit length).
pub const HEAD_CAPACITY: usize = 256;

pub type Head = heapless::String<HEAD_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    PayloadTooLarge,
    InternalServerError,
    ServiceUnavailable,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::PayloadTooLarge => 413,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Json,
    Text,
}

impl ContentType {
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: ContentType,
    pub body: Cow<'static, [u8]>,
}

impl Response {
    pub fn text(status: Status, body: &'static str) -> Self {
        Self { status, content_type: ContentType::Text, body: Cow::Borrowed(body.as_bytes()) }
    }

    pub fn html(body: &'static str) -> Self {
        Self { status: Status::Ok, content_type: ContentType::Html, body: Cow::Borrowed(body.as_bytes()) }
    }

    /// Serialize `value` as the JSON body. A serializer failure degrades to
    /// a plain 500.
    pub fn json<T: Serialize>(status: Status, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, content_type: ContentType::Json, body: Cow::Owned(body) },
            Err(e) => {
                error!("HTTP | JSON encoding failed: {}", e);
                Self::internal_error()
            }
        }
    }

    pub fn bad_request() -> Self {
        Self::text(Status::BadRequest, "Bad Request")
    }

    pub fn not_found() -> Self {
        Self::text(Status::NotFound, "404 Not Found")
    }

    pub fn too_large() -> Self {
        Self::text(Status::PayloadTooLarge, "Payload Too Large")
    }

    pub fn internal_error() -> Self {
        Self::text(Status::InternalServerError, "Internal Server Error")
    }

    pub fn head(&self) -> Head {
        let mut head = Head::new();
        // Bounded by HEAD_CAPACITY for every status and any body length
        // the server can produce.
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type.mime(),
            self.body.len(),
        );
        head
    }
}

/// A response being streamed to one connection.
#[derive(Debug)]
pub struct Outbound {
    head: Head,
    body: Cow<'static, [u8]>,
    cursor: usize,
    head_sent: bool,
}

impl Outbound {
    pub fn new(response: Response) -> Self {
        Self { head: response.head(), body: response.body, cursor: 0, head_sent: false }
    }

    /// Head bytes, exactly once.
    pub fn take_head(&mut self) -> Option<&[u8]> {
        if self.head_sent {
            return None;
        }
        self.head_sent = true;
        Some(self.head.as_bytes())
    }

    /// Next body chunk of at most [`CHUNK_SIZE`] bytes.
    pub fn next_chunk(&mut self) -> Option<&[u8]> {
        if self.cursor >= self.body.len() {
            return None;
        }
        let end = (self.cursor + CHUNK_SIZE).min(self.body.len());
        let chunk = &self.body[self.cursor..end];
        self.cursor = end;
        Some(chunk)
    }

    pub fn remaining(&self) -> usize {
        self.body.len() - self.cursor
    }
}
