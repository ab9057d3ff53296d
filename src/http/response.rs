//! Response writer handed to handlers.
//!
//! # Responsibilities
//! - Accumulate status, headers, and body bytes for one response
//! - Stream encoder output through the standard write trait
//! - Convert into a transport response at the edge
//!
//! # Design Decisions
//! - Status defaults to 200 OK; handlers that never touch it still
//!   produce a well-formed response
//! - The body buffers in memory; responses here are handler-sized, not
//!   streamed payloads

use std::io;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};

/// Buffered response under construction.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Append bytes to the body.
    pub fn send(&mut self, bytes: impl AsRef<[u8]>) {
        self.body.extend_from_slice(bytes.as_ref());
    }

    /// Finish the response for the transport layer.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use std::io::Write;

    #[test]
    fn defaults_to_200_with_an_empty_body() {
        let w = ResponseWriter::new();
        assert_eq!(w.status(), StatusCode::OK);
        assert!(w.body().is_empty());
    }

    #[test]
    fn send_appends_bytes() {
        let mut w = ResponseWriter::new();
        w.send("hello, ");
        w.send(b"world");
        assert_eq!(w.body(), b"hello, world");
    }

    #[test]
    fn io_write_streams_into_the_body() {
        let mut w = ResponseWriter::new();
        write!(w, "{}-{}", 4, 2).unwrap();
        assert_eq!(w.body(), b"4-2");
    }

    #[test]
    fn into_response_carries_status_and_headers() {
        let mut w = ResponseWriter::new();
        w.set_status(StatusCode::CREATED);
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        w.send("done");

        let response = w.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/plain"))
        );
    }
}
