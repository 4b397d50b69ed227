//! Minimal HTTP/1.1 exchange over any `embedded-io-async` stream
//!
//! Only what a sensor node needs: one POST with a JSON body, then a scan of
//! the response that skips headers and logs the body. Status line and header
//! values are never interpreted; only the blank line separating headers from
//! body is used structurally.

use core::fmt::Write as _;

use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

/// Longest response line kept for logging; longer lines are truncated
pub const LINE_CAPACITY: usize = 128;

/// Size of the chunk read from the stream at once
const READ_CHUNK: usize = 64;

/// Write a POST request carrying `body` as `application/json`
///
/// `Content-Length` is the exact byte length of `body`, and exactly that
/// many bytes follow the blank line. The request asks the server to close
/// the connection so the response read terminates.
pub async fn write_request<W: Write>(
    w: &mut W,
    host: &str,
    path: &str,
    body: &str,
) -> Result<(), W::Error> {
    let mut content_length = String::<20>::new();
    // A usize never exceeds 20 decimal digits
    let _ = write!(content_length, "{}", body.len());

    w.write_all(b"POST ").await?;
    w.write_all(path.as_bytes()).await?;
    w.write_all(b" HTTP/1.1\r\nHost: ").await?;
    w.write_all(host.as_bytes()).await?;
    w.write_all(b"\r\nContent-Type: application/json\r\nContent-Length: ")
        .await?;
    w.write_all(content_length.as_bytes()).await?;
    w.write_all(b"\r\nConnection: close\r\n\r\n").await?;
    w.write_all(body.as_bytes()).await?;
    w.flush().await
}

/// What was seen while draining a response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseSummary {
    /// Lines before the blank line, status line included
    pub header_lines: usize,
    /// Whether the blank line ending the headers was seen
    pub headers_complete: bool,
    /// Body lines logged after the headers
    pub body_lines: usize,
    /// Whether the scan reached the end of the response
    pub complete: bool,
}

/// Read the response, recording progress in `summary`
///
/// Header lines are discarded until the blank line; remaining lines are
/// logged. The body ends after `Content-Length` bytes when the server sent
/// that header, otherwise at end of stream. Read errors also end the scan:
/// a connection dropped mid-response is treated as a normal end.
///
/// `summary` is updated as lines arrive, so it stays meaningful if the
/// future is dropped part way through.
pub async fn drain_response<R: Read>(r: &mut R, summary: &mut ResponseSummary) {
    let mut lines = LineReader::new(r);
    let mut line = Vec::<u8, LINE_CAPACITY>::new();
    let mut remaining = None;

    while lines.next_line(&mut line, usize::MAX).await {
        if line.is_empty() {
            summary.headers_complete = true;
            break;
        }
        summary.header_lines += 1;
        if let Some(len) = content_length(&line) {
            remaining = Some(len);
        }
        debug!("< {}", as_text(&line));
    }

    if summary.headers_complete {
        loop {
            let limit = remaining.unwrap_or(usize::MAX);
            if limit == 0 {
                break;
            }
            let before = lines.consumed;
            if !lines.next_line(&mut line, limit).await {
                break;
            }
            if let Some(left) = remaining.as_mut() {
                *left -= lines.consumed - before;
            }
            summary.body_lines += 1;
            info!("{}", as_text(&line));
        }
    }

    summary.complete = true;
}

/// Value of a `Content-Length` header line
fn content_length(line: &[u8]) -> Option<usize> {
    let colon = line.iter().position(|&b| b == b':')?;
    let (name, value) = line.split_at(colon);
    if !name.eq_ignore_ascii_case(b"content-length") {
        return None;
    }
    core::str::from_utf8(&value[1..]).ok()?.trim().parse().ok()
}

fn as_text(line: &[u8]) -> &str {
    match core::str::from_utf8(line) {
        Ok(s) => s,
        // Truncation may split a multi-byte character
        Err(e) => core::str::from_utf8(&line[..e.valid_up_to()]).unwrap_or(""),
    }
}

/// Splits a byte stream into `\n`-terminated lines
struct LineReader<'r, R> {
    reader: &'r mut R,
    buf: [u8; READ_CHUNK],
    pos: usize,
    len: usize,
    done: bool,
    /// Bytes taken from the stream so far, terminators included
    consumed: usize,
}

impl<'r, R: Read> LineReader<'r, R> {
    fn new(reader: &'r mut R) -> Self {
        Self {
            reader,
            buf: [0; READ_CHUNK],
            pos: 0,
            len: 0,
            done: false,
            consumed: 0,
        }
    }

    /// Read the next line into `line`, without its terminator
    ///
    /// At most `limit` bytes are taken from the stream. A trailing `\r` is
    /// stripped. An unterminated final line is returned as-is. Returns
    /// `false` once the stream is exhausted.
    async fn next_line(&mut self, line: &mut Vec<u8, LINE_CAPACITY>, limit: usize) -> bool {
        line.clear();
        let mut taken = 0;

        loop {
            if taken == limit {
                return taken > 0;
            }
            if self.pos == self.len {
                if self.done || !self.fill().await {
                    return taken > 0;
                }
            }

            let byte = self.buf[self.pos];
            self.pos += 1;
            self.consumed += 1;
            taken += 1;

            if byte == b'\n' {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return true;
            }
            // Overlong lines keep their first LINE_CAPACITY bytes
            let _ = line.push(byte);
        }
    }

    async fn fill(&mut self) -> bool {
        match self.reader.read(&mut self.buf).await {
            Ok(0) => {
                self.done = true;
                false
            }
            Ok(n) => {
                self.pos = 0;
                self.len = n;
                true
            }
            Err(_) => {
                debug!("Response read ended with an error");
                self.done = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_io_async::{ErrorKind, ErrorType};

    /// Reader yielding fixed chunks, then EOF or an error
    struct ChunkedReader<'a> {
        chunks: &'a [&'a [u8]],
        fail_at_end: bool,
    }

    impl ErrorType for ChunkedReader<'_> {
        type Error = ErrorKind;
    }

    impl Read for ChunkedReader<'_> {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.chunks.split_first() {
                Some((first, rest)) => {
                    let n = first.len().min(buf.len());
                    buf[..n].copy_from_slice(&first[..n]);
                    if n == first.len() {
                        self.chunks = rest;
                    } else {
                        // Not needed by these tests: chunks fit the buffer
                        unreachable!("chunk larger than read buffer");
                    }
                    Ok(n)
                }
                None if self.fail_at_end => Err(ErrorKind::ConnectionReset),
                None => Ok(0),
            }
        }
    }

    fn drain<R: Read>(r: &mut R) -> ResponseSummary {
        let mut summary = ResponseSummary::default();
        block_on(drain_response(r, &mut summary));
        summary
    }

    struct Sink(std::vec::Vec<u8>);

    impl ErrorType for Sink {
        type Error = ErrorKind;
    }

    impl Write for Sink {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_request_format() {
        let mut sink = Sink(std::vec::Vec::new());
        let body = r#"{"device_id": "n", "sound": 12}"#;
        block_on(write_request(&mut sink, "backend.local", "/api/sound", body)).unwrap();

        let text = std::string::String::from_utf8(sink.0).unwrap();
        let expected = std::format!(
            "POST /api/sound HTTP/1.1\r\n\
             Host: backend.local\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            body.len(),
            body
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_content_length_counts_bytes() {
        let mut sink = Sink(std::vec::Vec::new());
        let body = "{\"device_id\": \"grün\"}";
        block_on(write_request(&mut sink, "h", "/", body)).unwrap();

        let text = std::string::String::from_utf8(sink.0).unwrap();
        let (head, sent_body) = text.split_once("\r\n\r\n").unwrap();
        assert_eq!(sent_body, body);
        let header = std::format!("Content-Length: {}", body.as_bytes().len());
        assert!(head.contains(&header));
        assert_ne!(body.len(), body.chars().count());
    }

    #[test]
    fn test_drain_response() {
        let mut reader = ChunkedReader {
            chunks: &[
                b"HTTP/1.1 201 Created\r\nContent-Type: text/pl",
                b"ain\r\n\r\nstored\r\n",
                b"ok",
            ],
            fail_at_end: false,
        };
        let summary = drain(&mut reader);
        assert_eq!(
            summary,
            ResponseSummary {
                header_lines: 2,
                headers_complete: true,
                body_lines: 2,
                complete: true,
            }
        );
    }

    #[test]
    fn test_drain_response_without_body() {
        let mut reader = ChunkedReader {
            chunks: &[b"HTTP/1.1 204 No Content\r\n\r\n"],
            fail_at_end: false,
        };
        let summary = drain(&mut reader);
        assert!(summary.headers_complete);
        assert_eq!(summary.header_lines, 1);
        assert_eq!(summary.body_lines, 0);
    }

    #[test]
    fn test_drain_response_dropped_mid_headers() {
        let mut reader = ChunkedReader {
            chunks: &[b"HTTP/1.1 200 OK\r\nServer: x"],
            fail_at_end: true,
        };
        let summary = drain(&mut reader);
        assert!(!summary.headers_complete);
        assert_eq!(summary.header_lines, 2);
        assert_eq!(summary.body_lines, 0);
    }

    #[test]
    fn test_drain_empty_stream() {
        let mut reader = ChunkedReader {
            chunks: &[],
            fail_at_end: false,
        };
        let summary = drain(&mut reader);
        assert_eq!(summary.header_lines, 0);
        assert!(!summary.headers_complete);
        assert!(summary.complete);
    }

    #[test]
    fn test_long_line_truncated() {
        let long = [b'a'; 60];
        let mut reader = ChunkedReader {
            chunks: &[&long, &long, &long, b"\n\n"],
            fail_at_end: false,
        };
        let mut lines = LineReader::new(&mut reader);
        let mut line = Vec::<u8, LINE_CAPACITY>::new();
        assert!(block_on(lines.next_line(&mut line, usize::MAX)));
        assert_eq!(line.len(), LINE_CAPACITY);
        assert!(block_on(lines.next_line(&mut line, usize::MAX)));
        assert!(line.is_empty());
        assert!(!block_on(lines.next_line(&mut line, usize::MAX)));
    }

    /// Serves `data`, then blocks forever as a server holding the socket open
    struct HeldOpenReader(&'static [u8]);

    impl ErrorType for HeldOpenReader {
        type Error = ErrorKind;
    }

    impl Read for HeldOpenReader {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            if self.0.is_empty() {
                core::future::pending::<()>().await;
            }
            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_body_ends_at_content_length() {
        let mut reader = HeldOpenReader(b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\nstored\r\nok");
        let summary = drain(&mut reader);
        assert_eq!(
            summary,
            ResponseSummary {
                header_lines: 2,
                headers_complete: true,
                body_lines: 2,
                complete: true,
            }
        );
    }

    #[test]
    fn test_zero_content_length() {
        let mut reader = HeldOpenReader(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");
        let summary = drain(&mut reader);
        assert!(summary.complete);
        assert_eq!(summary.body_lines, 0);
    }

    #[test]
    fn test_content_length_header() {
        assert_eq!(content_length(b"Content-Length: 42"), Some(42));
        assert_eq!(content_length(b"CONTENT-LENGTH:7 "), Some(7));
        assert_eq!(content_length(b"Content-Type: text/plain"), None);
        assert_eq!(content_length(b"Content-Length: many"), None);
        assert_eq!(content_length(b"HTTP/1.1 200 OK"), None);
    }

    #[test]
    fn test_as_text_handles_split_utf8() {
        let bytes = "grün".as_bytes();
        assert_eq!(as_text(&bytes[..3]), "gr");
    }
}
