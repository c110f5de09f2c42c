//! Incremental `text/event-stream` decoder.
//!
//! Fed with raw body chunks as they arrive; yields the `data:` payload of
//! every complete event. Chunk boundaries may fall anywhere, including inside
//! a multi-byte character or between the two bytes of a CRLF, so bytes are
//! buffered until a full line exists.

use crate::error::{SyncError, SyncResult};

/// Pure line-oriented SSE decoder. No IO.
#[derive(Debug)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line.
    partial: Vec<u8>,

    /// `data:` lines of the event being assembled.
    data: Vec<String>,
    data_len: usize,

    /// Last byte seen was a `\r`; a following `\n` belongs to it.
    after_cr: bool,

    /// Upper bound for one line and for one assembled event.
    max_line: usize,
}

impl SseDecoder {
    pub fn new(max_line: usize) -> Self {
        Self {
            partial: Vec::new(),
            data: Vec::new(),
            data_len: 0,
            after_cr: false,
            max_line,
        }
    }

    /// Consumes one chunk, returning the payloads of events it completed.
    ///
    /// Lines end with `\n`, `\r\n` or a lone `\r`. A line or event larger
    /// than `max_line` is a stream error; the decoder is reset and the
    /// caller is expected to drop the connection.
    pub fn feed(&mut self, chunk: &[u8]) -> SyncResult<Vec<String>> {
        let mut out = Vec::new();

        for &byte in chunk {
            match byte {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.partial);
                    if let Some(payload) = self.process_line(&line) {
                        out.push(payload);
                    }
                }
                _ => {
                    self.after_cr = false;
                    self.partial.push(byte);
                }
            }

            if self.partial.len() + self.data_len > self.max_line {
                self.reset();
                return Err(SyncError::Stream(format!(
                    "event exceeds {} bytes",
                    self.max_line
                )));
            }
        }

        Ok(out)
    }

    fn reset(&mut self) {
        self.partial.clear();
        self.data.clear();
        self.data_len = 0;
        self.after_cr = false;
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(raw);

        if line.is_empty() {
            return self.dispatch();
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line.as_ref(), ""),
        };

        if field == "data" {
            self.data_len += value.len() + 1;
            self.data.push(value.to_string());
        } else {
            log::trace!("[SSE] ignoring field {:?}", field);
        }

        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        self.data_len = 0;
        Some(payload)
    }
}
