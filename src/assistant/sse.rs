//! Incremental decoder for the generation endpoint's event stream
//!
//! The body is a sequence of newline-terminated lines. Only `data:` lines
//! matter: `data: [DONE]` ends the stream and every other `data:` line
//! carries a JSON object whose `choices[0].delta.content` is the next
//! piece of the reply. Blank lines, `:` comments and other fields are
//! skipped.
//!
//! The decoder works on bytes and only decodes complete lines, so a chunk
//! boundary may fall anywhere, including inside a multi-byte character.

/// Something decoded from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// The next piece of reply text
    Delta(String),
    /// The end sentinel was seen
    Done,
}

enum Line {
    Skip,
    Delta(String),
    Done,
    Malformed,
}

/// Stateful line decoder
///
/// # Examples
///
/// ```
/// use marketa::assistant::{SseDecoder, SseEvent};
///
/// let mut decoder = SseDecoder::new();
/// assert!(decoder.push(b"data: {\"choices\":[{\"delta\":{\"con").is_empty());
/// let events = decoder.push(b"tent\":\"Hi\"}}]}\n\ndata: [DONE]\n\n");
/// assert_eq!(events, vec![SseEvent::Delta("Hi".to_string()), SseEvent::Done]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    carry: Option<Vec<u8>>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once `[DONE]` has been decoded
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and return whatever it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            self.handle_line(&line, &mut events);
            if self.done {
                self.buffer.clear();
                break;
            }
        }

        events
    }

    /// Flush what is left once the body has ended
    ///
    /// A final line without a trailing newline is still decoded. A
    /// malformed line that never got completed is dropped.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let mut line = std::mem::take(&mut self.buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.handle_line(&line, &mut events);
        }

        if self.carry.take().is_some() {
            tracing::warn!("Stream ended with an undecodable line");
        }
        events
    }

    fn handle_line(&mut self, line: &[u8], events: &mut Vec<SseEvent>) {
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }

        // A line that failed to decode earlier gets one more chance joined
        // with the next one.
        if let Some(mut carried) = self.carry.take() {
            carried.extend_from_slice(line);
            match decode_line(&carried) {
                Line::Malformed => {
                    tracing::warn!(
                        "Dropping undecodable stream line: {}",
                        String::from_utf8_lossy(&carried)
                    );
                }
                outcome => {
                    self.apply(outcome, events);
                    return;
                }
            }
        }

        match decode_line(line) {
            Line::Malformed => {
                tracing::debug!("Re-buffering incomplete stream line");
                self.carry = Some(line.to_vec());
            }
            outcome => self.apply(outcome, events),
        }
    }

    fn apply(&mut self, outcome: Line, events: &mut Vec<SseEvent>) {
        match outcome {
            Line::Delta(text) => events.push(SseEvent::Delta(text)),
            Line::Done => {
                self.done = true;
                self.carry = None;
                events.push(SseEvent::Done);
            }
            Line::Skip | Line::Malformed => {}
        }
    }
}

fn decode_line(line: &[u8]) -> Line {
    let Ok(text) = std::str::from_utf8(line) else {
        return Line::Malformed;
    };

    if text.starts_with(':') {
        return Line::Skip;
    }

    let Some(data) = text.strip_prefix("data:") else {
        return Line::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Line::Done;
    }

    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) => match value
            .pointer("/choices/0/delta/content")
            .and_then(|v| v.as_str())
        {
            Some(content) if !content.is_empty() => Line::Delta(content.to_string()),
            _ => Line::Skip,
        },
        Err(_) => Line::Malformed,
    }
}
