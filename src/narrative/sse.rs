//! Server-sent events decoding for streamed chat completions

use std::collections::VecDeque;

use futures::{Stream, StreamExt, stream};

/// One `data:` payload of an event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    /// The `[DONE]` sentinel closing a completion stream
    Done,
}

/// Splits raw bytes into lines and extracts `data:` payloads.
/// Partial lines are buffered until the rest arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk, returning the events completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&line))
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let line = line.trim_end_matches(['\n', '\r']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data == "[DONE]" {
        Some(SseEvent::Done)
    } else if data.is_empty() {
        None
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

struct DecodeState<S, E> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<SseEvent, E>>,
    exhausted: bool,
}

/// Decode a byte stream into events. Transport errors end the stream after
/// being yielded once.
pub fn decode<S, B, E>(bytes: S) -> impl Stream<Item = Result<SseEvent, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.exhausted {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.pending.extend(events.into_iter().map(Ok));
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e));
                    state.exhausted = true;
                }
                None => {
                    state.pending.extend(state.decoder.finish().map(Ok));
                    state.exhausted = true;
                }
            }
        }
    })
}
