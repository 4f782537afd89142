//! Server-sent-event decoding over a streamed HTTP body.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::ClientError;

/// One named event pushed by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSentEvent {
    /// Value of the `event:` field, if the frame had one.
    pub event: Option<String>,
    /// `data:` lines of the frame joined with `\n`.
    pub data: String,
}

impl ServerSentEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.event.as_deref()
    }
}

/// Lazily consumed sequence of events from an update stream.
pub type EventStream =
    Pin<Box<dyn futures::Stream<Item = Result<ServerSentEvent, ClientError>> + Send + 'static>>;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Incremental line-oriented decoder; chunks may split lines at any byte.
///
/// Lines end in `\n`, `\r\n` or `\r`, mixed freely within one stream. An
/// empty line dispatches the fields collected since the previous one.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    // A `\r` ended the last line; a `\n` right after it belongs to that ending.
    after_cr: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<ServerSentEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.line);
                    if let Some(event) = self.end_line(&line) {
                        events.push(event);
                    }
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self, line: &[u8]) -> Option<ServerSentEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry carry nothing the update stream relies on
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerSentEvent> {
        let event = self.event.take();
        if event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(ServerSentEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Turns a streamed response body into a lazy event stream.
pub(crate) fn event_stream(bytes_stream: ByteStream) -> EventStream {
    struct State {
        bytes_stream: ByteStream,
        decoder: SseDecoder,
        pending: VecDeque<ServerSentEvent>,
        done: bool,
    }

    let events = stream::try_unfold(
        State {
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.decoder.push_chunk(&chunk));
                    }
                    Some(Err(e)) => {
                        return Err(ClientError::transport("event stream read failed", e));
                    }
                    None => {
                        debug!(event = "sse.stream_closed", domain = "sse");
                        state.done = true;
                    }
                }
            }
        },
    );
    Box::pin(events)
}
