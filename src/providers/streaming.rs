//! Streaming response decoding
//!
//! Providers deliver incremental output as newline-delimited wire frames:
//! SSE `data:` lines for the hosted APIs, bare JSON objects for Ollama.
//! This module splits a raw byte stream into lines and provides one pure
//! decode function per wire format, so the parsing logic is testable
//! without a network connection.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::{AgentctlError, Result};
use crate::providers::base::TextStream;

/// A stream adapter that splits a byte stream into complete text lines
///
/// Handles lines split across chunk boundaries (including multi-byte
/// UTF-8 sequences) and flushes a trailing unterminated line when the
/// underlying stream ends. Blank lines are dropped; every wire format
/// handled here uses them only as padding between frames.
pub struct LineStream<S> {
    /// The underlying byte stream
    inner: S,
    /// Incomplete bytes carried over from previous chunks
    buffer: Vec<u8>,
    /// Complete lines ready to be yielded
    lines: VecDeque<String>,
    /// Whether the inner stream has finished (never poll it again)
    done: bool,
}

impl<S> LineStream<S> {
    /// Creates a new line stream from a byte stream
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            lines: VecDeque::new(),
            done: false,
        }
    }

    /// Moves every complete line out of the buffer into the ready queue
    fn drain_buffer(&mut self) -> Result<()> {
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let line = std::str::from_utf8(&self.buffer[start..end])
                .map_err(|e| AgentctlError::Protocol(format!("invalid UTF-8 in stream: {}", e)))?
                .trim_end_matches('\r');
            if !line.trim().is_empty() {
                self.lines.push_back(line.to_string());
            }
            start = end + 1;
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        Ok(())
    }

    /// Flushes an unterminated final line at end of stream
    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let line = std::str::from_utf8(&self.buffer)
            .map_err(|e| AgentctlError::Protocol(format!("invalid UTF-8 in stream: {}", e)))?
            .trim_end_matches('\r');
        if !line.trim().is_empty() {
            self.lines.push_back(line.to_string());
        }
        self.buffer.clear();
        Ok(())
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    if let Err(e) = self.drain_buffer() {
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(AgentctlError::Transport(format!(
                        "stream interrupted: {}",
                        e
                    ))
                    .into())));
                }
                None => {
                    self.done = true;
                    if let Err(e) = self.flush() {
                        return Poll::Ready(Some(Err(e)));
                    }
                    return Poll::Ready(self.lines.pop_front().map(Ok));
                }
            }
        }
    }
}

/// Strips the SSE `data:` prefix from a line, if present
fn sse_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|rest| rest.trim_start())
}

/// Decodes one Anthropic SSE line into a text fragment
///
/// Only `data:` lines carry payloads; `event:` lines and other SSE
/// framing are skipped. Within the payloads, only `content_block_delta`
/// events contribute text. Returns `Ok(None)` for lines that carry no
/// text, and a `Protocol` error when a payload is not valid JSON.
pub fn decode_anthropic_line(line: &str) -> Result<Option<String>> {
    let payload = match sse_payload(line) {
        Some(p) => p,
        None => return Ok(None),
    };
    let event: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| AgentctlError::Protocol(format!("malformed stream event: {}", e)))?;
    if event.get("type").and_then(|t| t.as_str()) != Some("content_block_delta") {
        return Ok(None);
    }
    Ok(event
        .pointer("/delta/text")
        .and_then(|t| t.as_str())
        .map(str::to_string))
}

/// Decodes one OpenAI SSE line into a text fragment
///
/// Skips non-`data:` lines and the `[DONE]` terminator. Returns the
/// first choice's delta content when present, `Ok(None)` otherwise, and
/// a `Protocol` error when a payload is not valid JSON.
pub fn decode_openai_line(line: &str) -> Result<Option<String>> {
    let payload = match sse_payload(line) {
        Some(p) => p,
        None => return Ok(None),
    };
    if payload == "[DONE]" {
        return Ok(None);
    }
    let chunk: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| AgentctlError::Protocol(format!("malformed stream chunk: {}", e)))?;
    Ok(chunk
        .pointer("/choices/0/delta/content")
        .and_then(|c| c.as_str())
        .map(str::to_string))
}

/// Decodes one Ollama NDJSON line into a text fragment
///
/// Every line is a complete JSON object. Records without message content
/// (such as the final `done` record) yield `Ok(None)`; a line that is
/// not valid JSON is a `Protocol` error.
pub fn decode_ollama_line(line: &str) -> Result<Option<String>> {
    let record: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| AgentctlError::Protocol(format!("malformed stream record: {}", e)))?;
    Ok(record
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string))
}

/// Builds a text stream from a byte stream and a per-line decoder
///
/// Lines the decoder maps to `None` are dropped; decode failures and
/// transport interruptions surface as stream errors in place.
pub fn decode_stream<S, E>(bytes: S, decode: fn(&str) -> Result<Option<String>>) -> TextStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(LineStream::new(Box::pin(bytes)).filter_map(move |item| {
        futures::future::ready(match item {
            Ok(line) => decode(&line).transpose(),
            Err(e) => Some(Err(e)),
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(chunks: Vec<&'static str>) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
    }

    async fn collect_lines(
        chunks: Vec<&'static str>,
    ) -> Vec<String> {
        LineStream::new(byte_stream(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_line_stream_complete_lines() {
        let lines = collect_lines(vec!["first\nsecond\n"]).await;
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_line_stream_split_across_chunks() {
        let lines = collect_lines(vec!["hel", "lo\nwor", "ld\n"]).await;
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn test_line_stream_flushes_unterminated_tail() {
        let lines = collect_lines(vec!["first\ntail without newline"]).await;
        assert_eq!(lines, vec!["first", "tail without newline"]);
    }

    #[tokio::test]
    async fn test_line_stream_skips_blank_lines() {
        let lines = collect_lines(vec!["data: a\n\n\ndata: b\n\n"]).await;
        assert_eq!(lines, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn test_line_stream_strips_carriage_return() {
        let lines = collect_lines(vec!["data: a\r\ndata: b\r\n"]).await;
        assert_eq!(lines, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn test_line_stream_utf8_split_across_chunks() {
        // The snowman is three bytes; split it mid-character
        let snowman = "☃".as_bytes();
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from([b"cold ".as_slice(), &snowman[..2]].concat())),
            Ok(Bytes::from([&snowman[2..], b" day\n"].concat())),
        ];
        let lines: Vec<String> = LineStream::new(stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(lines, vec!["cold ☃ day"]);
    }

    #[tokio::test]
    async fn test_line_stream_transport_error_surfaces() {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from("data: a\n")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
        ];
        let mut stream = LineStream::new(stream::iter(chunks));
        assert_eq!(stream.next().await.unwrap().unwrap(), "data: a");
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("stream interrupted"));
    }

    #[test]
    fn test_decode_anthropic_delta() {
        let line = r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(decode_anthropic_line(line).unwrap(), Some("Hi".to_string()));
    }

    #[test]
    fn test_decode_anthropic_skips_other_events() {
        let line = r#"data: {"type":"message_start","message":{}}"#;
        assert_eq!(decode_anthropic_line(line).unwrap(), None);
        assert_eq!(
            decode_anthropic_line("event: content_block_delta").unwrap(),
            None
        );
    }

    #[test]
    fn test_decode_anthropic_malformed_payload() {
        assert!(decode_anthropic_line("data: {not json").is_err());
    }

    #[test]
    fn test_decode_openai_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(decode_openai_line(line).unwrap(), Some("Hello".to_string()));
    }

    #[test]
    fn test_decode_openai_done_sentinel() {
        assert_eq!(decode_openai_line("data: [DONE]").unwrap(), None);
    }

    #[test]
    fn test_decode_openai_empty_delta() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(decode_openai_line(line).unwrap(), None);
    }

    #[test]
    fn test_decode_openai_malformed_payload() {
        assert!(decode_openai_line("data: {bad").is_err());
    }

    #[test]
    fn test_decode_ollama_content() {
        let line = r#"{"message":{"role":"assistant","content":"Hey"},"done":false}"#;
        assert_eq!(decode_ollama_line(line).unwrap(), Some("Hey".to_string()));
    }

    #[test]
    fn test_decode_ollama_done_record() {
        let line = r#"{"done":true,"eval_count":42}"#;
        assert_eq!(decode_ollama_line(line).unwrap(), None);
    }

    #[test]
    fn test_decode_ollama_malformed_line() {
        assert!(decode_ollama_line("not json at all").is_err());
    }

    #[tokio::test]
    async fn test_decode_stream_end_to_end() {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            )),
            Ok(Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
            )),
        ];
        let mut stream = decode_stream(stream::iter(chunks), decode_openai_line);
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment.unwrap());
        }
        assert_eq!(text, "Hello");
    }
}
