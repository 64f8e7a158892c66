// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental SSE frame decoder.
//!
//! Turns an HTTP body byte stream into the ordered sequence of `data: ` payloads.
//! Chunk boundaries never align with line boundaries, so bytes are buffered until
//! a full line is available; splitting on `\n` keeps multi-byte UTF-8 sequences
//! intact across chunks.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::Stream;
use pin_project_lite::pin_project;
use streamchat_core::{ChatError, PayloadStream};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of decoding one complete line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Payload(String),
    Done,
    Skip,
}

fn decode_line(raw: &[u8]) -> Line {
    let text = String::from_utf8_lossy(raw);
    let Some(rest) = text.trim().strip_prefix(DATA_PREFIX) else {
        return Line::Skip;
    };
    match rest.trim() {
        DONE_SENTINEL => Line::Done,
        "" => Line::Skip,
        payload => Line::Payload(payload.to_string()),
    }
}

/// Longest line the decoder will buffer before giving up on the stream.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

pin_project! {
    /// Lazy decoder over a byte-chunk stream. Finite and not restartable.
    pub struct FrameDecoder<S> {
        #[pin]
        inner: S,
        buffer: Vec<u8>,
        // Prefix of `buffer` already known to hold no newline.
        scanned: usize,
        max_line: usize,
        finished: bool,
    }
}

impl<S> FrameDecoder<S> {
    pub fn new(inner: S) -> Self {
        Self::with_line_limit(inner, MAX_LINE_BYTES)
    }

    /// Decoder that fails the stream once a single line exceeds `max_line` bytes.
    pub fn with_line_limit(inner: S, max_line: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            finished: false,
        }
    }
}

impl<S, B, E> Stream for FrameDecoder<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<String, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if *this.finished {
                return Poll::Ready(None);
            }

            let newline = this.buffer[*this.scanned..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|offset| *this.scanned + offset);
            *this.scanned = this.buffer.len();

            if let Some(pos) = newline {
                let line: Vec<u8> = this.buffer.drain(..=pos).collect();
                *this.scanned = 0;
                match decode_line(&line) {
                    Line::Payload(payload) => return Poll::Ready(Some(Ok(payload))),
                    Line::Done => {
                        tracing::debug!("stream completed with [DONE]");
                        *this.finished = true;
                        this.buffer.clear();
                        return Poll::Ready(None);
                    }
                    Line::Skip => continue,
                }
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.buffer.extend_from_slice(chunk.as_ref());
                    if this.buffer.len() > *this.max_line
                        && !this.buffer[*this.scanned..].contains(&b'\n')
                    {
                        *this.finished = true;
                        this.buffer.clear();
                        return Poll::Ready(Some(Err(ChatError::transport(format!(
                            "stream line exceeds {} bytes",
                            this.max_line
                        )))));
                    }
                }
                Some(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(ChatError::Transport {
                        message: format!("stream aborted: {e}"),
                        source: Some(Box::new(e)),
                    })));
                }
                None => {
                    *this.finished = true;
                    // Unterminated trailing line.
                    let rest = std::mem::take(this.buffer);
                    return match decode_line(&rest) {
                        Line::Payload(payload) => Poll::Ready(Some(Ok(payload))),
                        Line::Done | Line::Skip => Poll::Ready(None),
                    };
                }
            }
        }
    }
}

/// Decodes a streaming HTTP response body into a boxed payload stream.
pub fn decode_response(response: reqwest::Response) -> PayloadStream {
    Box::pin(FrameDecoder::new(response.bytes_stream()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::executor::block_on;
    use futures::stream;
    use proptest::prelude::*;

    fn decode_chunks(chunks: Vec<Vec<u8>>) -> Vec<Result<String, ChatError>> {
        let source = stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
        block_on(FrameDecoder::new(source).collect::<Vec<_>>())
    }

    fn payloads(chunks: Vec<Vec<u8>>) -> Vec<String> {
        decode_chunks(chunks)
            .into_iter()
            .map(|r| r.expect("no transport errors expected"))
            .collect()
    }

    #[test]
    fn strips_prefix_and_whitespace() {
        let body = b"data:   {\"text\":\"Hi\"}  \r\n".to_vec();
        assert_eq!(payloads(vec![body]), vec!["{\"text\":\"Hi\"}"]);
    }

    #[test]
    fn buffers_lines_split_across_chunks() {
        let chunks = vec![
            b"da".to_vec(),
            b"ta: {\"te".to_vec(),
            b"xt\":\"a\"}\ndata: {\"text\"".to_vec(),
            b":\"b\"}\n".to_vec(),
        ];
        assert_eq!(
            payloads(chunks),
            vec!["{\"text\":\"a\"}", "{\"text\":\"b\"}"]
        );
    }

    #[test]
    fn done_terminates_without_emitting() {
        let body = b"data: one\ndata: [DONE]\ndata: two\n".to_vec();
        assert_eq!(payloads(vec![body]), vec!["one"]);
    }

    #[test]
    fn non_data_lines_are_skipped() {
        let body = b": keep-alive\nevent: message\n\ndata: x\nid: 7\n".to_vec();
        assert_eq!(payloads(vec![body]), vec!["x"]);
    }

    #[test]
    fn trailing_unterminated_line_is_flushed() {
        let body = b"data: first\ndata: last".to_vec();
        assert_eq!(payloads(vec![body]), vec!["first", "last"]);
    }

    #[test]
    fn multibyte_character_split_between_chunks() {
        let line = "data: {\"text\":\"こんにちは\"}\n".as_bytes().to_vec();
        // Cut inside the first three-byte character.
        let cut = line.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let chunks = vec![line[..cut].to_vec(), line[cut..].to_vec()];
        assert_eq!(payloads(chunks), vec!["{\"text\":\"こんにちは\"}"]);
    }

    #[test]
    fn long_line_in_tiny_chunks() {
        let text = "x".repeat(20_000);
        let line = format!("data: {text}\ndata: tail\n");
        let chunks: Vec<Vec<u8>> = line.as_bytes().chunks(1).map(|c| c.to_vec()).collect();
        assert_eq!(payloads(chunks), vec![text, "tail".to_string()]);
    }

    #[test]
    fn oversized_line_fails_the_stream() {
        let chunks = vec![b"data: ".to_vec(), vec![b'y'; 64], b"\n".to_vec()];
        let source = stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
        let items = block_on(FrameDecoder::with_line_limit(source, 32).collect::<Vec<_>>());
        assert_eq!(items.len(), 1);
        let err = items[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("exceeds 32 bytes"), "{err}");
    }

    #[test]
    fn limit_applies_per_line_not_per_chunk() {
        let body = b"data: aaaa\ndata: bbbb\ndata: cccc\n".to_vec();
        let source = stream::iter(vec![Ok::<_, std::io::Error>(body)]);
        let items = block_on(FrameDecoder::with_line_limit(source, 12).collect::<Vec<_>>());
        let payloads: Vec<String> = items.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(payloads, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn transport_error_ends_the_sequence() {
        let source = stream::iter(vec![
            Ok(b"data: a\n".to_vec()),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
            Ok(b"data: b\n".to_vec()),
        ]);
        let items = block_on(FrameDecoder::new(source).collect::<Vec<_>>());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        let err = items[1].as_ref().unwrap_err();
        assert!(err.is_retryable(), "mid-stream abort must be retryable");
    }

    proptest! {
        #[test]
        fn chunking_never_changes_the_payloads(
            texts in proptest::collection::vec("[a-zA-Z0-9 ぁ-ゖ]{0,12}", 0..8),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
        ) {
            let mut body = String::new();
            for text in &texts {
                body.push_str(&format!("data: {}\n", serde_json::json!({ "text": text })));
            }
            body.push_str("data: [DONE]\n");
            let bytes = body.into_bytes();

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();
            let mut chunks = Vec::new();
            let mut start = 0;
            for p in points {
                chunks.push(bytes[start..p].to_vec());
                start = p;
            }
            chunks.push(bytes[start..].to_vec());

            let expected: Vec<String> = texts
                .iter()
                .map(|t| serde_json::json!({ "text": t }).to_string())
                .collect();
            prop_assert_eq!(payloads(chunks), expected);
        }
    }
}
