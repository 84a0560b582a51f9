//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; a line may straddle two chunks, so the
//! decoder buffers until it sees a newline. Only `data:` lines are surfaced.
//! Each data line is treated as its own payload, which matches how the
//! completion service frames its deltas.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return the payloads of every complete
    /// `data:` line it finished.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = parse_line(&line[..line.len() - 1]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line)
    }
}

fn parse_line(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = String::from_utf8_lossy(line);
    let rest = text.strip_prefix("data:")?;
    let payload = rest.strip_prefix(' ').unwrap_or(rest);
    Some(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"data: {\"a\":1}\n");
        assert_eq!(out, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"choi").is_empty());
        let out = decoder.feed(b"ces\":[]}\n\n");
        assert_eq!(out, vec!["{\"choices\":[]}".to_string()]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"data: one\r\n\r\ndata: two\r\n");
        assert_eq!(out, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b": keep-alive\nevent: message\nid: 7\ndata: x\n");
        assert_eq!(out, vec!["x".to_string()]);
    }

    #[test]
    fn test_data_without_space() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data:[DONE]\n"), vec!["[DONE]".to_string()]);
    }

    #[test]
    fn test_multibyte_split_inside_character() {
        let text = "data: r\u{e8}gle\n".as_bytes();
        // Split in the middle of the two-byte 'è'.
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&text[..split]).is_empty());
        assert_eq!(decoder.feed(&text[split..]), vec!["r\u{e8}gle".to_string()]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_on_empty_buffer() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: a\n");
        assert_eq!(decoder.finish(), None);
    }
}
