use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Splits a chunked byte stream into complete lines.
///
/// Bytes are buffered until a `\n` arrives, so both partial lines and
/// multi-byte UTF-8 sequences survive arbitrary chunk boundaries. A `\n` byte
/// never occurs inside a multi-byte sequence, which makes every complete line
/// valid to decode on its own. A byte order mark at the very start of the
/// stream is dropped; later ones are kept as text.
#[derive(Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already searched for `\n`.
    scanned: usize,
    bom_checked: bool,
}

impl LineDecoder {
    /// Appends a chunk and returns every line it completed.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        if !self.bom_checked {
            if self.buf.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.buf) {
                return Vec::new();
            }
            if self.buf.starts_with(UTF8_BOM) {
                self.buf.drain(..UTF8_BOM.len());
            }
            self.bom_checked = true;
        }

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buf[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            lines.push(decode_line(&self.buf[start..end]));
            start = end + 1;
            from = start;
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        lines
    }

    /// Takes whatever unterminated line is still buffered.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode_line(&rest))
    }

    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Classification of one decoded line.
#[derive(Debug, PartialEq)]
pub(crate) enum EventLine {
    /// Not a `data: ` line, or a payload carrying nothing to emit.
    Ignored,
    /// The `[DONE]` sentinel.
    Done,
    /// `data: ` followed by something that is not a chunk object. Expected
    /// while upstream proxies split JSON across lines; never fatal.
    Malformed,
    Delta(ChunkDelta),
}

pub(crate) fn parse_event_line(line: &str) -> EventLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return EventLine::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return EventLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .map_or(EventLine::Ignored, EventLine::Delta),
        Err(_) => EventLine::Malformed,
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

/// Partial model output carried by one streamed chunk.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub(crate) struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ImageRef>>,
}

impl ChunkDelta {
    /// Image URLs in the order they appear.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .flatten()
            .filter_map(|image| image.image_url.as_ref())
            .map(|image_url| image_url.url.as_str())
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub(crate) struct ImageRef {
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct ImageUrl {
    url: String,
}
