use futures::{Stream, StreamExt as _};
use tracing::{debug, trace};

use crate::abort::AbortSignal;
use crate::errors::ClientError;
use crate::model::ProviderId;
use crate::stream::{Fragment, StreamOutcome, StreamSink};

use super::transport::{ChunkDelta, EventLine, LineDecoder, parse_event_line};

/// State of a single decoding pass over one streamed response body.
///
/// Most callers go through [`decode_stream`]; drive the session by hand only
/// when the bytes do not come from a `Stream`.
pub struct StreamSession {
    id: uuid::Uuid,
    provider: ProviderId,
    decoder: LineDecoder,
    outcome: StreamOutcome,
    fragments: u64,
}

impl StreamSession {
    pub fn new(provider: impl Into<ProviderId>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            provider: provider.into(),
            decoder: LineDecoder::default(),
            outcome: StreamOutcome::default(),
            fragments: 0,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Text accumulated so far.
    pub fn transcript(&self) -> &str {
        &self.outcome.text
    }

    /// Feeds one raw chunk and emits the fragments of every line it completes.
    pub fn push_chunk<K>(&mut self, chunk: &[u8], sink: &mut K)
    where
        K: StreamSink + ?Sized,
    {
        for line in self.decoder.push_chunk(chunk) {
            self.handle_line(&line, sink);
        }
    }

    /// Ends the session and reports the transcript to the sink.
    ///
    /// A trailing unterminated line is still processed after a normal end of
    /// stream, and dropped after cancellation.
    pub fn finish<K>(mut self, cancelled: bool, sink: &mut K) -> StreamOutcome
    where
        K: StreamSink + ?Sized,
    {
        if cancelled {
            if self.decoder.pending_len() > 0 {
                trace!(session_id = %self.id, pending_bytes = self.decoder.pending_len(), "dropping partial line after abort");
            }
        } else if let Some(line) = self.decoder.finish() {
            self.handle_line(&line, sink);
        }
        self.outcome.cancelled = cancelled;
        debug!(
            session_id = %self.id,
            provider = %self.provider,
            fragments = self.fragments,
            text_len = self.outcome.text.len() as u64,
            images = self.outcome.images.len() as u64,
            cancelled,
            "stream session finished"
        );
        sink.on_complete(&self.outcome.text);
        self.outcome
    }

    fn handle_line<K>(&mut self, line: &str, sink: &mut K)
    where
        K: StreamSink + ?Sized,
    {
        match parse_event_line(line) {
            EventLine::Delta(delta) => self.apply_delta(delta, sink),
            EventLine::Malformed => {
                trace!(session_id = %self.id, line_len = line.len() as u64, "skipping malformed event payload");
            }
            EventLine::Done | EventLine::Ignored => {}
        }
    }

    fn apply_delta<K>(&mut self, delta: ChunkDelta, sink: &mut K)
    where
        K: StreamSink + ?Sized,
    {
        if let Some(text) = delta.content.as_deref().filter(|text| !text.is_empty()) {
            self.outcome.text.push_str(text);
            self.fragments += 1;
            sink.on_fragment(Fragment::Text(text.to_owned()));
        }
        for url in delta.image_urls() {
            self.outcome.images.push(url.to_owned());
            self.fragments += 1;
            sink.on_fragment(Fragment::Image(url.to_owned()));
        }
    }
}

/// Decodes a streamed chat completion body.
///
/// The abort signal is checked before every read. Once it is active the byte
/// source is released without reading further and the sink is completed with
/// the partial transcript. A read error is returned as
/// `ClientError::Transport`; the sink is not completed on that path.
pub async fn decode_stream<S, B, E, K>(
    provider: impl Into<ProviderId>,
    source: S,
    signal: &AbortSignal,
    sink: &mut K,
) -> Result<StreamOutcome, ClientError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    K: StreamSink + ?Sized,
{
    let mut session = StreamSession::new(provider);
    let mut source = source;
    loop {
        if signal.is_aborted() {
            debug!(session_id = %session.id, "abort requested; releasing response body");
            drop(source);
            return Ok(session.finish(true, sink));
        }
        match source.next().await {
            Some(Ok(chunk)) => session.push_chunk(chunk.as_ref(), sink),
            Some(Err(e)) => {
                debug!(session_id = %session.id, error = %e, "stream read failed");
                return Err(ClientError::transport(
                    session.provider,
                    format!("streaming read failed: {e}"),
                ));
            }
            None => break,
        }
    }
    Ok(session.finish(false, sink))
}
