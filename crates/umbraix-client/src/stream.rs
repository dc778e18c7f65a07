/// Incremental piece of a streamed model response, delivered as soon as it is decoded.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Fragment {
    /// Text delta; also appended to the transcript.
    Text(String),
    /// URL of a generated image; never part of the transcript.
    Image(String),
}

impl Fragment {
    /// Returns the text, or the image URL.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Image(text) => text,
        }
    }
}

/// Receiver for stream notifications.
///
/// `on_fragment` is called zero or more times in arrival order.
/// `on_complete` is called once after the last fragment, with the text
/// transcript accumulated so far.
pub trait StreamSink {
    fn on_fragment(&mut self, fragment: Fragment);

    fn on_complete(&mut self, transcript: &str);
}

/// `StreamSink` built from a pair of closures.
pub struct FnSink<F, C> {
    on_fragment: F,
    on_complete: C,
}

impl<F, C> FnSink<F, C>
where
    F: FnMut(Fragment),
    C: FnMut(&str),
{
    pub fn new(on_fragment: F, on_complete: C) -> Self {
        Self {
            on_fragment,
            on_complete,
        }
    }
}

impl<F, C> StreamSink for FnSink<F, C>
where
    F: FnMut(Fragment),
    C: FnMut(&str),
{
    fn on_fragment(&mut self, fragment: Fragment) {
        (self.on_fragment)(fragment)
    }

    fn on_complete(&mut self, transcript: &str) {
        (self.on_complete)(transcript)
    }
}

/// Final result of one decoding pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamOutcome {
    /// Concatenated text fragments in arrival order.
    pub text: String,
    /// Image URLs in arrival order.
    pub images: Vec<String>,
    /// Whether the pass stopped because the caller aborted.
    pub cancelled: bool,
}
