use tokio::sync::watch;

/// Caller-side handle used to request cancellation of a streaming call.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Creates a linked handle/signal pair.
    pub fn new() -> (AbortHandle, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (AbortHandle { tx }, AbortSignal { rx: Some(rx) })
    }

    /// Requests cancellation.
    ///
    /// Cancellation is cooperative: the decoder notices it before its next
    /// read, an in-flight read is not interrupted.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new signal observing this handle.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Returns whether cancellation has been requested.
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Read-only view of an `AbortHandle`, passed into the stream decoder.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Returns whether cancellation has been requested.
    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_observes_abort_from_any_clone() {
        let (handle, signal) = AbortHandle::new();
        let other = handle.clone();
        let late = handle.signal();
        assert!(!signal.is_aborted());
        other.abort();
        assert!(signal.is_aborted());
        assert!(late.is_aborted());
        assert!(handle.is_aborted());
    }

    #[test]
    fn never_signal_stays_inactive() {
        assert!(!AbortSignal::never().is_aborted());
        assert!(!AbortSignal::default().is_aborted());
    }

    #[test]
    fn dropped_handle_leaves_last_value_visible() {
        let (handle, signal) = AbortHandle::new();
        handle.abort();
        drop(handle);
        assert!(signal.is_aborted());
    }
}
