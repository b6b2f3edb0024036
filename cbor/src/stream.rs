/*!
The context threaded through every encode and decode call.
*/

use super::*;
use block_stack::BlockStack;
use buffer::{DEFAULT_CAPACITY, Mode};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    // Deepest allowed nesting of containers and tags
    pub max_depth: usize,
    // Window size for buffers opened over readers and writers
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 64,
            buffer_size: DEFAULT_CAPACITY,
        }
    }
}

/// Observes every error before it is returned to the caller.
pub type ErrorHandler = Box<dyn FnMut(&Error) + Send>;

/// A [`Buffer`] plus the [`BlockStack`] of containers open on it.
///
/// The first error other than [`Error::NoMore`] is remembered and every
/// later operation fails with [`Error::Operation`].
pub struct Stream {
    buffer: Buffer,
    blocks: BlockStack,
    tag_pending: bool,
    // Length of a definite string whose header was read by `predecode`
    payload_pending: Option<u64>,
    last_error: Option<ErrorKind>,
    handler: Option<ErrorHandler>,
}

impl Stream {
    pub fn new(buffer: Buffer) -> Self {
        Self::with_config(buffer, &Config::default())
    }

    pub fn with_config(buffer: Buffer, config: &Config) -> Self {
        Self {
            buffer,
            blocks: BlockStack::new(config.max_depth),
            tag_pending: false,
            payload_pending: None,
            last_error: None,
            handler: None,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn blocks(&self) -> &BlockStack {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut BlockStack {
        &mut self.blocks
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn set_error_handler<F: FnMut(&Error) + Send + 'static>(&mut self, handler: F) {
        self.handler = Some(Box::new(handler));
    }

    pub fn max_depth(&self) -> usize {
        self.blocks.max_depth()
    }

    /// True when no container is open, no tag awaits its item and no string
    /// awaits its payload.
    pub fn is_balanced(&self) -> bool {
        self.blocks.is_empty() && !self.tag_pending && self.payload_pending.is_none()
    }

    pub(crate) fn tag_pending(&self) -> bool {
        self.tag_pending
    }

    pub(crate) fn payload_pending(&self) -> Option<u64> {
        self.payload_pending
    }

    pub(crate) fn set_payload_pending(&mut self, len: Option<u64>) {
        self.payload_pending = len;
    }

    /// Runs one operation, recording and reporting its failure.
    pub(crate) fn run<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.last_error.is_some() {
            return Err(Error::Operation("stream has already failed"));
        }
        let r = f(self);
        if let Err(e) = &r {
            // Nested operations report once, at the innermost failure
            if !matches!(e, Error::NoMore) && self.last_error.is_none() {
                debug!(
                    offset = self.buffer.offset(),
                    depth = self.blocks.depth(),
                    "CBOR stream failed: {e}"
                );
                self.last_error = Some(e.kind());
                if let Some(handler) = &mut self.handler {
                    handler(e);
                }
            }
        }
        r
    }

    /// Accounts for one item whose header has just been read or written.
    ///
    /// Inside an indefinite-length string only definite chunks of the same
    /// major type are allowed. The item following a tag is counted with the
    /// tag, not separately.
    pub(crate) fn enter(&mut self, major: Major, indefinite: bool) -> Result<(), Error> {
        if let Some(frame) = self.blocks.current_mut() {
            match frame.kind {
                Container::Bytes | Container::Text => {
                    if major != frame.kind.major() {
                        return Err(Error::Item {
                            expected: frame.kind.name(),
                            found: major.name(),
                        });
                    }
                    if indefinite {
                        return Err(Error::Indefinite);
                    }
                    frame.count_item()?;
                }
                Container::Array | Container::Map => {
                    if !self.tag_pending {
                        frame.count_item()?;
                    }
                }
            }
        }
        self.tag_pending = major == Major::Tag;
        Ok(())
    }

    /// Checks that the open container may end here, returning whether it is
    /// indefinite. The frame stays on the stack.
    pub(crate) fn check_close(&self, kind: Container) -> Result<bool, Error> {
        if self.tag_pending {
            return Err(Error::Operation("tag is missing its item"));
        }
        let frame = self.blocks.top()?;
        if frame.kind != kind {
            return Err(Error::Operation(
                "container end does not match the open container",
            ));
        }
        frame.check_close()?;
        Ok(frame.indefinite)
    }

    /// Flushes a writing stream and hands back the buffer.
    ///
    /// A stream that has failed cannot be closed cleanly, even when no
    /// container is left open.
    pub fn close(mut self) -> Result<Buffer, Error> {
        if self.last_error.is_some() {
            return Err(Error::Operation("stream has already failed"));
        }
        if !self.is_balanced() {
            return Err(Error::Operation("stream closed with an unfinished item"));
        }
        if self.buffer.mode() == Mode::Write {
            self.buffer.flush()?;
        }
        Ok(self.buffer)
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("buffer", &self.buffer)
            .field("blocks", &self.blocks)
            .field("tag_pending", &self.tag_pending)
            .field("payload_pending", &self.payload_pending)
            .field("last_error", &self.last_error)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn poisoned_after_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut s = Stream::new(Buffer::memory());
        let log = seen.clone();
        s.set_error_handler(move |e| log.lock().unwrap().push(e.kind()));

        assert!(matches!(
            s.run(|_| Err::<(), _>(Error::NoMore)),
            Err(Error::NoMore)
        ));
        assert_eq!(s.last_error(), None);

        assert!(s.run(|_| Err::<(), _>(Error::Eof)).is_err());
        assert_eq!(s.last_error(), Some(ErrorKind::Eof));
        assert!(matches!(s.run(|_| Ok(())), Err(Error::Operation(_))));
        assert_eq!(*seen.lock().unwrap(), [ErrorKind::Eof]);
    }

    #[test]
    fn tagged_items_count_once() {
        let mut s = Stream::new(Buffer::memory());
        s.blocks_mut().push(Container::Array, false, 1).unwrap();
        s.enter(Major::Tag, false).unwrap();
        s.enter(Major::Tag, false).unwrap();
        assert!(matches!(
            s.check_close(Container::Array),
            Err(Error::Operation(_))
        ));
        s.enter(Major::UInt, false).unwrap();
        assert!(!s.check_close(Container::Array).unwrap());
        assert!(matches!(
            s.enter(Major::UInt, false),
            Err(Error::NItems { .. })
        ));
    }

    #[test]
    fn string_chunks() {
        let mut s = Stream::new(Buffer::memory());
        s.blocks_mut().push(Container::Text, true, 0).unwrap();
        s.enter(Major::Text, false).unwrap();
        assert!(matches!(s.enter(Major::Text, true), Err(Error::Indefinite)));
        assert!(matches!(s.enter(Major::Bytes, false), Err(Error::Item { .. })));
        assert!(matches!(
            s.check_close(Container::Bytes),
            Err(Error::Operation(_))
        ));
        assert!(s.check_close(Container::Text).unwrap());
    }

    #[test]
    fn close_unbalanced() {
        let mut s = Stream::new(Buffer::memory());
        s.blocks_mut().push(Container::Map, true, 0).unwrap();
        assert!(matches!(s.close(), Err(Error::Operation(_))));
    }

    #[test]
    fn close_after_failure() {
        let mut s = Stream::new(Buffer::memory());
        assert!(s.run(|_| Err::<(), _>(Error::Range(24))).is_err());
        assert!(s.is_balanced());
        assert!(matches!(s.close(), Err(Error::Operation(_))));

        let mut s = Stream::new(Buffer::memory());
        assert!(matches!(
            s.run(|_| Err::<(), _>(Error::NoMore)),
            Err(Error::NoMore)
        ));
        assert!(s.close().is_ok());
    }
}
