//! Module for incrementally writing JSON documents
//!
//! [`ObjectWriter`] emits a JSON object as a sequence of key/value entries,
//! [`ListWriter`] emits a JSON array as a sequence of values. A writer writes
//! its opening delimiter the moment it is constructed, emits entries and
//! elements in call order and writes its closing delimiter on
//! [`close`](ObjectWriter::close). Composition is tree-shaped: a nested
//! object or list value is written through a child writer sharing the same
//! sink, and the child must be closed before the parent accepts further
//! calls.
//!
//! The output is always compact JSON: no whitespace is inserted, and object
//! keys appear exactly in call order, they are never sorted.
//!
//! # Error handling
//!
//! Writer methods do not return `Result`. Instead the first error a writer
//! encounters is recorded and every subsequent call on that writer becomes a
//! no-op which writes no further bytes, so a chain of writes can be checked
//! exactly once at the end through [`error`](ObjectWriter::error):
//!
//! ```
//! # use jotson::writer::ObjectWriter;
//! let mut out = Vec::<u8>::new();
//! let mut writer = ObjectWriter::new(&mut out);
//! writer.entry("a", &1).entry("b", &2).close();
//! if let Some(error) = writer.error() {
//!     // handle the first error of the whole chain
//!     # panic!("unexpected error: {error}");
//! }
//! ```
//!
//! A child writer's failure (or it never having been closed) is detected
//! lazily: it becomes the parent's error at the parent's next mutating call,
//! or at the parent's `close`, not at the moment the child fails.
//!
//! Bytes already handed to the sink before an error occurred stay in the
//! stream; a failed document is not guaranteed to be valid JSON.
//!
//! # Threading
//!
//! Writers of one document share their sink through non-atomic reference
//! counting and are neither `Send` nor `Sync`. A document is driven by a
//! single logical caller in program order.

use std::{cell::RefCell, fmt::Debug, io::Write, rc::Rc};

use duplicate::duplicate_item;
use serde::Serialize;
use thiserror::Error;

mod encode;
mod list;
mod object;

pub use list::ListWriter;
pub use object::ObjectWriter;

type IoError = std::io::Error;

/// Error recorded by a writer
///
/// The first error a writer encounters is retained and re-surfaced by every
/// subsequent operation on that writer; later errors never replace it. The
/// type is `Clone` so a parent writer can adopt the error of a nested child
/// writer that is still owned by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// An operation was invoked on a writer which was already closed
    #[error("writer mutated after close")]
    MutatedAfterClose,
    /// The writer was used again while a nested writer spawned by it had not
    /// been closed
    ///
    /// A nested writer which failed propagates its own error to the parent
    /// instead of this one.
    #[error("a nested writer was not closed")]
    UnclosedChild,
    /// A value could not be encoded as JSON
    ///
    /// The data of this enum variant is a message explaining why the value
    /// could not be encoded.
    #[error("value encoding failed: {0}")]
    Encode(String),
    /// A write to the underlying sink failed
    ///
    /// [`std::io::Error`] is not `Clone`, therefore only its kind and its
    /// message are preserved here.
    #[error("sink write failed ({kind}): {message}")]
    Sink {
        /// Kind of the underlying IO error
        kind: std::io::ErrorKind,
        /// Message of the underlying IO error
        message: String,
    },
    /// Error returned by a caller-supplied builder closure, see for example
    /// [`ObjectWriter::object_with`]
    #[error("{0}")]
    Custom(String),
}

impl WriteError {
    /// Creates an error carrying a caller-defined message
    ///
    /// Intended for builder closures which fail for reasons of their own:
    ///
    /// ```
    /// # use jotson::writer::{ObjectWriter, WriteError};
    /// # let mut out = Vec::<u8>::new();
    /// # let mut writer = ObjectWriter::new(&mut out);
    /// writer.object_with("user", |_| {
    ///     Err(WriteError::custom("user lookup failed"))
    /// });
    /// assert_eq!(Some(WriteError::custom("user lookup failed")), writer.error());
    /// ```
    pub fn custom(message: impl Into<String>) -> Self {
        WriteError::Custom(message.into())
    }

    pub(crate) fn from_io(error: &IoError) -> Self {
        WriteError::Sink {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub(crate) enum WriterState {
    /// Opening delimiter written, no element yet
    NotStarted,
    /// At least one element written
    Open,
    /// Closing delimiter written
    Closed,
}

/// State and sticky error of one writer, shared between the writer itself
/// and the parent which spawned it
#[derive(Debug)]
pub(crate) struct WriterStatus {
    state: WriterState,
    error: Option<WriteError>,
}

pub(crate) type StatusHandle = Rc<RefCell<WriterStatus>>;

/// The state machine both writer kinds delegate to
///
/// Owns the shared sink handle, this writer's status cell and the probe onto
/// the currently active nested writer, if any.
pub(crate) struct WriterCore<W: Write> {
    sink: Rc<RefCell<W>>,
    status: StatusHandle,
    child: Option<StatusHandle>,
}

impl<W: Write> WriterCore<W> {
    /// Creates the core and immediately writes the opening delimiter
    ///
    /// A writer spawned from a parent which already failed inherits that
    /// error and therefore writes nothing, not even the delimiter.
    pub(crate) fn open(
        sink: Rc<RefCell<W>>,
        open_delim: &[u8],
        inherited: Option<WriteError>,
    ) -> Self {
        let mut core = WriterCore {
            sink,
            status: Rc::new(RefCell::new(WriterStatus {
                state: WriterState::NotStarted,
                error: inherited,
            })),
            child: None,
        };
        core.write_raw(open_delim);
        core
    }

    pub(crate) fn sink(&self) -> Rc<RefCell<W>> {
        Rc::clone(&self.sink)
    }

    pub(crate) fn status(&self) -> StatusHandle {
        Rc::clone(&self.status)
    }

    /// Records `child` as the active nested writer to be checked at the next
    /// mutating call
    pub(crate) fn watch(&mut self, child: StatusHandle) {
        self.child = Some(child);
    }

    pub(crate) fn state(&self) -> WriterState {
        self.status.borrow().state
    }

    fn set_state(&mut self, state: WriterState) {
        self.status.borrow_mut().state = state;
    }

    pub(crate) fn error(&self) -> Option<WriteError> {
        self.status.borrow().error.clone()
    }

    /// Records `error` unless an earlier one is already present
    pub(crate) fn set_error(&mut self, error: WriteError) {
        let mut status = self.status.borrow_mut();
        if status.error.is_none() {
            status.error = Some(error);
        }
    }

    /// Writes bytes to the sink, unless an error is already recorded
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) {
        if self.error().is_some() {
            return;
        }
        let result = self.sink.borrow_mut().write_all(bytes);
        if let Err(error) = result {
            self.set_error(WriteError::from_io(&error));
        }
    }

    /// Encodes `value` as JSON text onto the sink, unless an error is
    /// already recorded
    pub(crate) fn encode<V: Serialize + ?Sized>(&mut self, value: &V) {
        if self.error().is_some() {
            return;
        }
        if let Err(error) = encode::to_sink(&self.sink, value) {
            self.set_error(error);
        }
    }

    /// Verifies that the active nested writer, if any, was closed without
    /// error, adopting its error otherwise
    ///
    /// The child reference is cleared regardless of the outcome. Returns the
    /// error this writer carries afterwards.
    pub(crate) fn check_child(&mut self) -> Option<WriteError> {
        let child = self.child.take();
        if self.error().is_none() {
            if let Some(child) = child {
                let status = child.borrow();
                if let Some(error) = status.error.clone() {
                    self.set_error(error);
                } else if status.state != WriterState::Closed {
                    self.set_error(WriteError::UnclosedChild);
                }
            }
        }
        self.error()
    }

    /// Runs the shared part of the pre-add protocol: closed check, child
    /// check and separator placement
    ///
    /// Returns the error this writer carries afterwards; `Some` means the
    /// caller must skip its remaining writes.
    pub(crate) fn pre_element(&mut self) -> Option<WriteError> {
        if self.state() == WriterState::Closed {
            self.set_error(WriteError::MutatedAfterClose);
        }
        if let Some(error) = self.check_child() {
            return Some(error);
        }

        if self.state() == WriterState::NotStarted {
            self.set_state(WriterState::Open);
        } else {
            self.write_raw(b",");
        }
        self.error()
    }

    /// Writes the closing delimiter and marks this writer closed
    ///
    /// Refuses to close while the active nested writer is unclosed or failed;
    /// that error is recorded instead.
    pub(crate) fn close(&mut self, close_delim: &[u8]) {
        if self.state() == WriterState::Closed {
            self.set_error(WriteError::MutatedAfterClose);
            return;
        }
        if self.check_child().is_some() {
            return;
        }

        self.write_raw(close_delim);
        self.set_state(WriterState::Closed);
    }

    /// Resolves a scoped build: the closure result takes precedence over the
    /// error the child writer accumulated (including a failed close)
    pub(crate) fn finish_scoped(
        &mut self,
        result: Result<(), WriteError>,
        child_error: Option<WriteError>,
    ) {
        match result {
            Err(error) => self.set_error(error),
            Ok(()) => {
                if let Some(error) = child_error {
                    self.set_error(error);
                }
            }
        }
    }
}

// The closing delimiter is the only difference between the two writer kinds
// from here on, so these impls are instantiated for both.
#[duplicate_item(
    writer_type    close_delim;
    [ObjectWriter] [b"}"];
    [ListWriter]   [b"]"];
)]
impl<W: Write> writer_type<W> {
    /// Writes the closing delimiter and finishes this writer
    ///
    /// Must be called for the emitted JSON value to be complete; dropping a
    /// writer does not close it. Closing requires that a nested writer
    /// obtained from this one has already been closed, otherwise the
    /// unclosed-child error is recorded instead of closing. Calling `close`
    /// again after a successful close records
    /// [`WriteError::MutatedAfterClose`].
    pub fn close(&mut self) -> &mut Self {
        self.core.close(close_delim);
        self
    }

    /// Returns the first error recorded by this writer, or `None`
    ///
    /// Once set the error never changes; every later operation keeps
    /// returning it. Checking once after the final `close` therefore covers
    /// a whole chain of writes.
    pub fn error(&self) -> Option<WriteError> {
        self.core.error()
    }
}

#[duplicate_item(writer_type; [ObjectWriter]; [ListWriter])]
impl<W: Write> Debug for writer_type<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(writer_type))
            .field("state", &self.core.state())
            .field("error", &self.core.error())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink which keeps its bytes accessible to the test after the core took
    /// ownership of the handle
    struct CoreSink(Rc<RefCell<Vec<u8>>>);
    impl Write for CoreSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn open_core(bytes: &Rc<RefCell<Vec<u8>>>) -> WriterCore<CoreSink> {
        WriterCore::open(
            Rc::new(RefCell::new(CoreSink(Rc::clone(bytes)))),
            b"{",
            None,
        )
    }

    #[test]
    fn separator_only_between_elements() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut core = open_core(&bytes);

        assert_eq!(None, core.pre_element());
        core.write_raw(b"1");
        assert_eq!(None, core.pre_element());
        core.write_raw(b"2");
        core.close(b"}");

        assert_eq!(None, core.error());
        assert_eq!(b"{1,2}".as_slice(), bytes.borrow().as_slice());
    }

    #[test]
    fn first_error_wins() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut core = open_core(&bytes);

        core.set_error(WriteError::custom("first"));
        core.set_error(WriteError::custom("second"));
        assert_eq!(Some(WriteError::custom("first")), core.error());

        // No bytes besides the opening delimiter may appear after the error
        core.write_raw(b"x");
        core.close(b"}");
        assert_eq!(b"{".as_slice(), bytes.borrow().as_slice());
    }

    #[test]
    fn close_twice_is_an_error() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut core = open_core(&bytes);

        core.close(b"}");
        assert_eq!(None, core.error());
        core.close(b"}");
        assert_eq!(Some(WriteError::MutatedAfterClose), core.error());
        assert_eq!(b"{}".as_slice(), bytes.borrow().as_slice());
    }

    #[test]
    fn inherited_error_suppresses_opening_delimiter() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let core = WriterCore::open(
            Rc::new(RefCell::new(CoreSink(Rc::clone(&bytes)))),
            b"{",
            Some(WriteError::UnclosedChild),
        );

        assert_eq!(Some(WriteError::UnclosedChild), core.error());
        assert_eq!(true, bytes.borrow().is_empty());
    }

    #[test]
    fn unclosed_child_detected_and_reference_cleared() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut parent = open_core(&bytes);
        let child = open_core(&bytes);
        parent.watch(child.status());

        assert_eq!(Some(WriteError::UnclosedChild), parent.check_child());
        // The reference was cleared, the error stays
        assert_eq!(Some(WriteError::UnclosedChild), parent.check_child());
    }

    #[test]
    fn child_error_takes_precedence_over_unclosed() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut parent = open_core(&bytes);
        let mut child = open_core(&bytes);
        child.set_error(WriteError::custom("child failed"));
        parent.watch(child.status());

        assert_eq!(
            Some(WriteError::custom("child failed")),
            parent.check_child()
        );
    }

    #[test]
    fn closed_child_passes_check() {
        let bytes = Rc::new(RefCell::new(Vec::new()));
        let mut parent = open_core(&bytes);
        let mut child = open_core(&bytes);
        child.close(b"}");
        parent.watch(child.status());

        assert_eq!(None, parent.check_child());
    }
}
