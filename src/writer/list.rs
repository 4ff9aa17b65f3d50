//! The JSON list writer

use std::{cell::RefCell, io::Write, rc::Rc};

use serde::Serialize;

use super::{ObjectWriter, WriteError, WriterCore};

/// Incrementally writes a JSON array (`[ ... ]`) to a sink
///
/// The keyless counterpart of [`ObjectWriter`]: the opening `[` is written
/// on construction, every [`element`](Self::element) appends one value, and
/// [`close`](Self::close) writes the closing `]`. Nested structures follow
/// the same discipline as for objects, through
/// [`object_with`](Self::object_with) / [`list_with`](Self::list_with) or
/// the free-standing [`nested_object`](Self::nested_object) /
/// [`nested_list`](Self::nested_list).
///
/// # Examples
/// ```
/// # use jotson::writer::ListWriter;
/// let mut out = Vec::<u8>::new();
/// let mut writer = ListWriter::new(&mut out);
/// writer.element(&1).element(&2).element(&3).close();
///
/// assert_eq!(None, writer.error());
/// drop(writer);
/// assert_eq!("[1,2,3]", String::from_utf8(out)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ListWriter<W: Write> {
    pub(super) core: WriterCore<W>,
}

impl<W: Write> ListWriter<W> {
    /// Creates a writer emitting to `sink` and immediately writes `[`
    pub fn new(sink: W) -> Self {
        Self::open(Rc::new(RefCell::new(sink)), None)
    }

    pub(super) fn open(sink: Rc<RefCell<W>>, inherited: Option<WriteError>) -> Self {
        ListWriter {
            core: WriterCore::open(sink, b"[", inherited),
        }
    }

    /// Writes a single value as the next element
    ///
    /// JSON arrays may mix element types, so chained calls do not have to
    /// agree on one value type:
    ///
    /// ```
    /// # use jotson::writer::ListWriter;
    /// let mut out = Vec::<u8>::new();
    /// let mut writer = ListWriter::new(&mut out);
    /// writer.element("foo").element(&7).element(&false).close();
    ///
    /// assert_eq!(None, writer.error());
    /// drop(writer);
    /// assert_eq!(r#"["foo",7,false]"#, String::from_utf8(out)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn element<V: Serialize + ?Sized>(&mut self, value: &V) -> &mut Self {
        if self.core.pre_element().is_some() {
            return self;
        }
        self.core.encode(value);
        self
    }

    /// Writes many values, in iteration order
    ///
    /// Equivalent to calling [`element`](Self::element) for each value;
    /// stops at the first error. The iterator's element type is fixed, for
    /// mixed types use chained `element` calls or `serde_json::Value`
    /// items.
    pub fn elements<V, I>(&mut self, values: I) -> &mut Self
    where
        V: Serialize,
        I: IntoIterator<Item = V>,
    {
        for value in values {
            if self.core.error().is_some() {
                break;
            }
            self.element(&value);
        }
        self
    }

    /// Starts a nested JSON object as the next element
    ///
    /// The returned child writer shares this writer's sink and must be
    /// closed before this writer is used again, otherwise
    /// [`WriteError::UnclosedChild`] is recorded on this writer.
    pub fn nested_object(&mut self) -> ObjectWriter<W> {
        self.core.pre_element();
        let child = ObjectWriter::open(self.core.sink(), self.core.error());
        self.core.watch(child.core.status());
        child
    }

    /// Starts a nested JSON array as the next element
    ///
    /// Same contract as [`nested_object`](Self::nested_object).
    pub fn nested_list(&mut self) -> ListWriter<W> {
        self.core.pre_element();
        let child = ListWriter::open(self.core.sink(), self.core.error());
        self.core.watch(child.core.status());
        child
    }

    /// Writes a JSON object built by the closure `f` as the next element
    ///
    /// The child writer handed to `f` is closed when `f` returns, on the
    /// success and on the failure path alike; `f`'s error takes precedence
    /// over the child's own.
    ///
    /// # Examples
    /// ```
    /// # use jotson::writer::ListWriter;
    /// let mut out = Vec::<u8>::new();
    /// let mut writer = ListWriter::new(&mut out);
    /// writer.object_with(|item| {
    ///     item.entry("baz", &7);
    ///     Ok(())
    /// });
    /// writer.close();
    ///
    /// assert_eq!(None, writer.error());
    /// drop(writer);
    /// assert_eq!(r#"[{"baz":7}]"#, String::from_utf8(out)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn object_with<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut ObjectWriter<W>) -> Result<(), WriteError>,
    {
        if self.core.pre_element().is_some() {
            return self;
        }
        let mut child = ObjectWriter::open(self.core.sink(), None);
        let result = f(&mut child);
        child.close();
        self.core.finish_scoped(result, child.error());
        self
    }

    /// Writes a JSON array built by the closure `f` as the next element
    ///
    /// Same contract as [`object_with`](Self::object_with).
    pub fn list_with<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut ListWriter<W>) -> Result<(), WriteError>,
    {
        if self.core.pre_element().is_some() {
            return self;
        }
        let mut child = ListWriter::open(self.core.sink(), None);
        let result = f(&mut child);
        child.close();
        self.core.finish_scoped(result, child.error());
        self
    }
}
