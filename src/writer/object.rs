//! The JSON object writer

use std::{cell::RefCell, io::Write, rc::Rc};

use serde::Serialize;

use super::{ListWriter, WriteError, WriterCore};

/// Incrementally writes a JSON object (`{ ... }`) to a sink
///
/// The opening `{` is written on construction, every [`entry`](Self::entry)
/// appends one key/value pair, and [`close`](Self::close) writes the closing
/// `}`. Keys appear in the output exactly in call order. Nested object and
/// list values are written either through a scoped closure
/// ([`object_with`](Self::object_with) / [`list_with`](Self::list_with)) or
/// through a free-standing child writer
/// ([`nested_object`](Self::nested_object) /
/// [`nested_list`](Self::nested_list)) which must be closed before this
/// writer is used again.
///
/// All methods record the first error encountered instead of returning
/// `Result`, see the [module documentation](super) and
/// [`error`](Self::error).
///
/// # Examples
/// ```
/// # use jotson::writer::ObjectWriter;
/// let mut out = Vec::<u8>::new();
/// let mut writer = ObjectWriter::new(&mut out);
/// writer.entry("foo", "bar").close();
///
/// assert_eq!(None, writer.error());
/// drop(writer);
/// assert_eq!(r#"{"foo":"bar"}"#, String::from_utf8(out)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ObjectWriter<W: Write> {
    pub(super) core: WriterCore<W>,
}

impl<W: Write> ObjectWriter<W> {
    /// Creates a writer emitting to `sink` and immediately writes `{`
    ///
    /// The sink is typically a `&mut Vec<u8>`, file or network connection;
    /// it is shared with every nested writer spawned from this one.
    pub fn new(sink: W) -> Self {
        Self::open(Rc::new(RefCell::new(sink)), None)
    }

    pub(super) fn open(sink: Rc<RefCell<W>>, inherited: Option<WriteError>) -> Self {
        ObjectWriter {
            core: WriterCore::open(sink, b"{", inherited),
        }
    }

    /// Pre-add protocol including the object-specific key step
    fn pre_add(&mut self, key: &str) -> Option<WriteError> {
        if let Some(error) = self.core.pre_element() {
            return Some(error);
        }
        self.core.encode(key);
        self.core.write_raw(b":");
        self.core.error()
    }

    /// Writes a single key/value entry
    ///
    /// The key is encoded as a JSON string and the value as whatever JSON
    /// its `Serialize` implementation produces, so scalars, sequences and
    /// whole structs are all valid entry values. Returns `self` to allow
    /// chaining; when an error occurs (or was already recorded) the call is
    /// a no-op.
    ///
    /// # Examples
    /// ```
    /// # use jotson::writer::ObjectWriter;
    /// let mut out = Vec::<u8>::new();
    /// let mut writer = ObjectWriter::new(&mut out);
    /// writer
    ///     .entry("name", "screwdriver")
    ///     .entry("stocked", &true)
    ///     .entry("sizes", &[4, 6, 8])
    ///     .close();
    ///
    /// assert_eq!(None, writer.error());
    /// drop(writer);
    /// assert_eq!(
    ///     r#"{"name":"screwdriver","stocked":true,"sizes":[4,6,8]}"#,
    ///     String::from_utf8(out)?
    /// );
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn entry<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> &mut Self {
        if self.pre_add(key).is_some() {
            return self;
        }
        self.core.encode(value);
        self
    }

    /// Writes many key/value entries, in iteration order
    ///
    /// Equivalent to calling [`entry`](Self::entry) for each pair; stops at
    /// the first error.
    ///
    /// # Examples
    /// ```
    /// # use jotson::writer::ObjectWriter;
    /// let mut out = Vec::<u8>::new();
    /// let mut writer = ObjectWriter::new(&mut out);
    /// writer.entries([("1", "one"), ("2", "two")]).close();
    ///
    /// assert_eq!(None, writer.error());
    /// drop(writer);
    /// assert_eq!(r#"{"1":"one","2":"two"}"#, String::from_utf8(out)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn entries<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        K: AsRef<str>,
        V: Serialize,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            if self.core.error().is_some() {
                break;
            }
            self.entry(key.as_ref(), &value);
        }
        self
    }

    /// Starts a nested JSON object as the value of `key`
    ///
    /// The returned child writer shares this writer's sink. It must be fully
    /// used and closed before this writer is touched again; a mutating call
    /// on this writer while the child is unclosed records
    /// [`WriteError::UnclosedChild`]. For building the whole nested object
    /// in one place, [`object_with`](Self::object_with) is usually the more
    /// convenient form.
    ///
    /// # Examples
    /// ```
    /// # use jotson::writer::ObjectWriter;
    /// let mut out = Vec::<u8>::new();
    /// {
    ///     let mut writer = ObjectWriter::new(&mut out);
    ///     let mut user = writer.nested_object("user");
    ///     user.entry("id", &17);
    ///     user.close();
    ///     writer.entry("active", &true).close();
    ///     assert_eq!(None, writer.error());
    /// }
    /// assert_eq!(
    ///     r#"{"user":{"id":17},"active":true}"#,
    ///     String::from_utf8(out)?
    /// );
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn nested_object(&mut self, key: &str) -> ObjectWriter<W> {
        self.pre_add(key);
        let child = ObjectWriter::open(self.core.sink(), self.core.error());
        self.core.watch(child.core.status());
        child
    }

    /// Starts a nested JSON array as the value of `key`
    ///
    /// Same contract as [`nested_object`](Self::nested_object).
    pub fn nested_list(&mut self, key: &str) -> ListWriter<W> {
        self.pre_add(key);
        let child = ListWriter::open(self.core.sink(), self.core.error());
        self.core.watch(child.core.status());
        child
    }

    /// Writes a nested JSON object value built by the closure `f`
    ///
    /// The child writer handed to `f` is closed when `f` returns, on the
    /// success and on the failure path alike. An error returned by `f` takes
    /// precedence over an error the child accumulated on its own; either one
    /// becomes this writer's error.
    ///
    /// # Examples
    /// ```
    /// # use jotson::writer::ObjectWriter;
    /// let mut out = Vec::<u8>::new();
    /// let mut writer = ObjectWriter::new(&mut out);
    /// writer.object_with("foo", |foo| {
    ///     foo.entry("baz", &7);
    ///     Ok(())
    /// });
    /// writer.close();
    ///
    /// assert_eq!(None, writer.error());
    /// drop(writer);
    /// assert_eq!(r#"{"foo":{"baz":7}}"#, String::from_utf8(out)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn object_with<F>(&mut self, key: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut ObjectWriter<W>) -> Result<(), WriteError>,
    {
        if self.pre_add(key).is_some() {
            return self;
        }
        let mut child = ObjectWriter::open(self.core.sink(), None);
        let result = f(&mut child);
        child.close();
        self.core.finish_scoped(result, child.error());
        self
    }

    /// Writes a nested JSON array value built by the closure `f`
    ///
    /// Same contract as [`object_with`](Self::object_with).
    pub fn list_with<F>(&mut self, key: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut ListWriter<W>) -> Result<(), WriteError>,
    {
        if self.pre_add(key).is_some() {
            return self;
        }
        let mut child = ListWriter::open(self.core.sink(), None);
        let result = f(&mut child);
        child.close();
        self.core.finish_scoped(result, child.error());
        self
    }
}
