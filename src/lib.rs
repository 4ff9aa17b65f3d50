#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]

//! Jotson writes JSON objects and arrays to an output stream incrementally,
//! without having to hold the complete document in memory.
//!
//! The entry points are the two writers in the [`writer`] module:
//! [`ObjectWriter`](writer::ObjectWriter) emits a JSON object (`{ ... }`) as a
//! sequence of key/value entries, [`ListWriter`](writer::ListWriter) emits a
//! JSON array (`[ ... ]`) as a sequence of values. Both serialize values
//! through [Serde](https://docs.rs/serde/latest/serde/), so anything
//! implementing `Serialize` can be used as an entry value or list element.
//! Jotson is *not* an object mapper; for converting a single struct to a JSON
//! document a dedicated library such as
//! [serde_json](https://docs.rs/serde_json/latest/serde_json/) can be used
//! directly.
//!
//! Memory usage is proportional to the nesting depth of the document, not its
//! size: bytes are handed to the underlying sink as soon as they are produced
//! and are never revisited.
//!
//! # Usage example
//!
//! ```
//! # use jotson::writer::ObjectWriter;
//! // In this example JSON bytes are stored in a Vec;
//! // normally they would be written to a file or network connection
//! let mut out = Vec::<u8>::new();
//!
//! let mut root = ObjectWriter::new(&mut out);
//! root.entry("name", "jotson").entry("count", &3);
//! root.list_with("tags", |tags| {
//!     tags.element("fast").element(&true);
//!     Ok(())
//! });
//! root.close();
//!
//! assert_eq!(None, root.error());
//! drop(root);
//!
//! assert_eq!(
//!     r#"{"name":"jotson","count":3,"tags":["fast",true]}"#,
//!     String::from_utf8(out)?
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! Writer methods never panic on usage mistakes and never unwind on sink
//! failures. Instead each writer records the first error it encounters and
//! turns every subsequent call into a no-op, so a chain of writes can be
//! checked exactly once at the end through
//! [`error()`](writer::ObjectWriter::error). See the [`writer`] module
//! documentation for details.

pub mod writer;
