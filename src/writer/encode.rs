//! Adapter around the Serde value encoder
//!
//! The heavy lifting of turning a value into JSON text is delegated to
//! `serde_json`; this module only invokes it against the shared sink and
//! sorts its failures into the writer error taxonomy.

use std::{cell::RefCell, io::Write, rc::Rc};

use serde::Serialize;

use super::WriteError;

/// Encodes `value` as JSON text and appends it to the sink
///
/// Exactly the encoded value is written, never a trailing terminator, so the
/// encoder can be invoked repeatedly against the same open sink with
/// delimiters and separators written in between.
pub(super) fn to_sink<W: Write, V: Serialize + ?Sized>(
    sink: &Rc<RefCell<W>>,
    value: &V,
) -> Result<(), WriteError> {
    let mut sink = sink.borrow_mut();
    serde_json::to_writer(&mut *sink, value).map_err(classify)
}

/// Splits encoder failures into sink IO errors and genuine encoding errors
///
/// Encoding errors are fatal for the writer which hit them; they are never
/// treated as success.
fn classify(error: serde_json::Error) -> WriteError {
    match error.io_error_kind() {
        Some(kind) => WriteError::Sink {
            kind,
            message: error.to_string(),
        },
        None => WriteError::Encode(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use serde::Serializer;

    use super::*;

    /// Value whose serialization always fails with a custom message
    struct Unencodable;
    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("boom"))
        }
    }

    /// Sink whose writes always fail
    struct BrokenSink;
    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn encodes_onto_sink() {
        let sink = Rc::new(RefCell::new(Vec::<u8>::new()));
        to_sink(&sink, "a \"quoted\" value").unwrap();
        to_sink(&sink, &1.5_f64).unwrap();

        assert_eq!(
            r#""a \"quoted\" value"1.5"#,
            String::from_utf8(sink.borrow().clone()).unwrap()
        );
    }

    #[test]
    fn value_failure_is_an_encode_error() {
        let sink = Rc::new(RefCell::new(Vec::<u8>::new()));
        let error = to_sink(&sink, &Unencodable).unwrap_err();

        assert_eq!(WriteError::Encode("boom".to_owned()), error);
        assert_eq!(true, sink.borrow().is_empty());
    }

    #[test]
    fn sink_failure_is_a_sink_error() {
        let sink = Rc::new(RefCell::new(BrokenSink));
        let error = to_sink(&sink, &true).unwrap_err();

        match error {
            WriteError::Sink { kind, .. } => assert_eq!(ErrorKind::BrokenPipe, kind),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
