//! Leaf value coercion.
//!
//! Converts the next raw JSON scalar into the textual form of the schema-
//! declared XML simple type. The declared type alone picks the reader: an
//! `int` leaf is read through the integer reader even if the literal carries
//! a fraction (which then fails), and a `double` leaf is read as floating
//! point even for an integral literal. A numeric literal outside the
//! declared width is reported as a type mismatch.

use crate::{
    error::TranscodeError,
    schema::{SchemaNode, ValueType},
    token::{TokenKind, TokenSource},
};

/// Reads one scalar token for `node` and returns its canonical text, or
/// `None` for a JSON null.
pub(crate) fn read_scalar<S: TokenSource>(
    source: &mut S,
    node: &SchemaNode,
) -> Result<Option<String>, TranscodeError> {
    let found = source.peek()?;
    if found == TokenKind::Null {
        source.next_null()?;
        return Ok(None);
    }

    let Some(expected) = node.value_type() else {
        // A nested element matched against a scalar token.
        return Err(TranscodeError::TypeMismatch {
            name: node.name().to_owned(),
            expected: "a nested element",
            found,
        });
    };
    if !expected.accepts(found) {
        return Err(TranscodeError::TypeMismatch {
            name: node.name().to_owned(),
            expected: expected.xsd_name(),
            found,
        });
    }

    let text = match expected {
        ValueType::Int | ValueType::Byte | ValueType::Short => {
            let value = source.next_i64()?;
            let in_range = match expected {
                ValueType::Byte => i8::try_from(value).is_ok(),
                ValueType::Short => i16::try_from(value).is_ok(),
                _ => i32::try_from(value).is_ok(),
            };
            if !in_range {
                return Err(TranscodeError::TypeMismatch {
                    name: node.name().to_owned(),
                    expected: expected.xsd_name(),
                    found,
                });
            }
            value.to_string()
        }
        ValueType::Long => source.next_i64()?.to_string(),
        ValueType::Double | ValueType::Float | ValueType::Decimal => {
            source.next_f64()?.to_string()
        }
        ValueType::Boolean => source.next_bool()?.to_string(),
        ValueType::String
        | ValueType::Date
        | ValueType::Time
        | ValueType::DateTime
        | ValueType::Base64Binary => source.next_string()?,
    };
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::reader::JsonTokenReader;

    fn leaf(value_type: ValueType) -> std::sync::Arc<SchemaNode> {
        SchemaNode::leaf("field", "urn:test", value_type)
    }

    #[rstest]
    #[case(ValueType::Int, TokenKind::Number, true)]
    #[case(ValueType::Long, TokenKind::Number, true)]
    #[case(ValueType::Byte, TokenKind::Number, true)]
    #[case(ValueType::Short, TokenKind::Number, true)]
    #[case(ValueType::Double, TokenKind::Number, true)]
    #[case(ValueType::Float, TokenKind::Number, true)]
    #[case(ValueType::Decimal, TokenKind::Number, true)]
    #[case(ValueType::Int, TokenKind::String, false)]
    #[case(ValueType::String, TokenKind::String, true)]
    #[case(ValueType::Date, TokenKind::String, true)]
    #[case(ValueType::Time, TokenKind::String, true)]
    #[case(ValueType::DateTime, TokenKind::String, true)]
    #[case(ValueType::Base64Binary, TokenKind::String, true)]
    #[case(ValueType::String, TokenKind::Number, false)]
    #[case(ValueType::Boolean, TokenKind::Boolean, true)]
    #[case(ValueType::Boolean, TokenKind::String, false)]
    #[case(ValueType::Int, TokenKind::Null, true)]
    #[case(ValueType::String, TokenKind::Null, true)]
    fn compatibility_table(
        #[case] declared: ValueType,
        #[case] token: TokenKind,
        #[case] accepted: bool,
    ) {
        assert_eq!(declared.accepts(token), accepted);
    }

    // Drives the real tokenizer to the leaf value position: `{"field": <lit>}`.
    fn at_value(literal: &str) -> JsonTokenReader<'_> {
        // Leak is fine in tests; keeps the reader borrowing simple.
        let text: &str = Box::leak(format!("{{\"field\":{literal}}}").into_boxed_str());
        let mut reader = JsonTokenReader::new(text);
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader
    }

    #[rstest]
    #[case(ValueType::Int, "35", "35")]
    #[case(ValueType::Long, "9223372036854775807", "9223372036854775807")]
    #[case(ValueType::Double, "5.5", "5.5")]
    #[case(ValueType::Decimal, "1.25", "1.25")]
    #[case(ValueType::Boolean, "true", "true")]
    #[case(ValueType::String, "\"kate\"", "kate")]
    #[case(ValueType::Base64Binary, "\"iVBORw0KGg\"", "iVBORw0KGg")]
    fn coerces_to_canonical_text(
        #[case] declared: ValueType,
        #[case] literal: &str,
        #[case] expected: &str,
    ) {
        let mut source = at_value(literal);
        let text = read_scalar(&mut source, &leaf(declared)).unwrap();
        assert_eq!(text.as_deref(), Some(expected));
    }

    #[test]
    fn null_produces_absent_value() {
        let mut source = at_value("null");
        assert_eq!(read_scalar(&mut source, &leaf(ValueType::Int)).unwrap(), None);
    }

    #[test]
    fn kind_mismatch_names_field_and_kinds() {
        let mut source = at_value("\"not a number\"");
        let err = read_scalar(&mut source, &leaf(ValueType::Int)).unwrap_err();
        assert_eq!(
            err,
            TranscodeError::TypeMismatch {
                name: "field".to_owned(),
                expected: "int",
                found: TokenKind::String,
            }
        );
    }

    #[test]
    fn out_of_width_number_is_a_type_mismatch() {
        let mut source = at_value("4096");
        let err = read_scalar(&mut source, &leaf(ValueType::Byte)).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::TypeMismatch { expected: "byte", .. }
        ));
    }
}
