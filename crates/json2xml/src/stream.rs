//! The public pull-reader surface.
//!
//! [`JsonXmlReader`] wraps an [`EventCursor`] in a StAX-shaped API: a
//! `next_event`/`event_type` pair plus the query methods valid for each
//! event kind. Queries made in the wrong state fail with
//! [`TranscodeError::IllegalState`]; parts of the XML reader contract the
//! bridge can never produce (attributes, processing instructions) fail with
//! [`TranscodeError::Unsupported`].
//!
//! Every element carries exactly one namespace declaration, the default one
//! for its schema namespace, and never a prefix.

use std::sync::Arc;

use crate::{
    cursor::EventCursor,
    error::TranscodeError,
    event::{EventKind, XmlEvent},
    schema::{QName, SchemaNode},
    token::TokenSource,
};

/// A streaming XML event reader over a JSON message.
#[derive(Debug)]
pub struct JsonXmlReader<S> {
    cursor: EventCursor<S>,
}

impl<S: TokenSource> JsonXmlReader<S> {
    /// Creates a reader positioned on the start-document event. `root` is
    /// the expected root element's schema node.
    pub fn new(source: S, root: Arc<SchemaNode>) -> Self {
        Self {
            cursor: EventCursor::new(source, root),
        }
    }

    /// Whether another event follows the current one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor.has_next()
    }

    /// Moves to the next event and returns its kind.
    ///
    /// # Errors
    ///
    /// Any [`TranscodeError`]; after an error the reader is in an
    /// unspecified position and must be discarded.
    pub fn next_event(&mut self) -> Result<EventKind, TranscodeError> {
        self.cursor.advance()
    }

    /// The kind of the current event.
    #[must_use]
    pub fn event_type(&self) -> EventKind {
        self.cursor.kind()
    }

    #[must_use]
    pub fn is_start_element(&self) -> bool {
        self.event_type() == EventKind::StartElement
    }

    #[must_use]
    pub fn is_end_element(&self) -> bool {
        self.event_type() == EventKind::EndElement
    }

    #[must_use]
    pub fn is_characters(&self) -> bool {
        self.event_type() == EventKind::Characters
    }

    /// The bridge never synthesizes ignorable whitespace.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        false
    }

    /// Local name of the current element, on element events.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        if self.is_start_element() || self.is_end_element() {
            Some(self.cursor.name())
        } else {
            None
        }
    }

    /// Namespace of the current element, on element events.
    #[must_use]
    pub fn namespace_uri(&self) -> Option<&str> {
        if self.is_start_element() || self.is_end_element() {
            Some(self.cursor.namespace_uri())
        } else {
            None
        }
    }

    /// Qualified name of the current element, on element events.
    #[must_use]
    pub fn name(&self) -> Option<QName> {
        self.local_name()
            .map(|local| QName::new(self.cursor.namespace_uri(), local))
    }

    /// Elements are always in the default namespace.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        None
    }

    /// Text of the current characters event. `None` outside characters
    /// events and for a null-valued leaf.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.is_characters() {
            self.cursor.text()
        } else {
            None
        }
    }

    #[must_use]
    pub fn has_text(&self) -> bool {
        self.is_characters()
    }

    /// Synthesized elements never carry attributes.
    ///
    /// # Errors
    ///
    /// [`TranscodeError::IllegalState`] outside a start-element event.
    pub fn attribute_count(&self) -> Result<usize, TranscodeError> {
        if self.is_start_element() {
            Ok(0)
        } else {
            Err(TranscodeError::IllegalState {
                operation: "attribute_count",
                event: self.event_type(),
            })
        }
    }

    /// Every element declares exactly its own default namespace.
    ///
    /// # Errors
    ///
    /// [`TranscodeError::IllegalState`] outside element events.
    pub fn namespace_count(&self) -> Result<usize, TranscodeError> {
        if self.is_start_element() || self.is_end_element() {
            Ok(1)
        } else {
            Err(TranscodeError::IllegalState {
                operation: "namespace_count",
                event: self.event_type(),
            })
        }
    }

    /// The declared namespace is the default one, so it has no prefix.
    ///
    /// # Errors
    ///
    /// [`TranscodeError::IllegalState`] outside element events or for an
    /// index other than zero.
    pub fn namespace_prefix(&self, index: usize) -> Result<Option<&str>, TranscodeError> {
        self.namespace_at(index, "namespace_prefix").map(|_| None)
    }

    /// The namespace declared at `index` on the current element.
    ///
    /// # Errors
    ///
    /// [`TranscodeError::IllegalState`] outside element events or for an
    /// index other than zero.
    pub fn namespace_uri_at(&self, index: usize) -> Result<&str, TranscodeError> {
        self.namespace_at(index, "namespace_uri_at")
    }

    fn namespace_at(&self, index: usize, operation: &'static str) -> Result<&str, TranscodeError> {
        if index == 0 && (self.is_start_element() || self.is_end_element()) {
            Ok(self.cursor.namespace_uri())
        } else {
            Err(TranscodeError::IllegalState {
                operation,
                event: self.event_type(),
            })
        }
    }

    /// Not part of the bridge contract.
    ///
    /// # Errors
    ///
    /// Always [`TranscodeError::Unsupported`].
    pub fn attribute_name(&self, _index: usize) -> Result<QName, TranscodeError> {
        Err(TranscodeError::Unsupported {
            operation: "attribute_name",
        })
    }

    /// Not part of the bridge contract.
    ///
    /// # Errors
    ///
    /// Always [`TranscodeError::Unsupported`].
    pub fn attribute_value(&self, _index: usize) -> Result<&str, TranscodeError> {
        Err(TranscodeError::Unsupported {
            operation: "attribute_value",
        })
    }

    /// Not part of the bridge contract.
    ///
    /// # Errors
    ///
    /// Always [`TranscodeError::Unsupported`].
    pub fn element_text(&mut self) -> Result<String, TranscodeError> {
        Err(TranscodeError::Unsupported {
            operation: "element_text",
        })
    }

    /// Not part of the bridge contract.
    ///
    /// # Errors
    ///
    /// Always [`TranscodeError::Unsupported`].
    pub fn pi_target(&self) -> Result<&str, TranscodeError> {
        Err(TranscodeError::Unsupported {
            operation: "pi_target",
        })
    }

    /// Not part of the bridge contract.
    ///
    /// # Errors
    ///
    /// Always [`TranscodeError::Unsupported`].
    pub fn pi_data(&self) -> Result<&str, TranscodeError> {
        Err(TranscodeError::Unsupported {
            operation: "pi_data",
        })
    }

    /// An owned snapshot of the current event.
    #[must_use]
    pub fn to_event(&self) -> XmlEvent {
        match self.event_type() {
            EventKind::StartDocument => XmlEvent::StartDocument,
            EventKind::StartElement => XmlEvent::StartElement {
                local_name: self.cursor.name().to_owned(),
                namespace_uri: self.cursor.namespace_uri().to_owned(),
            },
            EventKind::Characters => XmlEvent::Characters {
                text: self.cursor.text().map(str::to_owned),
            },
            EventKind::EndElement => XmlEvent::EndElement {
                local_name: self.cursor.name().to_owned(),
                namespace_uri: self.cursor.namespace_uri().to_owned(),
            },
            EventKind::EndDocument => XmlEvent::EndDocument,
        }
    }

    /// Consumes the reader and iterates its remaining events, starting with
    /// a snapshot of the current one.
    pub fn into_events(self) -> Events<S> {
        Events {
            reader: self,
            primed: false,
            done: false,
        }
    }
}

/// Iterator over the events of a [`JsonXmlReader`].
///
/// Yields the current event first, then one item per `next_event` call. An
/// error item is final: the iterator fuses afterwards.
#[derive(Debug)]
pub struct Events<S> {
    reader: JsonXmlReader<S>,
    primed: bool,
    done: bool,
}

impl<S: TokenSource> Iterator for Events<S> {
    type Item = Result<XmlEvent, TranscodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.primed {
            self.primed = true;
            return Some(Ok(self.reader.to_event()));
        }
        if !self.reader.has_next() {
            self.done = true;
            return None;
        }
        match self.reader.next_event() {
            Ok(_) => Some(Ok(self.reader.to_event())),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reader::JsonTokenReader,
        schema::{SchemaNode, ValueType},
    };

    const NS: &str = "http://www.w3schools.com";

    fn simple_root() -> Arc<SchemaNode> {
        SchemaNode::object(
            "response",
            NS,
            vec![SchemaNode::leaf("name", NS, ValueType::String)],
        )
    }

    fn reader(json: &str) -> JsonXmlReader<JsonTokenReader<'_>> {
        JsonXmlReader::new(JsonTokenReader::new(json), simple_root())
    }

    #[test]
    fn starts_on_the_start_document_event() {
        let reader = reader(r#"{"response":{"name":"kate"}}"#);
        assert_eq!(reader.event_type(), EventKind::StartDocument);
        assert!(reader.has_next());
        assert_eq!(reader.local_name(), None);
        assert_eq!(reader.text(), None);
    }

    #[test]
    fn queries_follow_the_current_event() {
        let mut reader = reader(r#"{"response":{"name":"kate"}}"#);

        reader.next_event().unwrap();
        assert!(reader.is_start_element());
        assert_eq!(reader.local_name(), Some("response"));
        assert_eq!(reader.namespace_uri(), Some(NS));
        assert_eq!(reader.name(), Some(QName::new(NS, "response")));
        assert_eq!(reader.prefix(), None);
        assert_eq!(reader.attribute_count(), Ok(0));
        assert_eq!(reader.namespace_count(), Ok(1));
        assert_eq!(reader.namespace_prefix(0), Ok(None));
        assert_eq!(reader.namespace_uri_at(0), Ok(NS));

        reader.next_event().unwrap();
        reader.next_event().unwrap();
        assert!(reader.is_characters());
        assert!(reader.has_text());
        assert_eq!(reader.text(), Some("kate"));
        assert_eq!(reader.local_name(), None);
        assert_eq!(
            reader.attribute_count(),
            Err(TranscodeError::IllegalState {
                operation: "attribute_count",
                event: EventKind::Characters,
            })
        );
    }

    #[test]
    fn namespace_queries_reject_out_of_range_indexes() {
        let mut reader = reader(r#"{"response":{"name":"kate"}}"#);
        reader.next_event().unwrap();
        assert!(matches!(
            reader.namespace_uri_at(1),
            Err(TranscodeError::IllegalState { .. })
        ));
    }

    #[test]
    fn attribute_access_is_unsupported() {
        let reader = reader(r#"{"response":{"name":"kate"}}"#);
        assert_eq!(
            reader.attribute_name(0),
            Err(TranscodeError::Unsupported {
                operation: "attribute_name"
            })
        );
        assert_eq!(
            reader.attribute_value(0),
            Err(TranscodeError::Unsupported {
                operation: "attribute_value"
            })
        );
    }

    #[test]
    fn iterates_the_whole_document_as_owned_events() {
        let events: Result<Vec<_>, _> = reader(r#"{"response":{"name":"kate"}}"#)
            .into_events()
            .collect();
        assert_eq!(
            events.unwrap(),
            vec![
                XmlEvent::StartDocument,
                XmlEvent::StartElement {
                    local_name: "response".to_owned(),
                    namespace_uri: NS.to_owned(),
                },
                XmlEvent::StartElement {
                    local_name: "name".to_owned(),
                    namespace_uri: NS.to_owned(),
                },
                XmlEvent::Characters {
                    text: Some("kate".to_owned()),
                },
                XmlEvent::EndElement {
                    local_name: "name".to_owned(),
                    namespace_uri: NS.to_owned(),
                },
                XmlEvent::EndElement {
                    local_name: "response".to_owned(),
                    namespace_uri: NS.to_owned(),
                },
                XmlEvent::EndDocument,
            ]
        );
    }

    #[test]
    fn iterator_fuses_after_an_error() {
        let mut events = reader(r#"{"response":{"name":12}}"#).into_events();
        let mut saw_error = false;
        for event in events.by_ref() {
            if event.is_err() {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
        assert!(events.next().is_none());
    }
}
