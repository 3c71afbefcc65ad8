//! A streaming JSON to XML event bridge.
//!
//! Web-service stacks that speak XML internally can accept JSON messages by
//! reading them through [`JsonXmlReader`], which synthesizes the XML parsing
//! events (start-element, characters, end-element) the message would have
//! produced had it arrived as XML. Nothing is materialized: the reader pulls
//! one JSON token at a time and emits one event per step.
//!
//! Element names, namespaces and leaf value types come from a [`SchemaNode`]
//! tree resolved ahead of time (see [`SchemaResolver`] and [`SchemaCache`]).
//! JSON members may arrive in any order relative to the schema declaration,
//! and a repeating element's occurrences arrive as a JSON array that is
//! flattened back into sibling elements.
//!
//! ```rust
//! use json2xml::{JsonTokenReader, JsonXmlReader, SchemaNode, ValueType, XmlEvent};
//!
//! let ns = "http://www.w3schools.com";
//! let root = SchemaNode::object(
//!     "response",
//!     ns,
//!     vec![
//!         SchemaNode::leaf("name", ns, ValueType::String),
//!         SchemaNode::leaf("age", ns, ValueType::Int),
//!     ],
//! );
//!
//! let json = r#"{"response": {"name": "kate", "age": 35}}"#;
//! let reader = JsonXmlReader::new(JsonTokenReader::new(json), root);
//!
//! let events: Vec<XmlEvent> = reader.into_events().collect::<Result<_, _>>()?;
//! assert_eq!(
//!     events[1],
//!     XmlEvent::StartElement {
//!         local_name: "response".to_owned(),
//!         namespace_uri: ns.to_owned(),
//!     }
//! );
//! assert_eq!(events[3], XmlEvent::Characters { text: Some("kate".to_owned()) });
//! # Ok::<(), json2xml::TranscodeError>(())
//! ```

mod coerce;
mod cursor;
mod error;
mod event;
mod pool;
mod reader;
mod schema;
mod stream;
mod token;

#[cfg(test)]
mod tests;

pub use error::{SourceError, Syntax, TranscodeError};
pub use event::{EventKind, XmlEvent};
pub use reader::JsonTokenReader;
pub use schema::{NodeKind, QName, SchemaCache, SchemaNode, SchemaResolver, ValueType};
pub use stream::{Events, JsonXmlReader};
pub use token::{TokenKind, TokenSource};
