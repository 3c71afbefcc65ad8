//! Synthetic XML parsing events surfaced by the transcoder.

use core::fmt;

/// The externally observable kind of the current event.
///
/// Exactly one of these is current at any time; `next_event` performs one
/// observable transition per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StartDocument,
    StartElement,
    Characters,
    EndElement,
    EndDocument,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StartDocument => "start-document",
            EventKind::StartElement => "start-element",
            EventKind::Characters => "characters",
            EventKind::EndElement => "end-element",
            EventKind::EndDocument => "end-document",
        };
        f.write_str(name)
    }
}

/// An owned snapshot of one synthesized event.
///
/// Elements carry a single default namespace and never any prefix or
/// attributes. A null-valued leaf surfaces as `Characters { text: None }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartDocument,
    StartElement {
        local_name: String,
        namespace_uri: String,
    },
    Characters {
        text: Option<String>,
    },
    EndElement {
        local_name: String,
        namespace_uri: String,
    },
    EndDocument,
}

impl XmlEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            XmlEvent::StartDocument => EventKind::StartDocument,
            XmlEvent::StartElement { .. } => EventKind::StartElement,
            XmlEvent::Characters { .. } => EventKind::Characters,
            XmlEvent::EndElement { .. } => EventKind::EndElement,
            XmlEvent::EndDocument => EventKind::EndDocument,
        }
    }
}
