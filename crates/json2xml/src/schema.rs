//! The expected-document-shape model.
//!
//! A [`SchemaNode`] tree describes the XML document a message is supposed to
//! be isomorphic to: one node per expected element, with declaration-ordered
//! children. Trees are built by an external resolver (from an XML Schema
//! set), cached process-wide in a [`SchemaCache`] keyed by the root element's
//! qualified name, and traversed read-only by every transcoder instance.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use crate::token::TokenKind;

/// A namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace_uri: String,
    pub local_name: String,
}

impl QName {
    #[must_use]
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_name)
        }
    }
}

/// The nominal XML simple type declared for a leaf element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Long,
    Byte,
    Short,
    Double,
    Float,
    Decimal,
    Boolean,
    String,
    Date,
    Time,
    DateTime,
    Base64Binary,
}

impl ValueType {
    /// Which raw JSON token kind a leaf of this type accepts. Null is
    /// accepted by every type and produces an absent value.
    #[must_use]
    pub fn accepts(self, token: TokenKind) -> bool {
        match token {
            TokenKind::Null => true,
            TokenKind::Number => matches!(
                self,
                ValueType::Int
                    | ValueType::Long
                    | ValueType::Byte
                    | ValueType::Short
                    | ValueType::Double
                    | ValueType::Float
                    | ValueType::Decimal
            ),
            TokenKind::String => matches!(
                self,
                ValueType::String
                    | ValueType::Date
                    | ValueType::Time
                    | ValueType::DateTime
                    | ValueType::Base64Binary
            ),
            TokenKind::Boolean => self == ValueType::Boolean,
            _ => false,
        }
    }

    #[must_use]
    pub fn xsd_name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Double => "double",
            ValueType::Float => "float",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::DateTime => "dateTime",
            ValueType::Base64Binary => "base64Binary",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xsd_name())
    }
}

/// What shape of JSON content an element expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A scalar-valued element.
    LeafValue,
    /// An element with child elements, occurring once.
    NestedObject,
    /// A repeating element; JSON carries its occurrences as an array.
    NestedArray,
}

/// One expected element. Immutable once constructed and shared read-only
/// across all frames of a message and across concurrent messages.
#[derive(Debug)]
pub struct SchemaNode {
    name: String,
    namespace_uri: String,
    kind: NodeKind,
    value_type: Option<ValueType>,
    children: Vec<Arc<SchemaNode>>,
}

impl SchemaNode {
    /// A scalar-valued element. A repeated scalar uses this kind too; the
    /// array shape is discovered from the JSON itself.
    #[must_use]
    pub fn leaf(
        name: impl Into<String>,
        namespace_uri: impl Into<String>,
        value_type: ValueType,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            namespace_uri: namespace_uri.into(),
            kind: NodeKind::LeafValue,
            value_type: Some(value_type),
            children: Vec::new(),
        })
    }

    /// A single-occurrence element with the given declaration-ordered
    /// children.
    #[must_use]
    pub fn object(
        name: impl Into<String>,
        namespace_uri: impl Into<String>,
        children: Vec<Arc<SchemaNode>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            namespace_uri: namespace_uri.into(),
            kind: NodeKind::NestedObject,
            value_type: None,
            children,
        })
    }

    /// A repeating element whose occurrences carry the given children.
    #[must_use]
    pub fn array(
        name: impl Into<String>,
        namespace_uri: impl Into<String>,
        children: Vec<Arc<SchemaNode>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            namespace_uri: namespace_uri.into(),
            kind: NodeKind::NestedArray,
            value_type: None,
            children,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// Expected children in schema declaration order.
    #[must_use]
    pub fn children(&self) -> &[Arc<SchemaNode>] {
        &self.children
    }
}

/// The external subsystem that turns an XML Schema set and a root qualified
/// name into an expected-element tree. The transcoder only ever sees the
/// resolved tree; hosts wire a resolver together with a [`SchemaCache`].
pub trait SchemaResolver {
    type Error;

    fn resolve(&self, root: &QName) -> Result<Arc<SchemaNode>, Self::Error>;
}

/// A process-wide, thread-safe cache of resolved schema trees keyed by root
/// qualified name.
///
/// Each entry carries the revision of the schema object it was built from.
/// [`SchemaCache::get_or_build`] rebuilds when the caller's revision differs
/// from the cached one, so replacing the schema for a namespace invalidates
/// the tree on next use. The swap is one map insert under a write lock:
/// concurrent readers observe either the old or the new tree, never a
/// partially built one.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<QName, CachedTree>>,
}

#[derive(Debug)]
struct CachedTree {
    revision: u64,
    node: Arc<SchemaNode>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tree for `root` if it was built from `revision`,
    /// otherwise builds a fresh tree and replaces the entry.
    ///
    /// # Errors
    ///
    /// Propagates the builder's error; the cache is left untouched on
    /// failure.
    pub fn get_or_build<E>(
        &self,
        root: &QName,
        revision: u64,
        build: impl FnOnce() -> Result<Arc<SchemaNode>, E>,
    ) -> Result<Arc<SchemaNode>, E> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = entries.get(root) {
                if cached.revision == revision {
                    return Ok(Arc::clone(&cached.node));
                }
            }
        }

        let node = build()?;
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(root = %root, revision, "rebuilding cached schema tree");
        entries.insert(
            root.clone(),
            CachedTree {
                revision,
                node: Arc::clone(&node),
            },
        );
        Ok(node)
    }

    /// Drops the cached tree for `root`, if any.
    pub fn invalidate(&self, root: &QName) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(root);
    }
}
