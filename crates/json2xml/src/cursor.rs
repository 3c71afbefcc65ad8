//! The transcoding state machine.
//!
//! [`EventCursor`] walks the raw token stream one observable XML event per
//! `advance` call. Internally it keeps a [`Micro`] state that is strictly
//! finer than the event kind: each micro state records both the current
//! event and what the already-peeked lookahead token says must come next.
//! The externally visible event kind is a pure projection of the micro
//! state, so the two can never disagree.
//!
//! Structure tracking is split across two stacks. `frames` mirrors element
//! nesting (one frame per open element, plus a synthetic bottom frame whose
//! pool holds the expected root). `arrays` marks where repeating-element
//! groups begin; the innermost entry also carries the replay pool that
//! resolves member names of second and later items.

use std::sync::Arc;

use crate::{
    coerce,
    error::TranscodeError,
    event::EventKind,
    pool::MatchPool,
    schema::{NodeKind, SchemaNode},
    token::{TokenKind, TokenSource},
};

/// Current event plus the pending lookahead decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Micro {
    /// Start-document; the wrapper object has not been consumed yet.
    BeforeDocument,
    /// Start-element of an object element; members or `}` follow.
    OpenedWithChildren,
    /// Start-element of a leaf; its scalar value follows.
    OpenedWithValue,
    /// Characters; a sibling member name follows.
    TextThenSibling,
    /// Characters; the enclosing object's `}` follows.
    TextThenClose,
    /// Characters; another scalar occurrence of the same leaf follows.
    TextThenRepeat,
    /// Characters; the scalar array's `]` follows.
    TextThenArrayEnd,
    /// End-element of a leaf; a sibling member name follows.
    ClosedLeafBeforeSibling,
    /// End-element of a leaf; the enclosing object closes next.
    ClosedLeafBeforeClose,
    /// End-element of a leaf occurrence; the same leaf reopens next.
    ClosedLeafBeforeRepeat,
    /// Start-element reopening a repeated scalar leaf.
    ReopenRepeatedLeaf,
    /// End-element of an object element; a sibling member name follows.
    ClosedObjectBeforeSibling,
    /// End-element of an object element; the enclosing object closes next.
    ClosedObjectBeforeClose,
    /// End-element of an array item; the next item's `{` follows.
    ClosedObjectBeforeItem,
    /// Start-element of the second or a later array item.
    OpenedNextItem,
    /// End-element of the last array item; a sibling member name follows.
    ClosedArrayBeforeSibling,
    /// End-element of the last array item; the enclosing object closes next.
    ClosedArrayBeforeClose,
    /// End-document; the token stream is exhausted.
    AfterDocument,
}

/// One open element. The synthetic bottom frame has no node; its pool holds
/// the single expected root element.
#[derive(Debug)]
struct Frame {
    node: Option<Arc<SchemaNode>>,
    pool: Option<MatchPool>,
}

/// Marks where a repeating-element group begins on the frame stack.
///
/// `boundary` is the index of the group's frame, which every item reuses.
/// While the first item streams, each matched descendant node is appended to
/// `captured`; at the first `}{` item boundary the capture becomes the
/// `replay` pool, which later items resolve their members against.
#[derive(Debug)]
struct ArrayContext {
    boundary: usize,
    captured: Vec<Arc<SchemaNode>>,
    replay: Option<MatchPool>,
}

/// Pull cursor producing one XML event per step from a JSON token stream.
#[derive(Debug)]
pub(crate) struct EventCursor<S> {
    source: S,
    micro: Micro,
    frames: Vec<Frame>,
    arrays: Vec<ArrayContext>,
    current_name: String,
    current_ns: String,
    text: Option<String>,
}

impl<S: TokenSource> EventCursor<S> {
    pub(crate) fn new(source: S, root: Arc<SchemaNode>) -> Self {
        Self {
            source,
            micro: Micro::BeforeDocument,
            frames: vec![Frame {
                node: None,
                pool: Some(MatchPool::schema(vec![root])),
            }],
            arrays: Vec::new(),
            current_name: String::new(),
            current_ns: String::new(),
            text: None,
        }
    }

    /// The kind of the current event. Pure projection of the micro state.
    pub(crate) fn kind(&self) -> EventKind {
        match self.micro {
            Micro::BeforeDocument => EventKind::StartDocument,
            Micro::OpenedWithChildren
            | Micro::OpenedWithValue
            | Micro::ReopenRepeatedLeaf
            | Micro::OpenedNextItem => EventKind::StartElement,
            Micro::TextThenSibling
            | Micro::TextThenClose
            | Micro::TextThenRepeat
            | Micro::TextThenArrayEnd => EventKind::Characters,
            Micro::ClosedLeafBeforeSibling
            | Micro::ClosedLeafBeforeClose
            | Micro::ClosedLeafBeforeRepeat
            | Micro::ClosedObjectBeforeSibling
            | Micro::ClosedObjectBeforeClose
            | Micro::ClosedObjectBeforeItem
            | Micro::ClosedArrayBeforeSibling
            | Micro::ClosedArrayBeforeClose => EventKind::EndElement,
            Micro::AfterDocument => EventKind::EndDocument,
        }
    }

    pub(crate) fn has_next(&self) -> bool {
        self.micro != Micro::AfterDocument
    }

    /// Local name of the current element event.
    pub(crate) fn name(&self) -> &str {
        &self.current_name
    }

    /// Namespace of the current element event.
    pub(crate) fn namespace_uri(&self) -> &str {
        &self.current_ns
    }

    /// Text of the current characters event. `None` means the leaf's JSON
    /// value was null.
    pub(crate) fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Performs one observable transition and returns the new event kind.
    pub(crate) fn advance(&mut self) -> Result<EventKind, TranscodeError> {
        self.text = None;
        match self.micro {
            Micro::BeforeDocument => {
                let found = self.source.peek()?;
                if found != TokenKind::BeginObject {
                    return Err(TranscodeError::UnexpectedToken {
                        found,
                        expected: "begin-object",
                    });
                }
                self.source.begin_object()?;
                self.read_name()?;
            }
            Micro::OpenedWithChildren | Micro::OpenedNextItem => {
                let found = self.source.peek()?;
                match found {
                    TokenKind::MemberName => self.read_name()?,
                    TokenKind::EndObject => self.read_end_object()?,
                    found => {
                        return Err(TranscodeError::UnexpectedToken {
                            found,
                            expected: "a member name or end-object",
                        });
                    }
                }
            }
            Micro::OpenedWithValue | Micro::ReopenRepeatedLeaf => self.read_value()?,
            Micro::TextThenSibling => {
                self.pop_frame();
                self.micro = Micro::ClosedLeafBeforeSibling;
            }
            Micro::TextThenClose => {
                self.pop_frame();
                self.micro = Micro::ClosedLeafBeforeClose;
            }
            Micro::TextThenRepeat => {
                // The frame stays; the same element reopens for the next
                // occurrence.
                self.micro = Micro::ClosedLeafBeforeRepeat;
            }
            Micro::TextThenArrayEnd => {
                self.pop_frame();
                self.source.end_array()?;
                let found = self.source.peek()?;
                self.micro = match found {
                    TokenKind::MemberName => Micro::ClosedLeafBeforeSibling,
                    TokenKind::EndObject => Micro::ClosedLeafBeforeClose,
                    found => {
                        return Err(TranscodeError::UnexpectedToken {
                            found,
                            expected: "a member name or end-object",
                        });
                    }
                };
            }
            Micro::ClosedLeafBeforeRepeat => {
                self.micro = Micro::ReopenRepeatedLeaf;
            }
            Micro::ClosedLeafBeforeSibling
            | Micro::ClosedObjectBeforeSibling
            | Micro::ClosedArrayBeforeSibling => self.read_name()?,
            Micro::ClosedLeafBeforeClose
            | Micro::ClosedObjectBeforeClose
            | Micro::ClosedArrayBeforeClose => {
                if self.source.peek()? == TokenKind::EndDocument {
                    self.micro = Micro::AfterDocument;
                } else {
                    self.read_end_object()?;
                }
            }
            Micro::ClosedObjectBeforeItem => {
                self.source.begin_object()?;
                self.micro = Micro::OpenedNextItem;
            }
            Micro::AfterDocument => return Err(TranscodeError::NoMoreEvents),
        }
        Ok(self.kind())
    }

    /// Consumes a member name, matches it against the active pool and opens
    /// the matched element.
    fn read_name(&mut self) -> Result<(), TranscodeError> {
        let found = self.source.peek()?;
        if found != TokenKind::MemberName {
            return Err(TranscodeError::UnexpectedToken {
                found,
                expected: "a member name",
            });
        }
        let name = self.source.next_name()?;
        let node = self.resolve_member(&name)?;
        self.current_name = node.name().to_owned();
        self.current_ns = node.namespace_uri().to_owned();

        let value = self.source.peek()?;
        match node.kind() {
            NodeKind::NestedObject => match value {
                TokenKind::BeginObject => {
                    self.source.begin_object()?;
                    self.frames.push(Frame {
                        node: Some(node),
                        pool: None,
                    });
                    self.micro = Micro::OpenedWithChildren;
                }
                found if found.is_scalar() => {
                    return Err(TranscodeError::TypeMismatch {
                        name: node.name().to_owned(),
                        expected: "a nested element",
                        found,
                    });
                }
                found => {
                    return Err(TranscodeError::UnexpectedToken {
                        found,
                        expected: "begin-object",
                    });
                }
            },
            NodeKind::NestedArray => match value {
                TokenKind::BeginArray => {
                    self.source.begin_array()?;
                    let after = self.source.peek()?;
                    if after != TokenKind::BeginObject {
                        // Covers the empty array, whose flattened form does
                        // not exist.
                        return Err(TranscodeError::UnexpectedToken {
                            found: after,
                            expected: "begin-object",
                        });
                    }
                    self.arrays.push(ArrayContext {
                        boundary: self.frames.len(),
                        captured: Vec::new(),
                        replay: None,
                    });
                    self.source.begin_object()?;
                    self.frames.push(Frame {
                        node: Some(node),
                        pool: None,
                    });
                    self.micro = Micro::OpenedWithChildren;
                }
                TokenKind::BeginObject => {
                    // A single occurrence may arrive without the array
                    // wrapper.
                    self.source.begin_object()?;
                    self.frames.push(Frame {
                        node: Some(node),
                        pool: None,
                    });
                    self.micro = Micro::OpenedWithChildren;
                }
                found => {
                    return Err(TranscodeError::UnexpectedToken {
                        found,
                        expected: "begin-array",
                    });
                }
            },
            NodeKind::LeafValue => {
                if value == TokenKind::BeginArray {
                    // A repeated scalar leaf.
                    self.source.begin_array()?;
                    let after = self.source.peek()?;
                    if !after.is_scalar() {
                        return Err(TranscodeError::UnexpectedToken {
                            found: after,
                            expected: "a scalar value",
                        });
                    }
                }
                self.frames.push(Frame {
                    node: Some(node),
                    pool: None,
                });
                self.micro = Micro::OpenedWithValue;
            }
        }
        Ok(())
    }

    /// Coerces the current leaf's value and decides from the lookahead what
    /// follows the characters event.
    fn read_value(&mut self) -> Result<(), TranscodeError> {
        let Some(node) = self.frames.last().and_then(|frame| frame.node.clone()) else {
            return Err(TranscodeError::IllegalState {
                operation: "reading a leaf value",
                event: self.kind(),
            });
        };
        self.text = coerce::read_scalar(&mut self.source, &node)?;
        let after = self.source.peek()?;
        self.micro = match after {
            TokenKind::MemberName => Micro::TextThenSibling,
            TokenKind::EndObject => Micro::TextThenClose,
            TokenKind::EndArray => Micro::TextThenArrayEnd,
            found if found.is_scalar() => Micro::TextThenRepeat,
            found => {
                return Err(TranscodeError::UnexpectedToken {
                    found,
                    expected: "a member name, a value, or a closing token",
                });
            }
        };
        Ok(())
    }

    /// Consumes a `}` and classifies the closure: another array item, the end
    /// of an array group, or a plain element end.
    fn read_end_object(&mut self) -> Result<(), TranscodeError> {
        self.source.end_object()?;

        let at_item_boundary = self
            .arrays
            .last()
            .is_some_and(|ctx| ctx.boundary + 1 == self.frames.len());
        if at_item_boundary {
            let found = self.source.peek()?;
            match found {
                TokenKind::BeginObject => {
                    self.seal_replay();
                    if let Some(node) = self.frames.last().and_then(|frame| frame.node.as_ref()) {
                        self.current_name = node.name().to_owned();
                        self.current_ns = node.namespace_uri().to_owned();
                    }
                    self.micro = Micro::ClosedObjectBeforeItem;
                    return Ok(());
                }
                TokenKind::EndArray => {
                    self.source.end_array()?;
                    self.arrays.pop();
                    self.pop_frame();
                    return self.finish_end_element(true);
                }
                found => {
                    return Err(TranscodeError::UnexpectedToken {
                        found,
                        expected: "begin-object or end-array",
                    });
                }
            }
        }

        self.pop_frame();
        self.finish_end_element(false)
    }

    /// Peeks past a completed end-element to pick its successor state.
    fn finish_end_element(&mut self, closed_array: bool) -> Result<(), TranscodeError> {
        if self.frames.len() == 1 {
            // The root element just closed; only the wrapper's `}` and the
            // end of input may remain.
            self.source.end_object()?;
            let found = self.source.peek()?;
            if found != TokenKind::EndDocument {
                return Err(TranscodeError::UnexpectedToken {
                    found,
                    expected: "end of document",
                });
            }
            self.micro = if closed_array {
                Micro::ClosedArrayBeforeClose
            } else {
                Micro::ClosedObjectBeforeClose
            };
            return Ok(());
        }
        let found = self.source.peek()?;
        self.micro = match (found, closed_array) {
            (TokenKind::MemberName, false) => Micro::ClosedObjectBeforeSibling,
            (TokenKind::MemberName, true) => Micro::ClosedArrayBeforeSibling,
            (TokenKind::EndObject, false) => Micro::ClosedObjectBeforeClose,
            (TokenKind::EndObject, true) => Micro::ClosedArrayBeforeClose,
            (found, _) => {
                return Err(TranscodeError::UnexpectedToken {
                    found,
                    expected: "a member name or end-object",
                });
            }
        };
        Ok(())
    }

    /// Matches a member name against the active pool: the innermost replay
    /// pool when resolving at a replaying group's item level, otherwise the
    /// enclosing frame's schema pool. Schema-pool matches are recorded for
    /// every group still capturing its first item.
    fn resolve_member(&mut self, name: &str) -> Result<Arc<SchemaNode>, TranscodeError> {
        let frame_count = self.frames.len();
        if let Some(ctx) = self.arrays.last_mut() {
            if ctx.boundary + 1 == frame_count {
                if let Some(pool) = &mut ctx.replay {
                    return pool.next_match(name).ok_or_else(|| {
                        TranscodeError::SchemaMismatch {
                            name: name.to_owned(),
                        }
                    });
                }
            }
        }

        let matched = self.frames.last_mut().and_then(|frame| {
            let Frame { node, pool } = frame;
            let pool = pool.get_or_insert_with(|| {
                MatchPool::schema(node.as_ref().map_or_else(Vec::new, |n| n.children().to_vec()))
            });
            pool.next_match(name)
        });
        let Some(matched) = matched else {
            return Err(TranscodeError::SchemaMismatch {
                name: name.to_owned(),
            });
        };
        for ctx in &mut self.arrays {
            if ctx.replay.is_none() {
                ctx.captured.push(Arc::clone(&matched));
            }
        }
        Ok(matched)
    }

    /// Turns the innermost group's first-item capture into its replay pool,
    /// or rewinds the existing pool for the next item.
    fn seal_replay(&mut self) {
        if let Some(ctx) = self.arrays.last_mut() {
            match &mut ctx.replay {
                Some(pool) => pool.rewind(),
                None => ctx.replay = Some(MatchPool::replay(std::mem::take(&mut ctx.captured))),
            }
        }
    }

    /// Pops the top frame and names the current event after the popped
    /// element, so an end-element always reports the element it closes.
    fn pop_frame(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        if let Some(frame) = self.frames.pop() {
            if let Some(node) = frame.node {
                self.current_name = node.name().to_owned();
                self.current_ns = node.namespace_uri().to_owned();
            }
        }
    }
}
