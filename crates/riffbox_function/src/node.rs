// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for Function trees.
//!
//! A Function is a forest of action nodes. Each node belongs to one of three
//! groups and exposes three slot collections:
//! - `child_nodes`: nested statements (`actions` group)
//! - `number_expressions`: sockets holding `numbers` group nodes
//! - `track_expressions`: sockets holding `tracks` group nodes
//!
//! Expression sockets may be empty (`None`) while a tree is being edited.

use crate::id::encode_node_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Slot family a node lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Statements
    Actions,
    /// Number expressions
    Numbers,
    /// Track expressions
    Tracks,
}

impl Group {
    /// Wire name of the group
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Numbers => "numbers",
            Self::Tracks => "tracks",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|g| g.as_str() == name)
    }

    /// All groups
    pub fn all() -> &'static [Group] {
        &[Group::Actions, Group::Numbers, Group::Tracks]
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind, discriminating the node together with its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Play a single track
    Play,
    /// Repeat child statements N times
    Loop,
    /// Constant number
    NumberLiteral,
    /// Arithmetic over two number sockets
    BinaryArith,
    /// Reference to a track
    TrackLiteral,
}

/// Slot contract for a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Minimum number of child statements
    pub min_children: usize,
    /// Maximum number of child statements, `None` when unbounded
    pub max_children: Option<usize>,
    /// Exact number of track sockets
    pub track_slots: usize,
    /// Exact number of number sockets
    pub number_slots: usize,
}

impl Arity {
    const LEAF: Arity = Arity {
        min_children: 0,
        max_children: Some(0),
        track_slots: 0,
        number_slots: 0,
    };

    /// Whether `count` children satisfy this contract
    pub fn accepts_children(&self, count: usize) -> bool {
        count >= self.min_children && self.max_children.map_or(true, |max| count <= max)
    }
}

impl NodeKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Loop => "loop",
            Self::NumberLiteral => "numberliteral",
            Self::BinaryArith => "binaryarith",
            Self::TrackLiteral => "trackliteral",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }

    /// All kinds
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Play,
            NodeKind::Loop,
            NodeKind::NumberLiteral,
            NodeKind::BinaryArith,
            NodeKind::TrackLiteral,
        ]
    }

    /// The group a node of this kind must occupy
    pub fn group(&self) -> Group {
        match self {
            Self::Play | Self::Loop => Group::Actions,
            Self::NumberLiteral | Self::BinaryArith => Group::Numbers,
            Self::TrackLiteral => Group::Tracks,
        }
    }

    /// Whether this kind can hold child statements
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Loop)
    }

    /// Slot contract for this kind
    pub fn arity(&self) -> Arity {
        match self {
            Self::Play => Arity {
                track_slots: 1,
                ..Arity::LEAF
            },
            Self::Loop => Arity {
                min_children: 1,
                max_children: None,
                track_slots: 0,
                number_slots: 1,
            },
            Self::BinaryArith => Arity {
                number_slots: 2,
                ..Arity::LEAF
            },
            Self::NumberLiteral | Self::TrackLiteral => Arity::LEAF,
        }
    }

    /// Payload a freshly created node of this kind starts with
    pub fn default_data(&self) -> Option<NodeData> {
        match self {
            Self::Play | Self::Loop => None,
            Self::NumberLiteral => Some(NodeData::Number { value: 0.0 }),
            Self::BinaryArith => Some(NodeData::Arithmetic {
                operator: ArithOperator::Add,
            }),
            Self::TrackLiteral => Some(NodeData::Track {
                track_id: String::new(),
            }),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic operator of a `binaryarith` node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOperator {
    /// Addition
    #[serde(rename = "+")]
    Add,
    /// Subtraction
    #[serde(rename = "-")]
    Subtract,
    /// Multiplication
    #[serde(rename = "*")]
    Multiply,
    /// Division
    #[serde(rename = "/")]
    Divide,
}

impl ArithOperator {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    /// Parse an operator symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            _ => None,
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    /// `numberliteral` value
    Number {
        /// Literal value
        value: f64,
    },
    /// `binaryarith` operator
    Arithmetic {
        /// Operator applied to the left and right sockets
        operator: ArithOperator,
    },
    /// `trackliteral` reference
    Track {
        /// Referenced track
        #[serde(rename = "trackId")]
        track_id: String,
    },
}

#[derive(Deserialize)]
struct NumberPayload {
    value: f64,
}

#[derive(Deserialize)]
struct ArithPayload {
    operator: ArithOperator,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackPayload {
    track_id: String,
}

impl NodeData {
    /// Decode a raw payload against the node kind.
    ///
    /// Kinds without a payload ignore `raw`. Fields the kind does not use are
    /// ignored too.
    pub fn decode(kind: NodeKind, raw: Value) -> Result<Option<Self>, serde_json::Error> {
        let data = match kind {
            NodeKind::Play | NodeKind::Loop => return Ok(None),
            NodeKind::NumberLiteral => {
                let NumberPayload { value } = serde_json::from_value(raw)?;
                Self::Number { value }
            }
            NodeKind::BinaryArith => {
                let ArithPayload { operator } = serde_json::from_value(raw)?;
                Self::Arithmetic { operator }
            }
            NodeKind::TrackLiteral => {
                let TrackPayload { track_id } = serde_json::from_value(raw)?;
                Self::Track { track_id }
            }
        };
        Ok(Some(data))
    }
}

/// Wire form of a [`Node`] before its payload is decoded
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: String,
    group: Group,
    #[serde(rename = "type")]
    kind: NodeKind,
    child_nodes: Vec<Node>,
    track_expressions: Vec<Option<Node>>,
    number_expressions: Vec<Option<Node>>,
    #[serde(default)]
    data: Option<Value>,
}

impl TryFrom<NodeRecord> for Node {
    type Error = serde_json::Error;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let data = match record.data {
            Some(raw) => NodeData::decode(record.kind, raw)?,
            None => None,
        };
        Ok(Self {
            id: record.id,
            group: record.group,
            kind: record.kind,
            child_nodes: record.child_nodes,
            track_expressions: record.track_expressions,
            number_expressions: record.number_expressions,
            data,
        })
    }
}

/// A node in a Function tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NodeRecord")]
pub struct Node {
    /// Unique node ID (`group_type_uuid`)
    pub id: String,
    /// Group the node occupies
    pub group: Group,
    /// Node kind
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Nested statements
    pub child_nodes: Vec<Node>,
    /// Track sockets
    pub track_expressions: Vec<Option<Node>>,
    /// Number sockets
    pub number_expressions: Vec<Option<Node>>,
    /// Kind-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

/// A Function: the top-level statement list
pub type FunctionTree = Vec<Node>;

impl Node {
    /// Create an empty node of the given kind with a fresh ID.
    ///
    /// Sockets are sized for the kind and left empty.
    pub fn create_empty(kind: NodeKind) -> Self {
        let arity = kind.arity();
        Self {
            id: encode_node_id(kind.group(), kind, None),
            group: kind.group(),
            kind,
            child_nodes: Vec::new(),
            track_expressions: vec![None; arity.track_slots],
            number_expressions: vec![None; arity.number_slots],
            data: kind.default_data(),
        }
    }

    /// A `play` node referencing `track_id`
    pub fn play(track_id: impl Into<String>) -> Self {
        let mut node = Self::create_empty(NodeKind::Play);
        node.track_expressions[0] = Some(Self::track_literal(track_id));
        node
    }

    /// A `loop` node repeating `children` `count` times
    pub fn loop_block(count: Node, children: Vec<Node>) -> Self {
        let mut node = Self::create_empty(NodeKind::Loop);
        node.number_expressions[0] = Some(count);
        node.child_nodes = children;
        node
    }

    /// A `numberliteral` node
    pub fn number_literal(value: f64) -> Self {
        Self::create_empty(NodeKind::NumberLiteral).with_data(NodeData::Number { value })
    }

    /// A `binaryarith` node with both operands filled
    pub fn binary_arith(operator: ArithOperator, left: Node, right: Node) -> Self {
        let mut node =
            Self::create_empty(NodeKind::BinaryArith).with_data(NodeData::Arithmetic { operator });
        node.number_expressions = vec![Some(left), Some(right)];
        node
    }

    /// A `trackliteral` node
    pub fn track_literal(track_id: impl Into<String>) -> Self {
        Self::create_empty(NodeKind::TrackLiteral).with_data(NodeData::Track {
            track_id: track_id.into(),
        })
    }

    /// Replace the payload
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace the ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Whether this node can hold child statements
    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    /// Every directly nested node: children, then number sockets, then track sockets.
    /// Empty sockets are skipped.
    pub fn nested(&self) -> impl Iterator<Item = &Node> {
        self.child_nodes
            .iter()
            .chain(self.number_expressions.iter().flatten())
            .chain(self.track_expressions.iter().flatten())
    }

    /// Mutable variant of [`Node::nested`]
    pub fn nested_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.child_nodes
            .iter_mut()
            .chain(self.number_expressions.iter_mut().flatten())
            .chain(self.track_expressions.iter_mut().flatten())
    }

    /// Socket collection for an expression group
    pub fn sockets(&self, group: Group) -> Option<&[Option<Node>]> {
        match group {
            Group::Numbers => Some(&self.number_expressions),
            Group::Tracks => Some(&self.track_expressions),
            Group::Actions => None,
        }
    }

    /// Mutable socket collection for an expression group
    pub fn sockets_mut(&mut self, group: Group) -> Option<&mut Vec<Option<Node>>> {
        match group {
            Group::Numbers => Some(&mut self.number_expressions),
            Group::Tracks => Some(&mut self.track_expressions),
            Group::Actions => None,
        }
    }
}

/// Create an empty node for a `(group, type)` pair.
///
/// Returns `None` when the kind does not belong to `group`.
pub fn create_empty(group: Group, kind: NodeKind) -> Option<Node> {
    (kind.group() == group).then(|| Node::create_empty(kind))
}
