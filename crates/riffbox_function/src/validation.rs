// SPDX-License-Identifier: MIT OR Apache-2.0
//! Function tree validation.
//!
//! Untrusted trees go through two passes:
//! 1. Structural pre-validation of the raw JSON: required fields, field types,
//!    and slot/group agreement. Expression sockets may hold `null`.
//! 2. Semantic validation of the typed tree: every socket filled and each kind's
//!    arity and payload respected.
//!
//! Both passes report failure as `false` / `None`. The `check_*` variants
//! return the [`Rejection`] for diagnostics.

use crate::node::{FunctionTree, Group, Node, NodeData, NodeKind};
use serde_json::{Map, Value};

const SLOT_FIELDS: [(&str, Group); 3] = [
    ("childNodes", Group::Actions),
    ("trackExpressions", Group::Tracks),
    ("numberExpressions", Group::Numbers),
];

/// Why a tree was refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// The top level is not an array
    #[error("Expected an array of statements")]
    NotAnArray,

    /// A node is not a JSON object
    #[error("Expected a node object in the {0} group")]
    NotAnObject(Group),

    /// A required field is missing or has the wrong type
    #[error("Node field '{0}' is missing or has the wrong type")]
    MissingField(&'static str),

    /// A statement list holds a `null` placeholder
    #[error("Node '{0}' has an empty statement placeholder")]
    NullStatement(String),

    /// The node's group tag does not match its slot
    #[error("Node '{id}' is tagged '{found}' but sits in a {expected} slot")]
    WrongGroup {
        /// Node ID
        id: String,
        /// Group the slot accepts
        expected: Group,
        /// Group tag found on the node
        found: String,
    },

    /// The node's kind does not belong to the slot's group
    #[error("Node '{id}' of type '{kind}' cannot sit in a {expected} slot")]
    KindOutsideGroup {
        /// Node ID
        id: String,
        /// Node kind
        kind: NodeKind,
        /// Group the slot accepts
        expected: Group,
    },

    /// The tree passed the structural pass but does not match the typed model
    #[error("Malformed node: {0}")]
    Malformed(String),

    /// An expression socket is still empty
    #[error("Node '{id}' has an empty {group} socket at index {index}")]
    EmptySocket {
        /// Node ID
        id: String,
        /// Socket group
        group: Group,
        /// Socket index
        index: usize,
    },

    /// Wrong number of child statements
    #[error("Node '{id}' of type '{kind}' cannot hold {found} child statements")]
    ChildCount {
        /// Node ID
        id: String,
        /// Node kind
        kind: NodeKind,
        /// Number of children found
        found: usize,
    },

    /// Wrong number of sockets
    #[error("Node '{id}' of type '{kind}' needs {expected} {group} sockets, found {found}")]
    SocketCount {
        /// Node ID
        id: String,
        /// Node kind
        kind: NodeKind,
        /// Socket group
        group: Group,
        /// Required socket count
        expected: usize,
        /// Socket count found
        found: usize,
    },

    /// Payload missing or invalid for the kind
    #[error("Node '{id}' of type '{kind}' has an invalid payload")]
    InvalidData {
        /// Node ID
        id: String,
        /// Node kind
        kind: NodeKind,
    },
}

/// Structural pass over one raw node expected in `expected` group
pub fn pre_validate(node: &Value, expected: Group) -> bool {
    check_structure(node, expected).is_ok()
}

/// Structural pass, reporting the first problem
pub fn check_structure(node: &Value, expected: Group) -> Result<(), Rejection> {
    let object = node.as_object().ok_or(Rejection::NotAnObject(expected))?;
    let id = string_field(object, "id")?;
    string_field(object, "type")?;
    let group = string_field(object, "group")?;
    if group != expected.as_str() {
        return Err(Rejection::WrongGroup {
            id: id.to_string(),
            expected,
            found: group.to_string(),
        });
    }

    for (field, slot_group) in SLOT_FIELDS {
        let items = object
            .get(field)
            .and_then(Value::as_array)
            .ok_or(Rejection::MissingField(field))?;
        for item in items {
            if item.is_null() {
                if slot_group == Group::Actions {
                    return Err(Rejection::NullStatement(id.to_string()));
                }
                continue;
            }
            check_structure(item, slot_group)?;
        }
    }
    Ok(())
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, Rejection> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(Rejection::MissingField(field))
}

/// Semantic pass over a typed node expected in `expected` group
pub fn validate_statement(node: &Node, expected: Group) -> bool {
    check_statement(node, expected).is_ok()
}

/// Semantic pass, reporting the first problem
pub fn check_statement(node: &Node, expected: Group) -> Result<(), Rejection> {
    for child in &node.child_nodes {
        check_statement(child, Group::Actions)?;
    }
    for (group, sockets) in [
        (Group::Numbers, &node.number_expressions),
        (Group::Tracks, &node.track_expressions),
    ] {
        for (index, socket) in sockets.iter().enumerate() {
            let expression = socket.as_ref().ok_or_else(|| Rejection::EmptySocket {
                id: node.id.clone(),
                group,
                index,
            })?;
            check_statement(expression, group)?;
        }
    }

    if node.group != expected {
        return Err(Rejection::WrongGroup {
            id: node.id.clone(),
            expected,
            found: node.group.to_string(),
        });
    }
    if node.kind.group() != expected {
        return Err(Rejection::KindOutsideGroup {
            id: node.id.clone(),
            kind: node.kind,
            expected,
        });
    }

    let arity = node.kind.arity();
    if !arity.accepts_children(node.child_nodes.len()) {
        return Err(Rejection::ChildCount {
            id: node.id.clone(),
            kind: node.kind,
            found: node.child_nodes.len(),
        });
    }
    for (group, expected_slots, found) in [
        (Group::Tracks, arity.track_slots, node.track_expressions.len()),
        (Group::Numbers, arity.number_slots, node.number_expressions.len()),
    ] {
        if expected_slots != found {
            return Err(Rejection::SocketCount {
                id: node.id.clone(),
                kind: node.kind,
                group,
                expected: expected_slots,
                found,
            });
        }
    }

    let payload_ok = match (node.kind, &node.data) {
        (NodeKind::Play | NodeKind::Loop, _) => true,
        (NodeKind::NumberLiteral, Some(NodeData::Number { value })) => value.is_finite(),
        (NodeKind::BinaryArith, Some(NodeData::Arithmetic { .. })) => true,
        (NodeKind::TrackLiteral, Some(NodeData::Track { track_id })) => !track_id.is_empty(),
        (NodeKind::NumberLiteral | NodeKind::BinaryArith | NodeKind::TrackLiteral, _) => false,
    };
    if !payload_ok {
        return Err(Rejection::InvalidData {
            id: node.id.clone(),
            kind: node.kind,
        });
    }
    Ok(())
}

/// Accept `raw` as a Function only if it passes both passes
pub fn validate_function(raw: &Value) -> Option<FunctionTree> {
    match check_function(raw) {
        Ok(tree) => Some(tree),
        Err(rejection) => {
            tracing::debug!(%rejection, "function rejected");
            None
        }
    }
}

/// Both passes, reporting the first problem
pub fn check_function(raw: &Value) -> Result<FunctionTree, Rejection> {
    let items = raw.as_array().ok_or(Rejection::NotAnArray)?;
    for item in items {
        check_structure(item, Group::Actions)?;
    }
    let tree: FunctionTree =
        serde_json::from_value(raw.clone()).map_err(|e| Rejection::Malformed(e.to_string()))?;
    for node in &tree {
        check_statement(node, Group::Actions)?;
    }
    Ok(tree)
}
