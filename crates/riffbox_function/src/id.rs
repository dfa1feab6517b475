// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifier codec.
//!
//! Nodes are addressed as `group_type_uuid` and expression sockets (drop targets)
//! as `group_index_parentId`. The trailing segment of either form is opaque and
//! may itself contain `_`.
//!
//! Decoding never fails: fields that cannot be recovered come back as `None`.

use crate::node::{Group, NodeKind};
use uuid::Uuid;

const SEPARATOR: char = '_';

/// Decoded `group_type_uuid` identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIdParts {
    /// Node group
    pub group: Option<Group>,
    /// Node kind
    pub kind: Option<NodeKind>,
    /// Unique suffix
    pub id: Option<String>,
}

/// Decoded `group_index_parentId` identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropIdParts {
    /// Socket group
    pub group: Option<Group>,
    /// Socket index within the group
    pub index: Option<usize>,
    /// Node owning the socket
    pub parent_id: Option<String>,
}

impl DropIdParts {
    /// All three fields, or `None` if any is missing
    pub fn complete(&self) -> Option<(Group, usize, &str)> {
        Some((self.group?, self.index?, self.parent_id.as_deref()?))
    }
}

/// Encode a node ID. A fresh v4 UUID is used when `uuid` is `None`.
pub fn encode_node_id(group: Group, kind: NodeKind, uuid: Option<&str>) -> String {
    let uuid = uuid.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
    format!("{}{SEPARATOR}{}{SEPARATOR}{}", group.as_str(), kind.as_str(), uuid)
}

/// Decode a node ID produced by [`encode_node_id`]
pub fn decode_node_id(s: &str) -> NodeIdParts {
    let (group, kind, rest) = split3(s);
    NodeIdParts {
        group: group.and_then(Group::parse),
        kind: kind.and_then(NodeKind::parse),
        id: rest.map(str::to_string),
    }
}

/// Encode a drop-target ID for socket `index` of `parent_id`
pub fn encode_drop_id(group: Group, index: usize, parent_id: &str) -> String {
    format!("{}{SEPARATOR}{index}{SEPARATOR}{parent_id}", group.as_str())
}

/// Decode a drop-target ID produced by [`encode_drop_id`]
pub fn decode_drop_id(s: &str) -> DropIdParts {
    let (group, index, rest) = split3(s);
    DropIdParts {
        group: group.and_then(Group::parse),
        index: index.and_then(|i| i.parse().ok()),
        parent_id: rest.map(str::to_string),
    }
}

fn split3(s: &str) -> (Option<&str>, Option<&str>, Option<&str>) {
    let mut fields = s.splitn(3, SEPARATOR);
    (fields.next(), fields.next(), fields.next())
}
