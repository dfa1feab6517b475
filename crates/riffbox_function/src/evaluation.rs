// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expression evaluation.

use crate::node::{ArithOperator, Group, Node, NodeData, NodeKind};

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// A socket holds no expression
    #[error("Node '{id}' has an empty {group} socket at index {index}")]
    EmptySocket {
        /// Node owning the socket
        id: String,
        /// Socket group
        group: Group,
        /// Socket index
        index: usize,
    },

    /// Right operand of a division is zero
    #[error("Division by zero in node '{0}'")]
    DivisionByZero(String),

    /// Node does not produce a value of the requested group
    #[error("Node '{id}' of type '{kind}' is not a {expected} expression")]
    WrongGroup {
        /// Node ID
        id: String,
        /// Node kind
        kind: NodeKind,
        /// Requested group
        expected: Group,
    },

    /// Payload missing or of the wrong shape
    #[error("Node '{0}' is missing its payload")]
    MissingData(String),
}

/// Compute the value of a `numbers` group subtree
pub fn evaluate_number(node: &Node) -> Result<f64, EvaluationError> {
    match (node.kind, &node.data) {
        (NodeKind::NumberLiteral, Some(NodeData::Number { value })) => Ok(*value),
        (NodeKind::BinaryArith, Some(NodeData::Arithmetic { operator })) => {
            let left = evaluate_number(operand(node, 0)?)?;
            let right = evaluate_number(operand(node, 1)?)?;
            match operator {
                ArithOperator::Add => Ok(left + right),
                ArithOperator::Subtract => Ok(left - right),
                ArithOperator::Multiply => Ok(left * right),
                ArithOperator::Divide if right == 0.0 => {
                    Err(EvaluationError::DivisionByZero(node.id.clone()))
                }
                ArithOperator::Divide => Ok(left / right),
            }
        }
        (NodeKind::NumberLiteral | NodeKind::BinaryArith, _) => {
            Err(EvaluationError::MissingData(node.id.clone()))
        }
        (NodeKind::Play | NodeKind::Loop | NodeKind::TrackLiteral, _) => {
            Err(wrong_group(node, Group::Numbers))
        }
    }
}

/// Resolve the track referenced by a `tracks` group node
pub fn evaluate_track(node: &Node) -> Result<&str, EvaluationError> {
    match (node.kind, &node.data) {
        (NodeKind::TrackLiteral, Some(NodeData::Track { track_id })) if !track_id.is_empty() => {
            Ok(track_id.as_str())
        }
        (NodeKind::TrackLiteral, _) => Err(EvaluationError::MissingData(node.id.clone())),
        _ => Err(wrong_group(node, Group::Tracks)),
    }
}

/// The expression in socket `index` of `group`, or an error if empty
pub fn socket(node: &Node, group: Group, index: usize) -> Result<&Node, EvaluationError> {
    node.sockets(group)
        .and_then(|sockets| sockets.get(index))
        .and_then(Option::as_ref)
        .ok_or_else(|| EvaluationError::EmptySocket {
            id: node.id.clone(),
            group,
            index,
        })
}

fn operand(node: &Node, index: usize) -> Result<&Node, EvaluationError> {
    socket(node, Group::Numbers, index)
}

fn wrong_group(node: &Node, expected: Group) -> EvaluationError {
    EvaluationError::WrongGroup {
        id: node.id.clone(),
        kind: node.kind,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: f64) -> Node {
        Node::number_literal(value)
    }

    #[test]
    fn test_arithmetic() {
        let expr = Node::binary_arith(
            ArithOperator::Multiply,
            Node::binary_arith(ArithOperator::Add, lit(1.0), lit(2.0)),
            Node::binary_arith(ArithOperator::Divide, lit(8.0), lit(4.0)),
        );
        assert_eq!(evaluate_number(&expr), Ok(6.0));
        let diff = Node::binary_arith(ArithOperator::Subtract, lit(1.0), lit(3.0));
        assert_eq!(evaluate_number(&diff), Ok(-2.0));
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Node::binary_arith(ArithOperator::Divide, lit(1.0), lit(0.0)).with_id("div");
        assert_eq!(
            evaluate_number(&expr),
            Err(EvaluationError::DivisionByZero("div".to_string()))
        );
    }

    #[test]
    fn test_empty_socket() {
        let mut expr = Node::binary_arith(ArithOperator::Add, lit(1.0), lit(2.0)).with_id("sum");
        expr.number_expressions[1] = None;
        assert_eq!(
            evaluate_number(&expr),
            Err(EvaluationError::EmptySocket {
                id: "sum".to_string(),
                group: Group::Numbers,
                index: 1,
            })
        );
    }

    #[test]
    fn test_wrong_group() {
        let track = Node::track_literal("song");
        assert!(matches!(
            evaluate_number(&track),
            Err(EvaluationError::WrongGroup { expected: Group::Numbers, .. })
        ));
        assert_eq!(evaluate_track(&track), Ok("song"));
        assert!(evaluate_track(&lit(1.0)).is_err());
        assert!(matches!(
            evaluate_track(&Node::track_literal("")),
            Err(EvaluationError::MissingData(_))
        ));
    }
}
