//! Expression builder error types.

use super::NodeKey;

/// Errors that can occur while editing a filter expression.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpressionError {
    /// No condition or group has the key
    #[error("Expression node not found: {0}")]
    NodeNotFound(NodeKey),

    /// The key exists but is not a group
    #[error("Expression group not found: {0}")]
    GroupNotFound(NodeKey),

    /// The key exists but is not a condition
    #[error("Expression node {0} is not a condition")]
    NotACondition(NodeKey),

    /// Groups may only sit at the top level
    #[error("Group {0} cannot be nested inside another group")]
    NestingTooDeep(NodeKey),
}
