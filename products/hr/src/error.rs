use thiserror::Error;

pub type OrgChartResult<T> = Result<T, OrgChartError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrgChartError {
    #[error("org chart node {0} not found")]
    NodeNotFound(String),
    #[error("employee {0} is already part of the org chart")]
    DuplicateId(String),
    #[error("id {0} is reserved for the empty org chart")]
    ReservedId(String),
    #[error("the root of the org chart cannot be removed or moved")]
    RootRemoval,
    #[error("cannot move {node} under {target}: target is inside its own subtree")]
    InvalidMove { node: String, target: String },
}
