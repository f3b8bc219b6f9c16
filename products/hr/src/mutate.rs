//! Edits on an org chart. Every function leaves its input untouched and
//! returns the edited copy.

use std::collections::HashSet;

use crate::error::{OrgChartError, OrgChartResult};
use crate::org_chart::OrgNode;

/// Append `new_node` (with whatever reports it carries) under `parent_id`.
pub fn insert_child(tree: &OrgNode, parent_id: &str, new_node: OrgNode) -> OrgChartResult<OrgNode> {
    let path = tree
        .index_path(parent_id)
        .ok_or_else(|| OrgChartError::NodeNotFound(parent_id.to_string()))?;

    if let Some(reserved) = new_node.iter().find(|node| node.is_placeholder()) {
        return Err(OrgChartError::ReservedId(reserved.id.clone()));
    }
    {
        let mut seen: HashSet<&str> = tree.iter().map(|node| node.id.as_str()).collect();
        if let Some(duplicate) = new_node.iter().find(|node| !seen.insert(node.id.as_str())) {
            return Err(OrgChartError::DuplicateId(duplicate.id.clone()));
        }
    }

    let mut next = tree.clone();
    next.node_at_mut(&path).reports.push(new_node);
    Ok(next)
}

/// Detach `node_id` together with its whole subtree.
pub fn remove_subtree(tree: &OrgNode, node_id: &str) -> OrgChartResult<OrgNode> {
    let path = tree
        .index_path(node_id)
        .ok_or_else(|| OrgChartError::NodeNotFound(node_id.to_string()))?;
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(OrgChartError::RootRemoval);
    };

    let mut next = tree.clone();
    next.node_at_mut(parent_path).reports.remove(index);
    Ok(next)
}

/// Re-parent `node_id` (and its reports) under `new_parent_id`, appending it
/// after the new manager's existing reports.
pub fn move_subtree(tree: &OrgNode, node_id: &str, new_parent_id: &str) -> OrgChartResult<OrgNode> {
    let path = tree
        .index_path(node_id)
        .ok_or_else(|| OrgChartError::NodeNotFound(node_id.to_string()))?;
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(OrgChartError::RootRemoval);
    };
    if !tree.contains(new_parent_id) {
        return Err(OrgChartError::NodeNotFound(new_parent_id.to_string()));
    }

    let mut next = tree.clone();
    let detached = next.node_at_mut(parent_path).reports.remove(index);
    if detached.contains(new_parent_id) {
        return Err(OrgChartError::InvalidMove {
            node: node_id.to_string(),
            target: new_parent_id.to_string(),
        });
    }
    let target = next
        .index_path(new_parent_id)
        .ok_or_else(|| OrgChartError::NodeNotFound(new_parent_id.to_string()))?;
    next.node_at_mut(&target).reports.push(detached);
    Ok(next)
}
