//! HR vertical slice.
//!
//! The org chart is derived from the flat employee directory: every employee
//! may name a manager, and [`build`] turns that list into a single-rooted tree
//! that the chart view walks top-down. Edits are applied to a draft copy held
//! by an [`EditSession`] and translated back into directory changes on commit.

mod edit;
mod error;
mod mutate;
mod org_chart;

pub use edit::{CommittedEdit, EditSession, ManagerChange, OrgChartChanges, diff};
pub use error::{OrgChartError, OrgChartResult};
pub use mutate::{insert_child, move_subtree, remove_subtree};
pub use org_chart::{
    EmployeeRecord, Iter, OrgChartSummary, OrgNode, PLACEHOLDER_ID, PLACEHOLDER_NAME, build,
    count_distinct_departments, count_nodes, count_nodes_with_children, max_depth,
};
