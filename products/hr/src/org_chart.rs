use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Id of the node returned by [`build`] when the directory is empty. No
/// employee may use it.
pub const PLACEHOLDER_ID: &str = "0";
pub const PLACEHOLDER_NAME: &str = "No employees";

/// Employee as delivered by the directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl EmployeeRecord {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    pub fn reporting_to(mut self, manager_id: impl Into<String>) -> Self {
        self.manager_id = Some(manager_id.into());
        self
    }

    pub fn in_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A node of the org chart. Each node owns its direct reports.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrgNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<OrgNode>,
}

impl From<&EmployeeRecord> for OrgNode {
    fn from(record: &EmployeeRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.full_name(),
            position: record.position.clone(),
            department: record.department.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            reports: Vec::new(),
        }
    }
}

impl OrgNode {
    /// Stand-in root for an organization without employees.
    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_ID.to_string(),
            name: PLACEHOLDER_NAME.to_string(),
            position: String::new(),
            department: String::new(),
            email: String::new(),
            phone: String::new(),
            reports: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_ID
    }

    /// Pre-order traversal: a node is yielded before its reports, reports in
    /// their stored order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    pub fn find(&self, id: &str) -> Option<&OrgNode> {
        self.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn parent_of(&self, id: &str) -> Option<&OrgNode> {
        self.iter()
            .find(|node| node.reports.iter().any(|child| child.id == id))
    }

    /// Child indices leading from `self` to the node with `id`. Empty for
    /// `self`.
    pub(crate) fn index_path(&self, id: &str) -> Option<Vec<usize>> {
        let mut stack: Vec<(&OrgNode, Vec<usize>)> = vec![(self, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if node.id == id {
                return Some(path);
            }
            for (index, child) in node.reports.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child, child_path));
            }
        }
        None
    }

    /// `path` must come from [`OrgNode::index_path`] on this same tree.
    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> &mut OrgNode {
        let mut node = self;
        for &index in path {
            node = &mut node.reports[index];
        }
        node
    }
}

impl<'a> IntoIterator for &'a OrgNode {
    type Item = &'a OrgNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a OrgNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a OrgNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.reports.iter().rev());
        Some(node)
    }
}

/// Build the org chart from a flat employee list.
///
/// The first employee without a resolvable manager becomes the root. Every
/// later employee without one (missing, dangling or self reference) is
/// attached directly under the root. Manager cycles are broken by cutting the
/// link that closes the loop, so the result always has exactly one root and
/// contains every distinct id once. Records using [`PLACEHOLDER_ID`] are
/// skipped; with nothing left the placeholder is returned.
pub fn build(records: &[EmployeeRecord]) -> OrgNode {
    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut members: Vec<&EmployeeRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.id == PLACEHOLDER_ID {
            warn!(employee_id = %record.id, "reserved employee id ignored");
            continue;
        }
        if lookup.contains_key(record.id.as_str()) {
            warn!(employee_id = %record.id, "duplicate employee id ignored");
            continue;
        }
        lookup.insert(record.id.as_str(), members.len());
        members.push(record);
    }
    if members.is_empty() {
        return OrgNode::placeholder();
    }

    let mut managers: Vec<Option<usize>> = members
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let manager_id = record.manager_id.as_deref()?;
            let resolved = lookup
                .get(manager_id)
                .copied()
                .filter(|&manager| manager != index);
            if resolved.is_none() {
                debug!(employee_id = %record.id, %manager_id, "manager reference not resolvable");
            }
            resolved
        })
        .collect();
    break_cycles(&members, &mut managers);

    let mut reports: Vec<Vec<usize>> = vec![Vec::new(); members.len()];
    let mut root: Option<usize> = None;
    for (index, manager) in managers.iter().enumerate() {
        match (*manager, root) {
            (Some(manager), _) => reports[manager].push(index),
            (None, None) => root = Some(index),
            (None, Some(root)) => {
                debug!(employee_id = %members[index].id, "orphan attached to root");
                reports[root].push(index);
            }
        }
    }

    assemble(&members, &reports, root.unwrap_or(0))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Settled,
}

fn break_cycles(members: &[&EmployeeRecord], managers: &mut [Option<usize>]) {
    let mut marks = vec![Mark::Unvisited; managers.len()];
    let mut path: Vec<usize> = Vec::new();
    for start in 0..managers.len() {
        let mut current = Some(start);
        while let Some(index) = current {
            match marks[index] {
                Mark::Settled => break,
                Mark::OnPath => {
                    if let Some(&closing) = path.last() {
                        warn!(
                            employee_id = %members[closing].id,
                            manager_id = %members[index].id,
                            "manager cycle broken"
                        );
                        managers[closing] = None;
                    }
                    break;
                }
                Mark::Unvisited => {
                    marks[index] = Mark::OnPath;
                    path.push(index);
                    current = managers[index];
                }
            }
        }
        for index in path.drain(..) {
            marks[index] = Mark::Settled;
        }
    }
}

fn assemble(members: &[&EmployeeRecord], reports: &[Vec<usize>], root: usize) -> OrgNode {
    // Parents precede their reports in `order`; walking it backwards builds
    // every subtree before the node that owns it.
    let mut order = Vec::with_capacity(members.len());
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(reports[index].iter().copied());
    }

    let mut built: Vec<Option<OrgNode>> = (0..members.len()).map(|_| None).collect();
    for &index in order.iter().rev() {
        let mut node = OrgNode::from(members[index]);
        node.reports = reports[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(node);
    }
    built[root].take().unwrap_or_else(OrgNode::placeholder)
}

pub fn count_nodes(node: &OrgNode) -> usize {
    node.iter().count()
}

pub fn count_distinct_departments(node: &OrgNode) -> usize {
    node.iter()
        .map(|node| node.department.as_str())
        .filter(|department| !department.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn count_nodes_with_children(node: &OrgNode) -> usize {
    node.iter().filter(|node| !node.reports.is_empty()).count()
}

/// Longest root-to-leaf path, counting `node` itself as depth 1.
pub fn max_depth(node: &OrgNode) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(node, 1)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.reports.iter().map(|child| (child, depth + 1)));
    }
    deepest
}

/// Headline figures shown above the chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrgChartSummary {
    pub employees: usize,
    pub departments: usize,
    pub managers: usize,
    pub depth: usize,
}

impl OrgChartSummary {
    pub fn of(tree: &OrgNode) -> Self {
        if tree.is_placeholder() && tree.reports.is_empty() {
            return Self::default();
        }
        Self {
            employees: count_nodes(tree),
            departments: count_distinct_departments(tree),
            managers: count_nodes_with_children(tree),
            depth: max_depth(tree),
        }
    }
}
