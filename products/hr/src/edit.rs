use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::OrgChartResult;
use crate::mutate::{insert_child, move_subtree, remove_subtree};
use crate::org_chart::{EmployeeRecord, OrgNode};

/// New manager for an employee already in the directory. `None` clears it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerChange {
    pub employee_id: String,
    pub manager_id: Option<String>,
}

/// Directory writes needed to turn one org chart into another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrgChartChanges {
    pub reassigned: Vec<ManagerChange>,
    pub hired: Vec<EmployeeRecord>,
    pub removed: Vec<String>,
}

impl OrgChartChanges {
    pub fn is_empty(&self) -> bool {
        self.reassigned.is_empty() && self.hired.is_empty() && self.removed.is_empty()
    }
}

/// Compare two charts by manager assignment.
///
/// Reassignments and hires come in `draft` pre-order, so a hired manager is
/// always listed before the hires reporting to them. Removals come in `base`
/// pre-order. Hire names are split at the first space; use an
/// [`EditSession`] to keep the original name parts.
pub fn diff(base: &OrgNode, draft: &OrgNode) -> OrgChartChanges {
    let before = managers_by_id(base);
    let after = managers_by_id(draft);
    let mut changes = OrgChartChanges::default();

    for node in draft.iter().filter(|node| !node.is_placeholder()) {
        let manager = after.get(node.id.as_str()).copied().flatten();
        match before.get(node.id.as_str()) {
            Some(&previous) if previous == manager => {}
            Some(_) => changes.reassigned.push(ManagerChange {
                employee_id: node.id.clone(),
                manager_id: manager.map(str::to_string),
            }),
            None => changes.hired.push(record_from_node(node, manager)),
        }
    }
    changes.removed = base
        .iter()
        .filter(|node| !node.is_placeholder() && !after.contains_key(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    changes
}

fn managers_by_id(tree: &OrgNode) -> HashMap<&str, Option<&str>> {
    let mut managers = HashMap::new();
    managers.insert(tree.id.as_str(), None);
    for node in tree.iter() {
        let manager = (!node.is_placeholder()).then_some(node.id.as_str());
        for child in &node.reports {
            managers.insert(child.id.as_str(), manager);
        }
    }
    managers
}

fn record_from_node(node: &OrgNode, manager: Option<&str>) -> EmployeeRecord {
    let (first_name, last_name) = node.name.split_once(' ').unwrap_or((node.name.as_str(), ""));
    EmployeeRecord {
        id: node.id.clone(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        manager_id: manager.map(str::to_string),
        position: node.position.clone(),
        department: node.department.clone(),
        email: node.email.clone(),
        phone: node.phone.clone(),
    }
}

/// Result of [`EditSession::commit`]: the chart to show from now on and the
/// directory writes that persist it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommittedEdit {
    pub tree: OrgNode,
    pub changes: OrgChartChanges,
}

/// Draft copy of an org chart for edit mode.
///
/// The base chart is never touched. A rejected edit leaves the draft as it
/// was. Dropping or discarding the session throws the draft away.
#[derive(Clone, Debug)]
pub struct EditSession {
    base: OrgNode,
    draft: OrgNode,
    hires: HashMap<String, EmployeeRecord>,
}

impl EditSession {
    pub fn begin(base: OrgNode) -> Self {
        Self {
            draft: base.clone(),
            base,
            hires: HashMap::new(),
        }
    }

    pub fn base(&self) -> &OrgNode {
        &self.base
    }

    pub fn draft(&self) -> &OrgNode {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.base
    }

    pub fn insert(&mut self, parent_id: &str, record: EmployeeRecord) -> OrgChartResult<&OrgNode> {
        self.draft = insert_child(&self.draft, parent_id, OrgNode::from(&record))?;
        debug!(employee_id = %record.id, %parent_id, "draft hire added");
        self.hires.insert(record.id.clone(), record);
        Ok(&self.draft)
    }

    pub fn remove(&mut self, node_id: &str) -> OrgChartResult<&OrgNode> {
        self.draft = remove_subtree(&self.draft, node_id)?;
        debug!(employee_id = %node_id, "draft subtree removed");
        Ok(&self.draft)
    }

    pub fn relocate(&mut self, node_id: &str, new_parent_id: &str) -> OrgChartResult<&OrgNode> {
        self.draft = move_subtree(&self.draft, node_id, new_parent_id)?;
        debug!(employee_id = %node_id, manager_id = %new_parent_id, "draft subtree moved");
        Ok(&self.draft)
    }

    /// Drop the draft and hand back the untouched base chart.
    pub fn discard(self) -> OrgNode {
        self.base
    }

    pub fn commit(self) -> CommittedEdit {
        let mut changes = diff(&self.base, &self.draft);
        for hire in &mut changes.hired {
            if let Some(record) = self.hires.get(&hire.id) {
                let manager_id = hire.manager_id.take();
                *hire = EmployeeRecord {
                    manager_id,
                    ..record.clone()
                };
            }
        }
        CommittedEdit {
            tree: self.draft,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrgChartError;
    use crate::org_chart::build;

    fn org() -> OrgNode {
        build(&[
            EmployeeRecord::new("ceo", "Anna", "Meier"),
            EmployeeRecord::new("cfo", "Urs", "Gerber").reporting_to("ceo"),
            EmployeeRecord::new("cto", "Luca", "Rossi").reporting_to("ceo"),
            EmployeeRecord::new("dev", "Mia", "Huber").reporting_to("cto"),
        ])
    }

    #[test]
    fn untouched_session_commits_nothing() {
        let session = EditSession::begin(org());
        assert!(!session.is_dirty());
        let committed = session.commit();
        assert!(committed.changes.is_empty());
        assert_eq!(committed.tree, org());
    }

    #[test]
    fn commit_lists_every_kind_of_change() {
        let mut session = EditSession::begin(org());
        session.relocate("dev", "cfo").unwrap();
        session
            .insert(
                "dev",
                EmployeeRecord::new("intern", "Anna Lena", "Vogt").in_department("Finance"),
            )
            .unwrap();
        session.remove("cto").unwrap();
        assert!(session.is_dirty());

        let committed = session.commit();
        assert_eq!(
            committed.changes.reassigned,
            vec![ManagerChange {
                employee_id: "dev".into(),
                manager_id: Some("cfo".into()),
            }]
        );
        assert_eq!(committed.changes.hired.len(), 1);
        let hire = &committed.changes.hired[0];
        assert_eq!(hire.first_name, "Anna Lena");
        assert_eq!(hire.last_name, "Vogt");
        assert_eq!(hire.manager_id.as_deref(), Some("dev"));
        assert_eq!(committed.changes.removed, vec!["cto".to_string()]);
    }

    #[test]
    fn hire_then_remove_leaves_no_trace() {
        let mut session = EditSession::begin(org());
        session
            .insert("ceo", EmployeeRecord::new("temp", "Nora", "Frei"))
            .unwrap();
        session.remove("temp").unwrap();
        assert!(!session.is_dirty());
        assert!(session.commit().changes.is_empty());
    }

    #[test]
    fn rejected_edit_keeps_the_draft() {
        let mut session = EditSession::begin(org());
        session.relocate("dev", "cfo").unwrap();
        let before = session.draft().clone();
        let err = session.relocate("ceo", "dev").unwrap_err();
        assert_eq!(err, OrgChartError::RootRemoval);
        assert_eq!(session.draft(), &before);
    }

    #[test]
    fn discard_returns_the_base_chart() {
        let mut session = EditSession::begin(org());
        session.remove("cfo").unwrap();
        assert_eq!(session.discard(), org());
    }

    #[test]
    fn hires_under_the_placeholder_have_no_manager() {
        let mut session = EditSession::begin(build(&[]));
        session
            .insert("0", EmployeeRecord::new("first", "Erika", "Muster"))
            .unwrap();
        let changes = session.commit().changes;
        assert_eq!(changes.hired.len(), 1);
        assert_eq!(changes.hired[0].manager_id, None);
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn plain_diff_splits_names() {
        let base = org();
        let hire = OrgNode::from(&EmployeeRecord::new("new", "Eva", "Roth"));
        let draft = insert_child(&base, "cfo", hire).unwrap();
        let changes = diff(&base, &draft);
        assert_eq!(changes.hired[0].first_name, "Eva");
        assert_eq!(changes.hired[0].last_name, "Roth");
        assert_eq!(changes.hired[0].manager_id.as_deref(), Some("cfo"));
    }

    #[test]
    fn sessions_from_one_base_diff_independently() {
        let mut first = EditSession::begin(org());
        let mut second = EditSession::begin(org());
        first.remove("cto").unwrap();
        second
            .insert("cto", EmployeeRecord::new("qa", "Tim", "Baer"))
            .unwrap();

        assert_eq!(first.commit().changes.removed, vec!["cto".to_string()]);
        let hired = second.commit().changes.hired;
        assert_eq!(hired.len(), 1);
        assert_eq!(hired[0].manager_id.as_deref(), Some("cto"));
    }
}
