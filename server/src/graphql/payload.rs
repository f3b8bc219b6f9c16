use async_graphql::{ID, InputObject, Json, SimpleObject};
use products_hr::{CommittedEdit, EditSession, EmployeeRecord, OrgChartSummary, OrgNode};
use uuid::Uuid;

#[derive(Clone, Debug, SimpleObject)]
pub struct HealthPayload {
    pub ok: bool,
}

#[derive(Clone, Copy, Debug, SimpleObject)]
pub struct SummaryPayload {
    pub employees: i64,
    pub departments: i64,
    pub managers: i64,
    pub depth: i64,
}

impl From<OrgChartSummary> for SummaryPayload {
    fn from(summary: OrgChartSummary) -> Self {
        Self {
            employees: count(summary.employees),
            departments: count(summary.departments),
            managers: count(summary.managers),
            depth: count(summary.depth),
        }
    }
}

fn count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OrgChartPayload {
    /// Nested `{ id name position department email phone reports }` objects.
    pub tree: Json<OrgNode>,
    pub summary: SummaryPayload,
    /// True when the directory is empty and `tree` is only a stand-in.
    pub is_placeholder: bool,
}

impl From<OrgNode> for OrgChartPayload {
    fn from(tree: OrgNode) -> Self {
        Self {
            summary: OrgChartSummary::of(&tree).into(),
            is_placeholder: tree.is_placeholder(),
            tree: Json(tree),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EditSessionPayload {
    pub id: ID,
    /// The draft chart.
    pub tree: Json<OrgNode>,
    pub summary: SummaryPayload,
    pub dirty: bool,
}

impl EditSessionPayload {
    pub fn new(id: Uuid, session: &EditSession) -> Self {
        Self {
            id: ID(id.to_string()),
            tree: Json(session.draft().clone()),
            summary: OrgChartSummary::of(session.draft()).into(),
            dirty: session.is_dirty(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CommitPayload {
    pub reassigned: i64,
    pub hired: i64,
    pub removed: i64,
    pub tree: Json<OrgNode>,
    pub summary: SummaryPayload,
}

impl From<CommittedEdit> for CommitPayload {
    fn from(committed: CommittedEdit) -> Self {
        Self {
            reassigned: count(committed.changes.reassigned.len()),
            hired: count(committed.changes.hired.len()),
            removed: count(committed.changes.removed.len()),
            summary: OrgChartSummary::of(&committed.tree).into(),
            tree: Json(committed.tree),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct NewEmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewEmployeeInput {
    pub fn into_record(self, id: Uuid) -> EmployeeRecord {
        EmployeeRecord {
            id: id.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            manager_id: None,
            position: self.position.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
        }
    }
}
