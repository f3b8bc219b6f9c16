//! Conversions between directory rows and org chart records.

use entity::employees;
use products_hr::{EmployeeRecord, OrgChartChanges, OrgNode, build};

use crate::{
    DbPool, DbResult, DirectoryChanges, NewEmployee, list_employees, parse_employee_id,
};

pub fn to_record(model: employees::Model) -> EmployeeRecord {
    EmployeeRecord {
        id: model.id.to_string(),
        first_name: model.first_name,
        last_name: model.last_name,
        manager_id: model.manager_id.map(|id| id.to_string()),
        position: model.position.unwrap_or_default(),
        department: model.department.unwrap_or_default(),
        email: model.email.unwrap_or_default(),
        phone: model.phone.unwrap_or_default(),
    }
}

pub async fn load_records(pool: &DbPool) -> DbResult<Vec<EmployeeRecord>> {
    let rows = list_employees(pool).await?;
    Ok(rows.into_iter().map(to_record).collect())
}

/// Fresh org chart from the current directory contents.
pub async fn load_chart(pool: &DbPool) -> DbResult<OrgNode> {
    let records = load_records(pool).await?;
    Ok(build(&records))
}

/// Writes needed to persist a committed edit. Fails on ids that are not
/// directory UUIDs.
pub fn to_directory_changes(changes: &OrgChartChanges) -> DbResult<DirectoryChanges> {
    let reassigned = changes
        .reassigned
        .iter()
        .map(|change| {
            Ok((
                parse_employee_id(&change.employee_id)?,
                change
                    .manager_id
                    .as_deref()
                    .map(parse_employee_id)
                    .transpose()?,
            ))
        })
        .collect::<DbResult<Vec<_>>>()?;
    let hired = changes
        .hired
        .iter()
        .map(to_new_employee)
        .collect::<DbResult<Vec<_>>>()?;
    let removed = changes
        .removed
        .iter()
        .map(|id| parse_employee_id(id))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(DirectoryChanges {
        reassigned,
        hired,
        removed,
    })
}

pub fn to_new_employee(record: &EmployeeRecord) -> DbResult<NewEmployee> {
    Ok(NewEmployee {
        id: parse_employee_id(&record.id)?,
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        manager_id: record
            .manager_id
            .as_deref()
            .map(parse_employee_id)
            .transpose()?,
        position: optional(&record.position),
        department: optional(&record.department),
        email: optional(&record.email),
        phone: optional(&record.phone),
    })
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
