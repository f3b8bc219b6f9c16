//! Bridges the employee table and the org chart, plus the demo seed.

use platform_db::{DbPool, NewEmployee, insert_employee, list_employees};
use sea_orm::TransactionTrait;
use tracing::info;
use uuid::Uuid;

pub use platform_db::directory::{load_chart, to_directory_changes};

/// Demo organization used by the `seed` command. Managers precede their
/// reports.
pub fn demo_directory() -> Vec<NewEmployee> {
    struct Seed {
        first_name: &'static str,
        last_name: &'static str,
        position: &'static str,
        department: &'static str,
        manager: Option<usize>,
    }
    let seeds = [
        Seed { first_name: "Anna", last_name: "Meier", position: "Chief Executive Officer", department: "Management", manager: None },
        Seed { first_name: "Urs", last_name: "Gerber", position: "Chief Financial Officer", department: "Finance", manager: Some(0) },
        Seed { first_name: "Luca", last_name: "Rossi", position: "Chief Technology Officer", department: "Engineering", manager: Some(0) },
        Seed { first_name: "Sophie", last_name: "Favre", position: "Head of Sales", department: "Sales", manager: Some(0) },
        Seed { first_name: "Lea", last_name: "Graf", position: "Accountant", department: "Finance", manager: Some(1) },
        Seed { first_name: "Mia", last_name: "Huber", position: "Software Engineer", department: "Engineering", manager: Some(2) },
        Seed { first_name: "Noah", last_name: "Keller", position: "Software Engineer", department: "Engineering", manager: Some(2) },
        Seed { first_name: "Elias", last_name: "Bonvin", position: "Account Executive", department: "Sales", manager: Some(3) },
    ];

    let ids: Vec<Uuid> = seeds.iter().map(|_| Uuid::new_v4()).collect();
    seeds
        .iter()
        .zip(&ids)
        .map(|(seed, id)| NewEmployee {
            id: *id,
            first_name: seed.first_name.to_string(),
            last_name: seed.last_name.to_string(),
            manager_id: seed.manager.map(|index| ids[index]),
            position: Some(seed.position.to_string()),
            department: Some(seed.department.to_string()),
            email: Some(format!(
                "{}.{}@example.ch",
                seed.first_name.to_lowercase(),
                seed.last_name.to_lowercase()
            )),
            phone: None,
        })
        .collect()
}

/// Insert the demo organization unless the directory already has employees.
/// Returns the number of inserted rows.
pub async fn seed(pool: &DbPool) -> anyhow::Result<usize> {
    if !list_employees(pool).await?.is_empty() {
        info!("employee directory not empty; skipping seed");
        return Ok(0);
    }
    let employees = demo_directory();
    let count = employees.len();
    let txn = pool.begin().await?;
    for employee in employees {
        insert_employee(&txn, employee).await?;
    }
    txn.commit().await?;
    info!(count, "demo employees seeded");
    Ok(count)
}
