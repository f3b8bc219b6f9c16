use std::{sync::Arc, time::Duration};

use async_graphql::{Request, Variables};
use chrono::Utc;
use entity::employees;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;

fn employee(
    first_name: &str,
    last_name: &str,
    department: &str,
    manager_id: Option<Uuid>,
) -> employees::Model {
    let now = Utc::now().into();
    employees::Model {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        manager_id,
        position: None,
        department: Some(department.to_string()),
        email: None,
        phone: None,
        created_at: now,
        updated_at: now,
    }
}

/// CEO -> CTO -> developer.
fn staff() -> Vec<employees::Model> {
    let ceo = employee("Anna", "Meier", "Management", None);
    let cto = employee("Luca", "Rossi", "Engineering", Some(ceo.id));
    let dev = employee("Mia", "Huber", "Engineering", Some(cto.id));
    vec![ceo, cto, dev]
}

fn schema_with(db: MockDatabase) -> SchemaType {
    build_schema(GraphqlData {
        pool: Arc::new(db.into_connection()),
        sessions: EditSessions::new(8, Duration::from_secs(600)),
    })
}

fn directory_of(rows: Vec<employees::Model>) -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows])
}

async fn run(schema: &SchemaType, query: &str, variables: Value) -> Value {
    let response = schema
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

async fn error_code(schema: &SchemaType, query: &str, variables: Value) -> String {
    let response = schema
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await;
    let error = response.errors.first().expect("expected an error");
    let code = error
        .extensions
        .as_ref()
        .and_then(|map| map.get("code"))
        .cloned()
        .expect("error without code");
    match code {
        async_graphql::Value::String(code) => code,
        other => panic!("unexpected code {other:?}"),
    }
}

async fn begin(schema: &SchemaType) -> String {
    let data = run(
        schema,
        "mutation { beginOrgChartEdit { id dirty } }",
        json!({}),
    )
    .await;
    assert_eq!(data["beginOrgChartEdit"]["dirty"], false);
    data["beginOrgChartEdit"]["id"].as_str().unwrap().to_string()
}

const MOVE: &str = r#"
    mutation Move($session: ID!, $node: ID!, $parent: ID!) {
        orgChartMove(sessionId: $session, nodeId: $node, newParentId: $parent) {
            dirty
            summary { employees depth }
        }
    }
"#;

#[tokio::test]
async fn health_and_version_need_no_database() {
    let schema = schema_with(MockDatabase::new(DatabaseBackend::Postgres));
    let data = run(&schema, "{ health { ok } version }", json!({})).await;
    assert_eq!(data["health"]["ok"], true);
    assert_eq!(data["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn org_chart_is_built_from_the_directory() {
    let rows = staff();
    let dev_id = rows[2].id.to_string();
    let schema = schema_with(directory_of(rows));
    let data = run(
        &schema,
        "{ orgChart { isPlaceholder tree summary { employees departments managers depth } } }",
        json!({}),
    )
    .await;
    let chart = &data["orgChart"];
    assert_eq!(chart["isPlaceholder"], false);
    assert_eq!(
        chart["summary"],
        json!({"employees": 3, "departments": 2, "managers": 2, "depth": 3})
    );
    assert_eq!(chart["tree"]["name"], "Anna Meier");
    assert_eq!(chart["tree"]["reports"][0]["reports"][0]["id"], dev_id);
}

#[tokio::test]
async fn empty_directory_reports_the_placeholder() {
    let schema = schema_with(directory_of(Vec::new()));
    let data = run(
        &schema,
        "{ orgChart { isPlaceholder tree summary { employees } } }",
        json!({}),
    )
    .await;
    assert_eq!(data["orgChart"]["isPlaceholder"], true);
    assert_eq!(data["orgChart"]["tree"]["id"], "0");
    assert_eq!(data["orgChart"]["summary"]["employees"], 0);
}

#[tokio::test]
async fn draft_edits_then_discard() {
    let rows = staff();
    let ceo_id = rows[0].id.to_string();
    let cto_id = rows[1].id.to_string();
    let dev_id = rows[2].id.to_string();
    let schema = schema_with(directory_of(rows));
    let session = begin(&schema).await;

    let inserted = run(
        &schema,
        r#"
            mutation Hire($session: ID!, $parent: ID!) {
                orgChartInsert(
                    sessionId: $session
                    parentId: $parent
                    employee: { firstName: "Eva", lastName: "Roth", department: "Sales" }
                ) {
                    dirty
                    tree
                    summary { employees departments }
                }
            }
        "#,
        json!({"session": session, "parent": ceo_id}),
    )
    .await;
    let payload = &inserted["orgChartInsert"];
    assert_eq!(payload["dirty"], true);
    assert_eq!(payload["summary"]["employees"], 4);
    assert_eq!(payload["summary"]["departments"], 3);
    assert_eq!(payload["tree"]["reports"][1]["name"], "Eva Roth");

    let moved = run(
        &schema,
        MOVE,
        json!({"session": session, "node": dev_id, "parent": ceo_id}),
    )
    .await;
    assert_eq!(moved["orgChartMove"]["summary"]["depth"], 2);

    let removed = run(
        &schema,
        r#"
            mutation Remove($session: ID!, $node: ID!) {
                orgChartRemove(sessionId: $session, nodeId: $node) { summary { employees } }
            }
        "#,
        json!({"session": session, "node": cto_id}),
    )
    .await;
    assert_eq!(removed["orgChartRemove"]["summary"]["employees"], 3);

    let discard = r#"
        mutation Discard($session: ID!) { discardOrgChartEdit(sessionId: $session) }
    "#;
    let data = run(&schema, discard, json!({"session": session})).await;
    assert_eq!(data["discardOrgChartEdit"], true);
    assert_eq!(
        error_code(&schema, discard, json!({"session": session})).await,
        "NOT_FOUND"
    );
}

#[tokio::test]
async fn structural_violations_are_bad_input() {
    let rows = staff();
    let ceo_id = rows[0].id.to_string();
    let cto_id = rows[1].id.to_string();
    let dev_id = rows[2].id.to_string();
    let schema = schema_with(directory_of(rows));
    let session = begin(&schema).await;

    assert_eq!(
        error_code(
            &schema,
            MOVE,
            json!({"session": session, "node": cto_id, "parent": dev_id}),
        )
        .await,
        "INVALID_INPUT"
    );
    assert_eq!(
        error_code(
            &schema,
            MOVE,
            json!({"session": session, "node": ceo_id, "parent": dev_id}),
        )
        .await,
        "INVALID_INPUT"
    );
    assert_eq!(
        error_code(
            &schema,
            MOVE,
            json!({"session": session, "node": "nobody", "parent": ceo_id}),
        )
        .await,
        "NOT_FOUND"
    );
    assert_eq!(
        error_code(
            &schema,
            MOVE,
            json!({"session": "not-a-session", "node": dev_id, "parent": ceo_id}),
        )
        .await,
        "INVALID_INPUT"
    );
}

#[tokio::test]
async fn commit_writes_reassignments_and_closes_the_session() {
    let rows = staff();
    let ceo_id = rows[0].id.to_string();
    let dev_id = rows[2].id.to_string();
    let db = directory_of(rows).append_exec_results([MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }]);
    let schema = schema_with(db);
    let session = begin(&schema).await;
    run(
        &schema,
        MOVE,
        json!({"session": session, "node": dev_id, "parent": ceo_id}),
    )
    .await;

    let commit = r#"
        mutation Commit($session: ID!) {
            commitOrgChartEdit(sessionId: $session) {
                reassigned hired removed
                summary { depth }
            }
        }
    "#;
    let data = run(&schema, commit, json!({"session": session})).await;
    assert_eq!(
        data["commitOrgChartEdit"],
        json!({"reassigned": 1, "hired": 0, "removed": 0, "summary": {"depth": 2}})
    );
    assert_eq!(
        error_code(&schema, commit, json!({"session": session})).await,
        "NOT_FOUND"
    );
}
