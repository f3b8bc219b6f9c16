mod payload;

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ID, Object, ResultExt, Schema};
use platform_api::{ApiError, internal_error};
use platform_db::DbPool;
use products_hr::EditSession;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{directory, sessions::EditSessions};

pub use payload::{
    CommitPayload, EditSessionPayload, HealthPayload, NewEmployeeInput, OrgChartPayload,
    SummaryPayload,
};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Request-independent data shared by every resolver.
#[derive(Clone)]
pub struct GraphqlData {
    pub pool: Arc<DbPool>,
    pub sessions: EditSessions,
}

pub fn build_schema(data: GraphqlData) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(data)
        .finish()
}

/// SDL of the schema; no data is needed to print it.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

fn graphql_data<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a GraphqlData> {
    ctx.data::<GraphqlData>()
        .map_err(|_| internal_error(anyhow::anyhow!("missing graphql data")))
}

fn parse_session_id(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str())
        .map_err(|_| ApiError::invalid_input(format!("invalid session id {}", id.as_str())))
        .extend()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> HealthPayload {
        HealthPayload { ok: true }
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// The org chart as currently stored in the employee directory.
    #[instrument(name = "graphql.org_chart", skip_all)]
    async fn org_chart(&self, ctx: &Context<'_>) -> async_graphql::Result<OrgChartPayload> {
        let data = graphql_data(ctx)?;
        let tree = directory::load_chart(&data.pool)
            .await
            .map_err(internal_error)?;
        Ok(tree.into())
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Start editing a draft copy of the current org chart.
    #[instrument(name = "graphql.begin_org_chart_edit", skip_all)]
    async fn begin_org_chart_edit(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<EditSessionPayload> {
        let data = graphql_data(ctx)?;
        let tree = directory::load_chart(&data.pool)
            .await
            .map_err(internal_error)?;
        let id = Uuid::new_v4();
        let session = EditSession::begin(tree);
        let payload = EditSessionPayload::new(id, &session);
        data.sessions.open(id, session).await.extend()?;
        Ok(payload)
    }

    /// Add a new employee under `parent_id` in the draft.
    #[instrument(name = "graphql.org_chart_insert", skip_all)]
    async fn org_chart_insert(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        parent_id: ID,
        employee: NewEmployeeInput,
    ) -> async_graphql::Result<EditSessionPayload> {
        let data = graphql_data(ctx)?;
        let id = parse_session_id(&session_id)?;
        if employee.first_name.trim().is_empty() && employee.last_name.trim().is_empty() {
            return Err(ApiError::invalid_input("employee name is required")).extend();
        }
        let record = employee.into_record(Uuid::new_v4());
        data.sessions
            .update(id, |session| {
                session.insert(parent_id.as_str(), record)?;
                Ok(EditSessionPayload::new(id, session))
            })
            .await
            .extend()
    }

    /// Remove `node_id` and everyone reporting to them from the draft.
    #[instrument(name = "graphql.org_chart_remove", skip_all)]
    async fn org_chart_remove(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        node_id: ID,
    ) -> async_graphql::Result<EditSessionPayload> {
        let data = graphql_data(ctx)?;
        let id = parse_session_id(&session_id)?;
        data.sessions
            .update(id, |session| {
                session.remove(node_id.as_str())?;
                Ok(EditSessionPayload::new(id, session))
            })
            .await
            .extend()
    }

    /// Move `node_id` with its reports under `new_parent_id` in the draft.
    #[instrument(name = "graphql.org_chart_move", skip_all)]
    async fn org_chart_move(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        node_id: ID,
        new_parent_id: ID,
    ) -> async_graphql::Result<EditSessionPayload> {
        let data = graphql_data(ctx)?;
        let id = parse_session_id(&session_id)?;
        data.sessions
            .update(id, |session| {
                session.relocate(node_id.as_str(), new_parent_id.as_str())?;
                Ok(EditSessionPayload::new(id, session))
            })
            .await
            .extend()
    }

    /// Persist the draft to the employee directory and close the session.
    /// The session stays open when the write fails.
    #[instrument(name = "graphql.commit_org_chart_edit", skip_all)]
    async fn commit_org_chart_edit(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
    ) -> async_graphql::Result<CommitPayload> {
        let data = graphql_data(ctx)?;
        let id = parse_session_id(&session_id)?;
        let session = data.sessions.close(id).await.extend()?;
        let committed = session.clone().commit();

        let changes = match directory::to_directory_changes(&committed.changes) {
            Ok(changes) => changes,
            Err(err) => {
                data.sessions.restore(id, session).await;
                return Err(ApiError::invalid_input(err.to_string())).extend();
            }
        };
        if let Err(err) = platform_db::apply_directory_changes(&data.pool, changes).await {
            data.sessions.restore(id, session).await;
            return Err(internal_error(err));
        }

        info!(
            session_id = %id,
            reassigned = committed.changes.reassigned.len(),
            hired = committed.changes.hired.len(),
            removed = committed.changes.removed.len(),
            "org chart edit committed"
        );
        Ok(committed.into())
    }

    /// Throw the draft away.
    #[instrument(name = "graphql.discard_org_chart_edit", skip_all)]
    async fn discard_org_chart_edit(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
    ) -> async_graphql::Result<bool> {
        let data = graphql_data(ctx)?;
        let id = parse_session_id(&session_id)?;
        data.sessions.close(id).await.extend()?.discard();
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
