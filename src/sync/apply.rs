use crate::{Context, Result};

use super::{
    directory::AliasDirectory,
    plan::{Plan, SyncAction},
};

/// Apply a plan, one directory call per action, in plan order. Execution
/// stops at the first failed action. Everything already applied stays
/// applied (every call commits independently on the server) and the error
/// reports how far the run got; re-running the sync picks up the remainder.
pub async fn apply(directory: &dyn AliasDirectory, plan: &Plan) -> Result<usize> {
    let total = plan.len();
    let mut applied = 0;
    for action in &plan.actions {
        tracing::debug!(%action, "applying");
        dispatch(directory, action)
            .await
            .with_context(|| format!("{action} failed, {applied} of {total} actions applied"))?;
        applied += 1;
    }
    Ok(applied)
}

async fn dispatch(directory: &dyn AliasDirectory, action: &SyncAction) -> Result {
    match action {
        SyncAction::Create { domain, alias } => directory.create_alias(domain, alias).await,
        SyncAction::Update {
            domain,
            alias_id,
            update,
            ..
        } => directory.update_alias(domain, alias_id, update).await,
        SyncAction::Delete {
            domain, alias_id, ..
        } => directory.delete_alias(domain, alias_id).await,
    }
}
