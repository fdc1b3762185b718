use std::io::{self, Write};

use super::{
    plan::{Plan, PlanCounts, SyncAction},
    SyncRequest,
};

/// Render a computed plan for review without applying it. One row per
/// action, showing the state each alias ends up with.
pub fn render<W: Write>(out: &mut W, request: &SyncRequest, plan: &Plan) -> io::Result<()> {
    if plan.is_empty() {
        return writeln!(
            out,
            "nothing to do: {} and {} are in sync",
            request.source, request.target
        );
    }

    writeln!(
        out,
        "plan for {} -> {} ({} mode)",
        request.source, request.target, request.mode
    )?;
    writeln!(out)?;

    let domain_width = plan
        .actions
        .iter()
        .map(|action| action.domain().len())
        .max()
        .unwrap_or(0)
        .max("DOMAIN".len());
    let name_width = plan
        .actions
        .iter()
        .map(|action| action.name().len())
        .max()
        .unwrap_or(0)
        .max("ALIAS".len());

    writeln!(
        out,
        "{:<8} {:<domain_width$} {:<name_width$} {:<7} {}",
        "ACTION", "DOMAIN", "ALIAS", "ENABLED", "RECIPIENTS"
    )?;
    for action in &plan.actions {
        writeln!(
            out,
            "{:<8} {:<domain_width$} {:<name_width$} {:<7} {}",
            action.kind(),
            action.domain(),
            action.name(),
            planned_enabled(action),
            planned_recipients(action)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", plan_summary(&plan.counts()))
}

pub fn plan_summary(counts: &PlanCounts) -> String {
    format!(
        "{} to create, {} to update, {} to delete",
        counts.creates, counts.updates, counts.deletes
    )
}

pub fn applied_summary(counts: &PlanCounts, applied: usize) -> String {
    format!(
        "applied {applied} actions: {} created, {} updated, {} deleted",
        counts.creates, counts.updates, counts.deletes
    )
}

fn planned_enabled(action: &SyncAction) -> &'static str {
    match action {
        SyncAction::Create { alias, .. } => enabled_str(alias.is_enabled),
        SyncAction::Update { update, .. } => update.is_enabled.map(enabled_str).unwrap_or("-"),
        SyncAction::Delete { .. } => "-",
    }
}

fn planned_recipients(action: &SyncAction) -> String {
    match action {
        SyncAction::Create { alias, .. } => alias.recipients.join(", "),
        SyncAction::Update { update, .. } => update
            .recipients
            .as_ref()
            .map(|recipients| recipients.join(", "))
            .unwrap_or_else(|| "-".to_string()),
        SyncAction::Delete { .. } => "-".to_string(),
    }
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "yes"
    } else {
        "no"
    }
}
