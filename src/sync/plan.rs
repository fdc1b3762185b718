use crate::Result;
use forwardemail::aliases::{Alias, AliasUpdate, NewAlias};
use std::fmt;

use super::{
    diff::{self, AliasIndex},
    resolve::{ConflictResolver, ConflictStrategy},
    SyncMode, SyncRequest,
};

/// One planned mutation of a domain's alias set. Immutable once planned.
#[derive(Debug, Clone)]
pub enum SyncAction {
    Create {
        domain: String,
        alias: NewAlias,
    },
    Update {
        domain: String,
        alias_id: String,
        name: String,
        update: AliasUpdate,
    },
    Delete {
        domain: String,
        alias_id: String,
        name: String,
    },
}

impl SyncAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::Create { domain, .. } => domain,
            Self::Update { domain, .. } => domain,
            Self::Delete { domain, .. } => domain,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Create { alias, .. } => &alias.name,
            Self::Update { name, .. } => name,
            Self::Delete { name, .. } => name,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind(), self.domain(), self.name())
    }
}

/// The ordered action list produced by one sync invocation. Computed fresh
/// every run and consumed at most once.
#[derive(Debug, Default)]
pub struct Plan {
    pub actions: Vec<SyncAction>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn counts(&self) -> PlanCounts {
        let mut counts = PlanCounts::default();
        for action in &self.actions {
            match action {
                SyncAction::Create { .. } => counts.creates += 1,
                SyncAction::Update { .. } => counts.updates += 1,
                SyncAction::Delete { .. } => counts.deletes += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlanCounts {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

/// Combine the name classification, the resolver's decisions and the
/// requested mode into an ordered plan. Creates come first, then updates,
/// then deletes, each sorted by alias name, so unchanged input always yields
/// an identical plan.
pub fn build(
    request: &SyncRequest,
    src_index: &AliasIndex,
    dst_index: &AliasIndex,
    resolver: &mut dyn ConflictResolver,
) -> Result<Plan> {
    let classification = diff::classify(src_index, dst_index);
    tracing::debug!(
        only_in_source = classification.only_in_source.len(),
        only_in_target = classification.only_in_target.len(),
        matching = classification.matching.len(),
        conflicting = classification.conflicting.len(),
        "classified alias names"
    );

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut deletes = Vec::new();

    for name in &classification.only_in_source {
        creates.push(SyncAction::Create {
            domain: request.target.clone(),
            alias: NewAlias::from(&src_index[name]),
        });
    }

    // Merge mode back fills the source with target only aliases.
    if request.mode == SyncMode::Merge {
        for name in &classification.only_in_target {
            creates.push(SyncAction::Create {
                domain: request.source.clone(),
                alias: NewAlias::from(&dst_index[name]),
            });
        }
    }

    let mut pinned: Option<ConflictStrategy> = None;
    for name in &classification.conflicting {
        let src = &src_index[name];
        let dst = &dst_index[name];
        let strategy = match pinned {
            Some(strategy) => strategy,
            None => {
                let decision = resolver.resolve(name, src, dst)?;
                if decision.remember {
                    pinned = Some(decision.strategy);
                }
                decision.strategy
            }
        };
        updates.extend(conflict_actions(request, name, src, dst, strategy));
    }

    if request.mode == SyncMode::Replace {
        for name in &classification.only_in_target {
            deletes.push(SyncAction::Delete {
                domain: request.target.clone(),
                alias_id: dst_index[name].id.clone(),
                name: name.clone(),
            });
        }
    }

    let mut actions = creates;
    actions.append(&mut updates);
    actions.append(&mut deletes);
    Ok(Plan { actions })
}

/// The update actions one resolved conflict plans to. The source always wins
/// an overwrite, whatever the direction of the sync. A merge updates only
/// the sides that do not already carry the merged state, so a re-run plans
/// nothing.
fn conflict_actions(
    request: &SyncRequest,
    name: &str,
    src: &Alias,
    dst: &Alias,
    strategy: ConflictStrategy,
) -> Vec<SyncAction> {
    match strategy {
        ConflictStrategy::Skip => vec![],
        ConflictStrategy::Overwrite => vec![SyncAction::Update {
            domain: request.target.clone(),
            alias_id: dst.id.clone(),
            name: name.to_string(),
            update: AliasUpdate {
                recipients: Some(src.recipients.clone()),
                is_enabled: Some(src.is_enabled),
                labels: Some(src.labels.clone()),
                ..Default::default()
            },
        }],
        ConflictStrategy::Merge => {
            let is_enabled = match request.mode {
                // A bidirectional merge unions the enabled flag as well
                SyncMode::Merge => src.is_enabled || dst.is_enabled,
                // One way modes keep the source authoritative
                SyncMode::Replace | SyncMode::Preserve => src.is_enabled,
            };
            let desired = AliasUpdate {
                recipients: Some(diff::merge_union(&src.recipients, &dst.recipients)),
                is_enabled: Some(is_enabled),
                labels: Some(diff::merge_union(&src.labels, &dst.labels)),
                ..Default::default()
            };

            let mut actions = Vec::new();
            if differs(dst, &desired) {
                actions.push(SyncAction::Update {
                    domain: request.target.clone(),
                    alias_id: dst.id.clone(),
                    name: name.to_string(),
                    update: desired.clone(),
                });
            }
            if request.mode == SyncMode::Merge && differs(src, &desired) {
                actions.push(SyncAction::Update {
                    domain: request.source.clone(),
                    alias_id: src.id.clone(),
                    name: name.to_string(),
                    update: desired,
                });
            }
            actions
        }
    }
}

/// True when an alias does not already carry the state an update would set.
fn differs(alias: &Alias, desired: &AliasUpdate) -> bool {
    desired
        .recipients
        .as_ref()
        .is_some_and(|recipients| !diff::set_equal(&alias.recipients, recipients))
        || desired
            .is_enabled
            .is_some_and(|is_enabled| alias.is_enabled != is_enabled)
        || desired
            .labels
            .as_ref()
            .is_some_and(|labels| !diff::set_equal(&alias.labels, labels))
}
