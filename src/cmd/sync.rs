use crate::{
    settings::Settings,
    sync::{self, report, resolve, SyncMode, SyncRequest},
    Result,
};
use std::io;

/// Synchronize the aliases of one domain to another.
///
/// A plan is computed from fresh listings of both domains and applied one
/// action at a time, stopping at the first failure. With --dry-run the plan
/// is printed instead of applied; re-running after a partial failure picks
/// up where the sync left off.
#[derive(Debug, clap::Args)]
pub struct Cmd {
    /// Domain to sync from
    source: String,

    /// Domain to sync to
    target: String,

    /// How to reconcile the two alias sets
    #[arg(long)]
    mode: SyncMode,

    /// Compute and print the plan without applying it
    #[arg(long)]
    dry_run: bool,

    /// Conflict strategy to apply without prompting
    #[arg(long)]
    conflicts: Option<resolve::ConflictStrategy>,
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        let request = SyncRequest {
            source: self.source.clone(),
            target: self.target.clone(),
            mode: self.mode,
            dry_run: self.dry_run,
            strategy: self.conflicts,
        };

        let client = settings.api.client()?;
        let mut resolver = resolve::for_request(&request);
        let plan = sync::compute_plan(&client, &request, resolver.as_mut()).await?;

        if request.dry_run {
            return Ok(report::render(&mut io::stdout(), &request, &plan)?);
        }

        if plan.is_empty() {
            println!(
                "nothing to do: {} and {} are in sync",
                request.source, request.target
            );
            return Ok(());
        }

        let counts = plan.counts();
        let applied = sync::apply::apply(&client, &plan).await?;
        tracing::info!(
            source = %request.source,
            target = %request.target,
            applied,
            "sync complete"
        );
        println!("{}", report::applied_summary(&counts, applied));
        Ok(())
    }
}
