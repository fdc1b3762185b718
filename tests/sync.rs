use async_trait::async_trait;
use forwardemail::aliases::{Alias, AliasUpdate, NewAlias};
use fwdctl::{
    sync::{self, apply, diff, plan::Plan, resolve, AliasDirectory, SyncMode, SyncRequest},
    Result,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

/// In memory alias store standing in for the hosted api. Mutations commit
/// one at a time, the way the real directory does.
#[derive(Default)]
struct MemoryDirectory {
    domains: Mutex<HashMap<String, Vec<Alias>>>,
    next_id: AtomicUsize,
    fail_on: Option<String>,
}

impl MemoryDirectory {
    fn new(seed: Vec<(&str, Vec<Alias>)>) -> Self {
        let domains = seed
            .into_iter()
            .map(|(domain, aliases)| (domain.to_string(), aliases))
            .collect();
        Self {
            domains: Mutex::new(domains),
            ..Default::default()
        }
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    fn aliases(&self, domain: &str) -> Vec<Alias> {
        self.domains
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    fn names(&self, domain: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .aliases(domain)
            .into_iter()
            .map(|alias| alias.name)
            .collect();
        names.sort();
        names
    }

    fn check_fail(&self, name: &str) -> Result {
        if self.fail_on.as_deref() == Some(name) {
            anyhow::bail!("simulated api failure for {name}");
        }
        Ok(())
    }
}

#[async_trait]
impl AliasDirectory for MemoryDirectory {
    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>> {
        Ok(self.aliases(domain))
    }

    async fn create_alias(&self, domain: &str, alias: &NewAlias) -> Result {
        self.check_fail(&alias.name)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.domains
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_default()
            .push(Alias {
                id: format!("created-{id}"),
                name: alias.name.clone(),
                is_enabled: alias.is_enabled,
                recipients: alias.recipients.clone(),
                labels: alias.labels.clone(),
                description: alias.description.clone(),
            });
        Ok(())
    }

    async fn update_alias(&self, domain: &str, alias_id: &str, update: &AliasUpdate) -> Result {
        let mut domains = self.domains.lock().unwrap();
        let alias = domains
            .get_mut(domain)
            .and_then(|aliases| aliases.iter_mut().find(|alias| alias.id == alias_id))
            .ok_or_else(|| anyhow::anyhow!("no alias {alias_id} in {domain}"))?;
        self.check_fail(&alias.name)?;
        if let Some(recipients) = &update.recipients {
            alias.recipients = recipients.clone();
        }
        if let Some(is_enabled) = update.is_enabled {
            alias.is_enabled = is_enabled;
        }
        if let Some(labels) = &update.labels {
            alias.labels = labels.clone();
        }
        if let Some(description) = &update.description {
            alias.description = description.clone();
        }
        Ok(())
    }

    async fn delete_alias(&self, domain: &str, alias_id: &str) -> Result {
        let mut domains = self.domains.lock().unwrap();
        let aliases = domains
            .get_mut(domain)
            .ok_or_else(|| anyhow::anyhow!("no domain {domain}"))?;
        if let Some(alias) = aliases.iter().find(|alias| alias.id == alias_id) {
            self.check_fail(&alias.name)?;
        }
        aliases.retain(|alias| alias.id != alias_id);
        Ok(())
    }
}

fn alias(name: &str, recipients: &[&str], enabled: bool) -> Alias {
    Alias {
        id: name.to_string(),
        name: name.to_string(),
        is_enabled: enabled,
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
        labels: vec![],
        description: String::new(),
    }
}

fn request(mode: SyncMode, strategy: Option<resolve::ConflictStrategy>) -> SyncRequest {
    SyncRequest {
        source: "corp.example".to_string(),
        target: "branch.example".to_string(),
        mode,
        dry_run: false,
        strategy,
    }
}

fn seed() -> Vec<(&'static str, Vec<Alias>)> {
    vec![
        (
            "corp.example",
            vec![
                alias("alpha", &["a@mail.example"], true),
                alias("shared", &["corp@mail.example"], true),
            ],
        ),
        (
            "branch.example",
            vec![
                alias("shared", &["branch@mail.example"], true),
                alias("omega", &["o@mail.example"], true),
            ],
        ),
    ]
}

async fn compute(directory: &MemoryDirectory, request: &SyncRequest) -> Result<Plan> {
    let mut resolver = resolve::for_request(request);
    sync::compute_plan(directory, request, resolver.as_mut()).await
}

async fn run_sync(directory: &MemoryDirectory, request: &SyncRequest) -> Result<usize> {
    let plan = compute(directory, request).await?;
    apply::apply(directory, &plan).await
}

#[tokio::test]
async fn replace_mirrors_source_and_is_idempotent() {
    let directory = MemoryDirectory::new(seed());
    let request = request(SyncMode::Replace, None);

    let applied = run_sync(&directory, &request).await.expect("sync");
    assert_eq!(applied, 3);
    assert_eq!(directory.names("branch.example"), vec!["alpha", "shared"]);

    let shared = directory
        .aliases("branch.example")
        .into_iter()
        .find(|alias| alias.name == "shared")
        .expect("shared alias");
    assert_eq!(shared.recipients, vec!["corp@mail.example"]);

    // Nothing left once the target mirrors the source.
    let replan = compute(&directory, &request).await.expect("replan");
    assert!(replan.is_empty());
}

#[tokio::test]
async fn preserve_keeps_target_extras_and_is_stable() {
    let directory = MemoryDirectory::new(seed());
    let request = request(SyncMode::Preserve, None);

    let applied = run_sync(&directory, &request).await.expect("sync");
    assert_eq!(applied, 2);
    assert_eq!(
        directory.names("branch.example"),
        vec!["alpha", "omega", "shared"]
    );

    let replan = compute(&directory, &request).await.expect("replan");
    assert!(replan.is_empty());
}

#[tokio::test]
async fn merge_converges_both_domains() {
    let directory = MemoryDirectory::new(seed());
    let request = request(SyncMode::Merge, Some(resolve::ConflictStrategy::Merge));

    run_sync(&directory, &request).await.expect("sync");
    let union = vec!["alpha", "omega", "shared"];
    assert_eq!(directory.names("corp.example"), union);
    assert_eq!(directory.names("branch.example"), union);

    for domain in ["corp.example", "branch.example"] {
        let shared = directory
            .aliases(domain)
            .into_iter()
            .find(|alias| alias.name == "shared")
            .expect("shared alias");
        assert_eq!(
            shared.recipients,
            vec!["branch@mail.example", "corp@mail.example"]
        );
    }

    let replan = compute(&directory, &request).await.expect("replan");
    assert!(replan.is_empty());
}

#[tokio::test]
async fn merge_never_deletes() {
    let directory = MemoryDirectory::new(seed());
    let before_corp = directory.names("corp.example").len();
    let request = request(SyncMode::Merge, Some(resolve::ConflictStrategy::Skip));

    run_sync(&directory, &request).await.expect("sync");
    assert!(directory.names("corp.example").len() >= before_corp);
    assert!(directory.names("branch.example").contains(&"omega".to_string()));
}

#[tokio::test]
async fn skipped_conflicts_stay_put() {
    let directory = MemoryDirectory::new(seed());
    let request = request(SyncMode::Preserve, Some(resolve::ConflictStrategy::Skip));

    run_sync(&directory, &request).await.expect("sync");
    let shared = directory
        .aliases("branch.example")
        .into_iter()
        .find(|alias| alias.name == "shared")
        .expect("shared alias");
    assert_eq!(shared.recipients, vec!["branch@mail.example"]);
}

#[tokio::test]
async fn failure_stops_the_run_and_keeps_prior_work() {
    let directory = MemoryDirectory::new(vec![
        (
            "corp.example",
            vec![
                alias("alpha", &["a@mail.example"], true),
                alias("zulu", &["z@mail.example"], true),
            ],
        ),
        ("branch.example", vec![]),
    ])
    .failing_on("zulu");
    let request = request(SyncMode::Replace, None);

    let err = run_sync(&directory, &request).await.expect_err("failure");
    let message = format!("{err:#}");
    assert!(message.contains("create branch.example/zulu"));
    assert!(message.contains("1 of 2 actions applied"));

    // The action before the failure stays applied.
    assert_eq!(directory.names("branch.example"), vec!["alpha"]);

    // A re-run retries just the remainder.
    let replan = compute(&directory, &request).await.expect("replan");
    assert_eq!(replan.len(), 1);
}

#[tokio::test]
async fn same_domain_never_reaches_the_directory() {
    let directory = MemoryDirectory::new(vec![]);
    let request = SyncRequest {
        source: "corp.example".to_string(),
        target: "CORP.example".to_string(),
        mode: SyncMode::Replace,
        dry_run: false,
        strategy: None,
    };
    assert!(compute(&directory, &request).await.is_err());
}

#[tokio::test]
async fn empty_source_replace_empties_target() {
    let directory = MemoryDirectory::new(vec![
        ("corp.example", vec![]),
        (
            "branch.example",
            vec![alias("omega", &["o@mail.example"], true)],
        ),
    ]);
    let request = request(SyncMode::Replace, None);

    let applied = run_sync(&directory, &request).await.expect("sync");
    assert_eq!(applied, 1);
    assert!(directory.names("branch.example").is_empty());
}

#[tokio::test]
async fn dry_run_merge_defaults_to_merge_strategy() {
    let directory = MemoryDirectory::new(seed());
    let request = SyncRequest {
        dry_run: true,
        ..request(SyncMode::Merge, None)
    };

    let plan = compute(&directory, &request).await.expect("plan");
    // Conflicting "shared" plans merged updates on both sides without a
    // terminal in sight.
    let updates = plan
        .actions
        .iter()
        .filter(|action| action.kind() == "update")
        .count();
    assert_eq!(updates, 2);

    // And planning alone changed nothing.
    assert_eq!(directory.names("branch.example"), vec!["omega", "shared"]);
}

#[tokio::test]
async fn duplicate_listing_names_keep_the_later_entry() {
    let listing = vec![
        alias("sales", &["old@mail.example"], true),
        alias("sales", &["new@mail.example"], true),
    ];
    let index = diff::index(listing);
    assert_eq!(index.len(), 1);
    assert_eq!(index["sales"].recipients, vec!["new@mail.example"]);
}
