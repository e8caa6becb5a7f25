//! Subcommand implementations

use crate::backup::BackupWriter;
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use fieldcase_core::{
    diff, CasePolicy, DatasetRef, Delta, Document, FieldInfo, MigrationConfig, MigrationPipeline,
    MigrationError, Migrator, ScopeLocator, ScopeMode, ScopeReport, Vocabulary,
};
use fieldcase_portal::{CachedCatalog, PortalClient};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Layer schemas kept in memory during a batch
const CATALOG_CAPACITY: u64 = 64;
/// Schemas older than this are fetched again
const CATALOG_TTL: Duration = Duration::from_secs(600);

/// Command-line overrides of the `[migration]` settings
#[derive(Debug, Clone, Default)]
pub(crate) struct MigrationOverrides {
    pub(crate) unsafe_mode: bool,
    pub(crate) case_policy: Option<CasePolicy>,
    pub(crate) retarget: Option<String>,
}

impl MigrationOverrides {
    pub(crate) fn apply(&self, mut config: MigrationConfig) -> MigrationConfig {
        if self.unsafe_mode {
            config = config.with_mode(ScopeMode::Unsafe);
        }
        if let Some(policy) = self.case_policy {
            config = config.with_case_policy(policy);
        }
        if let Some(retarget) = &self.retarget {
            config = config.with_retarget(retarget.clone());
        }
        config
    }
}

/// Arguments of `fieldcase migrate`
#[derive(Debug, Clone)]
pub(crate) struct MigrateArgs {
    pub(crate) items: Vec<String>,
    pub(crate) dataset: DatasetRef,
    pub(crate) dry_run: bool,
    pub(crate) backup_dir: Option<PathBuf>,
    pub(crate) overrides: MigrationOverrides,
}

/// Migrate portal items; returns whether every item succeeded
pub(crate) async fn migrate(settings: Settings, args: MigrateArgs) -> Result<bool> {
    let config = args.overrides.apply(settings.migration);
    let client = Arc::new(PortalClient::new(settings.portal).context("creating portal client")?);
    let catalog = Arc::new(CachedCatalog::with_ttl(
        Arc::clone(&client),
        CATALOG_CAPACITY,
        CATALOG_TTL,
    ));
    let pipeline = MigrationPipeline::new(client, Arc::clone(&catalog), Migrator::new(config));

    let backups = match &args.backup_dir {
        Some(dir) => Some(BackupWriter::create(dir).await?),
        None => None,
    };

    let mut summary = BatchSummary::default();
    for item_id in &args.items {
        let report = match pipeline.run(item_id, &args.dataset, args.dry_run).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("item {} failed: {}", item_id, e);
                summary.record_failure(item_id, &e);
                continue;
            }
        };

        if let Some(backups) = &backups {
            let files = backups
                .write(item_id, &report.original, &report.outcome.document, chrono::Utc::now())
                .await?;
            tracing::debug!("saved {} and {}", files.original.display(), files.migrated.display());
        }

        println!("{item_id}:");
        print_scopes(&report.outcome.scopes);
        print_delta(&report.delta);
        let status = match (report.delta.is_empty(), report.pushed) {
            (true, _) => "unchanged",
            (false, true) => "pushed",
            (false, false) => "not pushed (dry run)",
        };
        println!("  {status}");
    }

    tracing::debug!(
        "field metadata cache holds {} layers",
        catalog.stats().await.entry_count
    );
    if let Some(line) = summary.manual_edits() {
        println!("{line}");
    }
    Ok(summary.is_success())
}

/// Failures of a batch run
#[derive(Debug, Default)]
struct BatchSummary {
    failed: usize,
    manual: Vec<String>,
}

impl BatchSummary {
    fn record_failure(&mut self, item_id: &str, error: &MigrationError) {
        self.failed += 1;
        if error.requires_manual_edit() {
            self.manual.push(item_id.to_string());
        }
    }

    fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Items that no rerun will fix, for the closing report
    fn manual_edits(&self) -> Option<String> {
        (!self.manual.is_empty())
            .then(|| format!("needs manual editing: {}", self.manual.join(", ")))
    }
}

/// Arguments of `fieldcase rewrite`
#[derive(Debug, Clone)]
pub(crate) struct RewriteArgs {
    pub(crate) input: PathBuf,
    pub(crate) output: Option<PathBuf>,
    pub(crate) dataset: DatasetRef,
    pub(crate) fields: Vec<String>,
    pub(crate) fields_file: Option<PathBuf>,
    pub(crate) overrides: MigrationOverrides,
}

/// Migrate a local document against a given vocabulary
pub(crate) async fn rewrite(settings: Settings, args: RewriteArgs) -> Result<()> {
    let config = args.overrides.apply(settings.migration);
    let document = read_document(&args.input).await?;

    let mut names = args.fields.clone();
    if let Some(path) = &args.fields_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        names.extend(field_names(&text).with_context(|| format!("parsing {}", path.display()))?);
    }
    if names.is_empty() {
        bail!("no field names given; use --field or --fields");
    }

    let vocabulary = Vocabulary::new(&args.dataset, &names, config.case_policy)?;
    let outcome = Migrator::new(config).migrate_with_vocabulary(&document, &vocabulary)?;
    let text = outcome.document.to_pretty_json()?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            print_scopes(&outcome.scopes);
            print_delta(&diff(&document, &outcome.document));
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Print the scopes located in a local document, one JSON object per line
pub(crate) async fn scopes(input: &Path, dataset_id: &str) -> Result<()> {
    let document = read_document(input).await?;
    for scope in ScopeLocator::new(dataset_id).locate(&document)? {
        println!("{}", serde_json::to_string(&scope)?);
    }
    Ok(())
}

async fn read_document(path: &Path) -> Result<Document> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Document::parse(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Field names from a metadata file
///
/// Accepts a layer resource (`{"fields": [...]}`), a list of field objects,
/// or a list of names.
pub(crate) fn field_names(text: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(text)?;
    let list = match value {
        Value::Object(mut layer) => match layer.remove("fields") {
            Some(fields) => fields,
            None => bail!("object has no `fields` list"),
        },
        other => other,
    };
    let Value::Array(items) = list else {
        bail!("expected a list of fields");
    };

    items
        .into_iter()
        .map(|item| -> Result<String> {
            match item {
                Value::String(name) => Ok(name),
                other => Ok(serde_json::from_value::<FieldInfo>(other)?.name),
            }
        })
        .collect()
}

fn print_scopes(scopes: &[ScopeReport]) {
    for scope in scopes {
        let pointer = if scope.pointer.is_empty() { "/" } else { scope.pointer.as_str() };
        println!("  scope {pointer}: {} edits", scope.edits);
    }
}

fn print_delta(delta: &Delta) {
    for change in &delta.changes {
        println!("    {change}");
    }
}
