//! Density audit command
//!
//! Lists every board or list whose children are not at positions 1..N.
//! With `--repair`, each reported parent is renumbered in its own
//! transaction, keeping the existing order.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use taskboard_server::db::{Collection, DensityReport};
use taskboard_server::Store;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct AuditArgs {
    /// Which collection to check
    #[arg(long, value_enum, default_value_t = Scope::All)]
    pub scope: Scope,

    /// Renumber every reported parent to 1..N
    #[arg(long)]
    pub repair: bool,

    /// Print one JSON object per finding instead of text
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero when violations are found (and not repaired)
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Lists inside boards
    Lists,
    /// Cards inside lists
    Cards,
    All,
}

impl Scope {
    fn collections(self) -> &'static [Collection] {
        match self {
            Self::Lists => &[Collection::Lists],
            Self::Cards => &[Collection::Cards],
            Self::All => &Collection::ALL,
        }
    }
}

pub async fn run_audit(args: AuditArgs) -> Result<()> {
    let config = args.db.store_config();
    let pool = args.db.connect(&config).await?;
    let store = Store::new(pool, config);

    let mut found = 0usize;
    for &collection in args.scope.collections() {
        let reports = store
            .audit(collection)
            .await
            .with_context(|| format!("Failed to audit {}", collection.table()))?;
        tracing::info!(table = collection.table(), violations = reports.len(), "audit complete");
        found += reports.len();

        for report in &reports {
            let repaired = if args.repair {
                Some(store.repair(collection, report.parent).await.with_context(|| {
                    format!("Failed to repair {} {}", collection.parent_resource(), report.parent)
                })?)
            } else {
                None
            };
            println!("{}", render(report, repaired, args.json));
        }
    }

    if found == 0 && !args.json {
        println!("all positions are dense");
    }
    if args.strict && found > 0 && !args.repair {
        bail!("{found} parent(s) with non-dense positions");
    }
    Ok(())
}

fn render(report: &DensityReport, repaired: Option<usize>, as_json: bool) -> String {
    let parent = report.collection.parent_resource();
    if as_json {
        return json!({
            "table": report.collection.table(),
            parent: report.parent,
            "children": report.children,
            "violation": report.violation.to_string(),
            "repaired": repaired,
        })
        .to_string();
    }

    let mut line = format!(
        "{parent} {} ({} {}s): {}",
        report.parent,
        report.children,
        report.collection.resource(),
        report.violation
    );
    if let Some(changed) = repaired {
        line.push_str(&format!(" - repaired, {changed} row(s) renumbered"));
    }
    line
}
