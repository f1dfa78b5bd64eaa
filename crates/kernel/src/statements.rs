use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

/// Ordered DDL for one schema: table drops followed by table creates.
///
/// Drops are expected in `DROP TABLE IF EXISTS` form so the set can be
/// applied repeatedly. Creates must list referenced tables before the
/// tables that reference them; the order is applied as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSet {
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub create: Vec<String>,
}

impl StatementSet {
    pub fn new<D, C, S>(drop: D, create: C) -> Self
    where
        D: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drop: drop.into_iter().map(Into::into).collect(),
            create: create.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a statement set from a file with top-level `drop` and `create` arrays.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .build()
            .with_context(|| format!("failed to read statements from {}", path.display()))?;

        let set: StatementSet = cfg
            .try_deserialize()
            .with_context(|| format!("failed to parse statements in {}", path.display()))?;

        set.validate()
            .with_context(|| format!("invalid statements in {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            drop = set.drop.len(),
            create = set.create.len(),
            "loaded statement set"
        );

        Ok(set)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (phase, statements) in [("drop", &self.drop), ("create", &self.create)] {
            if let Some(index) = statements.iter().position(|s| s.trim().is_empty()) {
                return Err(anyhow!("{} statement #{} is blank", phase, index + 1));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.drop.is_empty() && self.create.is_empty()
    }
}
