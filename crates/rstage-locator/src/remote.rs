use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};

/// Name index of a CRAN-style mirror, loaded once per staging run from the
/// mirror's `src/contrib/PACKAGES` file and queried for membership.
#[derive(Debug, Clone)]
pub struct CranIndex {
    names: HashSet<String>,
}

impl CranIndex {
    pub fn fetch(mirror: &str) -> Result<Self> {
        let url = packages_index_url(mirror);
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build http client")?;
        let response = client
            .get(&url)
            .send()
            .with_context(|| format!("failed to reach package mirror index: {url}"))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "package mirror index returned status {}: {url}",
                response.status()
            );
        }
        let body = response
            .text()
            .with_context(|| format!("failed to read package mirror index: {url}"))?;
        Ok(Self::parse(&body))
    }

    /// Parses the DCF-formatted PACKAGES file; only `Package:` fields matter.
    pub fn parse(index: &str) -> Self {
        let names = index
            .lines()
            .filter_map(|line| line.strip_prefix("Package:"))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn packages_index_url(mirror: &str) -> String {
    format!("{}/src/contrib/PACKAGES", mirror.trim_end_matches('/'))
}
