use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use rstage_core::NoSourceError;

/// Emits the structured lifecycle lines acceptance probes grep for. The sink
/// is any `io::Write`: stdout in production, a buffer in tests, so the core
/// never depends on a particular log transport.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn run_started(&mut self, ncpus: usize) -> Result<()> {
        writeln!(self.out, "Ncpus={ncpus}").context("failed to write run start line")
    }

    pub fn package_started(&mut self, name: &str) -> Result<()> {
        writeln!(self.out, "begin installing package {name}")
            .context("failed to write package start line")
    }

    pub fn package_installed(&mut self, name: &str) -> Result<()> {
        writeln!(self.out, "{} INSTALLED SUCCESSFULLY", name.to_uppercase())
            .context("failed to write package success line")
    }

    pub fn package_failed(&mut self, name: &str, reason: &str) -> Result<()> {
        writeln!(self.out, "installation of package {name} failed: {reason}")
            .context("failed to write package failure line")
    }

    pub fn transitive_failure_warned(&mut self, name: &str) -> Result<()> {
        writeln!(
            self.out,
            "warning: failure of transitive package {name} does not fail the run"
        )
        .context("failed to write transitive warning line")
    }

    /// Final JSON-shaped fragment, e.g. `{"stringr":"installed"}`.
    pub fn summary(&mut self, statuses: &BTreeMap<String, String>) -> Result<()> {
        let rendered =
            serde_json::to_string(statuses).context("failed to serialize install summary")?;
        writeln!(self.out, "{rendered}").context("failed to write install summary")
    }

    pub fn no_source(&mut self, err: &NoSourceError) -> Result<()> {
        writeln!(self.out, "{err}").context("failed to write no-source line")
    }

    pub fn cleanup_done(&mut self) -> Result<()> {
        writeln!(self.out, "Cleaning up vendored packages")
            .context("failed to write cleanup line")
    }
}
