use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};

use crate::manifest::ManifestClient;

/// Print every version label offered by the service
pub fn list_versions(client: &ManifestClient) -> Result<()> {
    let versions = client
        .list_versions()
        .context("Failed to fetch version list")?;

    let mut stdout = BufWriter::new(io::stdout().lock());
    versions
        .iter()
        .try_for_each(|v| writeln!(stdout, "{}", v).context("Failed to write to stdout"))?;

    stdout.flush().context("Failed to flush stdout")
}
