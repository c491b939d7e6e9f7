use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use crate::{
    cancel::CancelToken,
    commands::VersionChoice,
    download::{DownloadOrchestrator, ProgressState},
    manifest::{parse_version_label, ManifestClient},
};

/// Turn the user's choice into the version id used in URLs
pub fn resolve_version_id(client: &ManifestClient, choice: &VersionChoice) -> Result<String> {
    let id = match choice {
        VersionChoice::Latest => {
            let versions = client
                .list_versions()
                .context("Failed to fetch version list")?;
            let latest = versions
                .first()
                .context("Version list from the service is empty")?;
            parse_version_label(latest)?.to_string()
        }
        VersionChoice::Label(label) => parse_version_label(label)?.to_string(),
        VersionChoice::Id(id) => id.clone(),
    };

    Ok(id)
}

/// `<downloads>/chunk_installer/<version id>`
pub fn default_output_folder(version_id: &str) -> Result<PathBuf> {
    let downloads = dirs::download_dir()
        .or_else(dirs::home_dir)
        .context("Couldn't find a downloads folder, pass an output folder")?;

    Ok(downloads.join("chunk_installer").join(version_id))
}

/// Status line shown next to the progress bar, eg. `1.50 MiB / 3.00 MiB (50.00%)`
pub fn progress_message(state: &ProgressState) -> String {
    format!(
        "{} / {} ({:.2}%)",
        HumanBytes(state.bytes_completed),
        HumanBytes(state.bytes_total),
        state.percent()
    )
}

/// Download a version into a folder, drawing a progress bar on stderr
pub fn download_version(
    orchestrator: &DownloadOrchestrator,
    choice: &VersionChoice,
    output_folder: Option<&Path>,
    cancel: &CancelToken,
) -> Result<()> {
    let version_id = resolve_version_id(orchestrator.manifests(), choice)?;
    let output_folder = match output_folder {
        Some(p) => p.to_path_buf(),
        None => default_output_folder(&version_id)?,
    };

    let manifest = orchestrator
        .manifests()
        .get_manifest(&version_id)
        .with_context(|| format!("Failed to fetch manifest for version {}", version_id))?;
    eprintln!(
        "Downloading version {} ({} files) to {}",
        version_id,
        manifest.files.len(),
        output_folder.display()
    );

    let bar = ProgressBar::new(manifest.total_size);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let result = orchestrator.run(&manifest, &output_folder, cancel, |done, total| {
        let state = ProgressState {
            bytes_completed: done,
            bytes_total: total,
        };
        bar.set_position(done);
        bar.set_message(progress_message(&state));
    });

    match result {
        Ok(state) => {
            bar.finish_with_message(progress_message(&state));
            eprintln!("Finished!");
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e).with_context(|| format!("Failed to download version {}", version_id))
        }
    }
}
