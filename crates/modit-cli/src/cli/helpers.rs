use anyhow::Context;
use modit_core::modules::{SpectralUnit, SynthesisDiagnostics, SynthesisOutput, WavenumberGrid};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays usable for command output.
pub(super) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn parse_spectral_unit(raw: &str) -> Result<SpectralUnit, String> {
    match raw.trim() {
        "cm-1" | "cm^-1" => Ok(SpectralUnit::Wavenumber),
        "AA" | "angstrom" => Ok(SpectralUnit::Angstrom),
        "nm" => Ok(SpectralUnit::Nanometer),
        "um" | "micron" => Ok(SpectralUnit::Micrometer),
        other => Err(format!(
            "unknown unit '{other}'; expected one of cm-1, AA, nm, um"
        )),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SynthesisDocument<'a> {
    wavenumbers: &'a [f64],
    cross_sections: Vec<Vec<f64>>,
    diagnostics: &'a SynthesisDiagnostics,
}

impl<'a> SynthesisDocument<'a> {
    pub(super) fn new(grid: &'a WavenumberGrid, output: &'a SynthesisOutput) -> Self {
        Self {
            wavenumbers: grid.values(),
            cross_sections: output.cross_sections.rows(),
            diagnostics: &output.diagnostics,
        }
    }
}

pub(super) fn write_json_output(path: &Path, value: &impl Serialize) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize synthesis output")?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write output '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote synthesis output");
    Ok(())
}
