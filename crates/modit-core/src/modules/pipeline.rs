use super::preprocess::{LineParameterInput, compute_layer_line_parameters};
use super::synthesis::{
    CrossSectionMatrix, LayerDiagnostics, ModitSynthesizer, NegativeValueReport,
    SynthesisDiagnostics, SynthesisOutput, SynthesisRequest,
};
use super::traits::CrossSectionSynthesizer;
use super::wavenumber::{WavenumberGrid, WavenumberIndex, WavenumberIndexCache};
use crate::common::config::SynthesisConfig;
use crate::domain::{
    AtmosphereProfile, LineList, LineListError, ModitResult, PartitionFunction,
};
use std::sync::Arc;

/// Line list to cross-section matrix: filtering, per-layer parameters,
/// grid indexing and synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionPipeline {
    config: SynthesisConfig,
    grid: WavenumberGrid,
}

impl CrossSectionPipeline {
    pub fn new(config: SynthesisConfig) -> ModitResult<Self> {
        config.validate()?;
        let grid = config.wavenumber_grid()?;
        Ok(Self { config, grid })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn grid(&self) -> &WavenumberGrid {
        &self.grid
    }

    /// Drops lines outside the grid and lines below the strength threshold.
    /// `None` when no line survives.
    pub fn prepare_lines(
        &self,
        lines: &LineList,
        partition: &dyn PartitionFunction,
    ) -> ModitResult<Option<LineList>> {
        let retained = lines
            .retain_wavenumber_range(self.grid.first(), self.grid.last(), 0.0)
            .and_then(|in_range| {
                in_range.filter_by_strength(&self.config.strength_filter, partition)
            });
        match retained {
            Ok(lines) => Ok(Some(lines)),
            Err(LineListError::NothingRetained) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub fn run(
        &self,
        lines: &LineList,
        atmosphere: &AtmosphereProfile,
        partition: &dyn PartitionFunction,
        cache: Option<&WavenumberIndexCache>,
    ) -> ModitResult<SynthesisOutput> {
        let synthesizer = ModitSynthesizer::new(self.config.synthesis_options());
        self.run_with(&synthesizer, lines, atmosphere, partition, cache)
    }

    pub fn run_with(
        &self,
        synthesizer: &dyn CrossSectionSynthesizer,
        lines: &LineList,
        atmosphere: &AtmosphereProfile,
        partition: &dyn PartitionFunction,
        cache: Option<&WavenumberIndexCache>,
    ) -> ModitResult<SynthesisOutput> {
        let Some(lines) = self.prepare_lines(lines, partition)? else {
            tracing::warn!(
                method = synthesizer.method(),
                layers = atmosphere.layer_count(),
                grid_len = self.grid.len(),
                "no lines retained; cross sections are zero"
            );
            return Ok(self.zero_output(synthesizer, atmosphere.layer_count()));
        };
        let parameters =
            compute_layer_line_parameters(LineParameterInput::new(&lines, atmosphere, partition))?;
        let index = match cache {
            Some(cache) => cache.get_or_build(&self.grid, lines.centers())?,
            None => Arc::new(WavenumberIndex::from_lines(&self.grid, lines.centers())?),
        };

        tracing::info!(
            method = synthesizer.method(),
            lines = lines.len(),
            layers = atmosphere.layer_count(),
            grid_len = self.grid.len(),
            "running cross-section pipeline"
        );
        synthesizer.synthesize(&SynthesisRequest::new(&self.grid, &lines, &index, &parameters))
    }

    fn zero_output(&self, synthesizer: &dyn CrossSectionSynthesizer, layers: usize) -> SynthesisOutput {
        let grid_len = self.grid.len();
        let rows = vec![vec![0.0; grid_len]; layers];
        SynthesisOutput {
            cross_sections: CrossSectionMatrix::from_rows(&rows, grid_len),
            diagnostics: SynthesisDiagnostics {
                method: synthesizer.method(),
                execution_mode: self.config.execution_mode,
                layers: (0..layers)
                    .map(|layer| LayerDiagnostics {
                        layer,
                        ..LayerDiagnostics::default()
                    })
                    .collect(),
                negative_values: NegativeValueReport::default(),
            },
        }
    }
}
