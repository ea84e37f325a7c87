use super::CliError;
use super::helpers::{SynthesisDocument, parse_spectral_unit, write_json_output};
use modit_core::common::{
    load_atmosphere, load_line_list, load_partition_tables, load_synthesis_config,
};
use modit_core::domain::{PartitionFunction, UnitPartitionFunction};
use modit_core::modules::{
    CrossSectionPipeline, DirectSynthesizer, ModitSynthesizer, SpectralUnit, WavenumberGrid,
};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct GridArgs {
    /// Lower bound in the given unit
    #[arg(long)]
    start: f64,

    /// Upper bound in the given unit
    #[arg(long)]
    end: f64,

    /// Number of grid points
    #[arg(long)]
    count: usize,

    /// Unit of the bounds: cm-1, AA, nm or um
    #[arg(long, default_value = "cm-1", value_parser = parse_spectral_unit)]
    unit: SpectralUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum SynthesisMethod {
    Modit,
    Direct,
}

#[derive(clap::Args)]
pub(super) struct SynthArgs {
    /// Synthesis config JSON
    #[arg(long)]
    config: PathBuf,

    /// Line list JSON
    #[arg(long)]
    lines: PathBuf,

    /// Atmosphere profile JSON
    #[arg(long)]
    atmosphere: PathBuf,

    /// Partition function tables JSON; q(T) = 1 when omitted
    #[arg(long)]
    partition: Option<PathBuf>,

    /// Output JSON path
    #[arg(long)]
    output: PathBuf,

    /// Synthesis method
    #[arg(long, value_enum, default_value = "modit")]
    method: SynthesisMethod,
}

pub(super) fn run_grid_command(args: GridArgs) -> Result<i32, CliError> {
    let grid = WavenumberGrid::from_spectral_range(args.start, args.end, args.count, args.unit)
        .map_err(|error| CliError::Compute(error.into()))?;

    println!("Grid points: {}", grid.len());
    println!("Resolution: {:.6e}", grid.resolution());
    println!("Range: {:.6} -- {:.6} cm-1", grid.first(), grid.last());
    if args.unit.is_wavelength() {
        let wavelengths = grid.wavelengths(args.unit);
        println!(
            "Wavelength range: {:.6} -- {:.6} {}",
            wavelengths[wavelengths.len() - 1],
            wavelengths[0],
            args.unit
        );
    }
    Ok(0)
}

pub(super) fn run_synth_command(args: SynthArgs) -> Result<i32, CliError> {
    let config = load_synthesis_config(&args.config).map_err(|error| CliError::Compute(error.into()))?;
    let lines = load_line_list(&args.lines)?;
    let atmosphere = load_atmosphere(&args.atmosphere)?;
    let partition: Box<dyn PartitionFunction> = match &args.partition {
        Some(path) => Box::new(load_partition_tables(path)?),
        None => Box::new(UnitPartitionFunction),
    };

    let pipeline = CrossSectionPipeline::new(config)?;
    let output = match args.method {
        SynthesisMethod::Modit => {
            let synthesizer = ModitSynthesizer::new(pipeline.config().synthesis_options());
            pipeline.run_with(&synthesizer, &lines, &atmosphere, partition.as_ref(), None)?
        }
        SynthesisMethod::Direct => {
            let synthesizer = DirectSynthesizer::new(pipeline.config().execution_mode);
            pipeline.run_with(&synthesizer, &lines, &atmosphere, partition.as_ref(), None)?
        }
    };

    let document = SynthesisDocument::new(pipeline.grid(), &output);
    write_json_output(&args.output, &document)?;
    println!(
        "Wrote {} x {} cross sections ({}) to {}",
        output.cross_sections.layer_count(),
        output.cross_sections.grid_len(),
        output.diagnostics.method,
        args.output.display()
    );
    Ok(0)
}
