use modit_core::domain::{
    AtmosphereProfile, ExecutionMode, Isotopologue, LineList, UnitPartitionFunction,
};
use modit_core::modules::{
    CrossSectionSynthesizer, DirectSynthesizer, LayerLineParameters, LineParameterInput,
    ModitSynthesizer, SynthesisOptions, SynthesisOutput, SynthesisRequest, WavenumberGrid,
    WavenumberIndex, compute_layer_line_parameters,
};

fn assert_close(label: &str, expected: f64, actual: f64, abs_tol: f64, rel_tol: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= abs_tol || diff <= rel_tol * expected.abs(),
        "{label}: expected {expected:e}, got {actual:e} (diff {diff:e})"
    );
}

fn carbon_monoxide(centers: Vec<f64>, strengths: Vec<f64>, energies: Vec<f64>) -> LineList {
    let count = centers.len();
    LineList::builder(centers, strengths)
        .lower_state_energies(energies)
        .isotopologues(vec![Isotopologue::new("12C-16O", 28.0)], vec![0; count])
        .build()
        .expect("line list should build")
}

fn parameters(lines: &LineList, atmosphere: &AtmosphereProfile) -> LayerLineParameters {
    compute_layer_line_parameters(LineParameterInput::new(
        lines,
        atmosphere,
        &UnitPartitionFunction,
    ))
    .expect("layer parameters")
}

fn synthesize(
    synthesizer: &dyn CrossSectionSynthesizer,
    grid: &WavenumberGrid,
    lines: &LineList,
    atmosphere: &AtmosphereProfile,
) -> SynthesisOutput {
    let parameters = parameters(lines, atmosphere);
    let index = WavenumberIndex::from_lines(grid, lines.centers()).expect("index");
    synthesizer
        .synthesize(&SynthesisRequest::new(grid, lines, &index, &parameters))
        .expect("synthesis")
}

/// Integral of a row over wavenumber; each log-grid cell spans `nu / R`.
fn integrate(grid: &WavenumberGrid, row: &[f64]) -> f64 {
    let resolution = grid.resolution();
    row.iter()
        .zip(grid.values())
        .map(|(value, center)| value * center / resolution)
        .sum()
}

fn peak(row: &[f64]) -> (usize, f64) {
    row.iter()
        .copied()
        .enumerate()
        .max_by(|lhs, rhs| lhs.1.total_cmp(&rhs.1))
        .expect("row is not empty")
}

#[test]
fn isolated_line_integrates_to_its_strength() {
    let grid = WavenumberGrid::log_uniform(4050.0, 4060.0, 1000).expect("grid");
    let lines = carbon_monoxide(vec![4055.0], vec![1.0e-20], vec![0.0]);
    let atmosphere = AtmosphereProfile::new(vec![1000.0, 1000.0], vec![0.01, 0.1]).expect("atm");
    let strengths = parameters(&lines, &atmosphere);

    let output = synthesize(&ModitSynthesizer::default(), &grid, &lines, &atmosphere);
    for layer in 0..atmosphere.layer_count() {
        let row = output.cross_sections.row(layer);
        assert_close(
            "integrated cross-section",
            strengths.line_strength(layer, 0),
            integrate(&grid, &row),
            0.0,
            1.0e-2,
        );
        let (point, _) = peak(&row);
        assert!(
            (grid.values()[point] - 4055.0).abs() <= 2.0 * grid.values()[point] / grid.resolution(),
            "layer {layer}: peak at {}",
            grid.values()[point]
        );
    }
}

#[test]
fn well_separated_lines_do_not_interact() {
    let grid = WavenumberGrid::log_uniform(4050.0, 4060.0, 2000).expect("grid");
    let atmosphere = AtmosphereProfile::new(vec![1000.0], vec![0.01]).expect("atm");
    let synthesizer = ModitSynthesizer::new(SynthesisOptions {
        execution_mode: ExecutionMode::Serial,
        ..SynthesisOptions::default()
    });

    let both = carbon_monoxide(vec![4052.5, 4057.5], vec![1.0e-20, 2.0e-20], vec![0.0, 0.0]);
    let first = carbon_monoxide(vec![4052.5], vec![1.0e-20], vec![0.0]);
    let second = carbon_monoxide(vec![4057.5], vec![2.0e-20], vec![0.0]);

    let combined = synthesize(&synthesizer, &grid, &both, &atmosphere)
        .cross_sections
        .row(0);
    let first = synthesize(&synthesizer, &grid, &first, &atmosphere)
        .cross_sections
        .row(0);
    let second = synthesize(&synthesizer, &grid, &second, &atmosphere)
        .cross_sections
        .row(0);

    let (first_point, first_peak) = peak(&first);
    let (second_point, second_peak) = peak(&second);
    assert!(first_point < second_point);
    assert_close("first peak", first_peak, combined[first_point], 0.0, 1.0e-2);
    assert_close("second peak", second_peak, combined[second_point], 0.0, 1.0e-2);

    let midpoint = grid
        .values()
        .iter()
        .position(|value| *value >= 4055.0)
        .expect("midpoint inside grid");
    assert!(
        combined[midpoint] < 1.0e-3 * first_peak,
        "midpoint {:e} vs peak {first_peak:e}",
        combined[midpoint]
    );
}

#[test]
fn hotter_layers_carry_more_high_energy_absorption() {
    let layers = 100;
    let pressures: Vec<f64> = (0..layers)
        .map(|layer| 1.0e-4 * 100.0_f64.powf(layer as f64 / (layers - 1) as f64))
        .collect();
    // Upper layers are hotter.
    let temperatures: Vec<f64> = (0..layers)
        .map(|layer| 2000.0 - 1500.0 * layer as f64 / (layers - 1) as f64)
        .collect();
    let atmosphere = AtmosphereProfile::new(temperatures, pressures).expect("atm");

    let centers: Vec<f64> = (0..10).map(|line| 4051.0 + 8.0 * line as f64 / 9.0).collect();
    let energies: Vec<f64> = (0..10).map(|line| 1000.0 + 2000.0 * line as f64 / 9.0).collect();
    let lines = carbon_monoxide(centers, vec![1.0e-21; 10], energies);
    let grid = WavenumberGrid::log_uniform(4050.0, 4060.0, 4000).expect("grid");

    let parameters = parameters(&lines, &atmosphere);
    for line in 0..lines.len() {
        for layer in 1..layers {
            assert!(
                parameters.line_strength(layer, line) < parameters.line_strength(layer - 1, line),
                "line {line} strength does not fall between layers {} and {layer}",
                layer - 1
            );
        }
    }

    let output = synthesize(&ModitSynthesizer::default(), &grid, &lines, &atmosphere);

    // Strength grows with temperature only while c2 * E / T outweighs the
    // Doppler dilution of the peak; E = 0 lines fall with T once Q(T) rises.
    // Peaks are therefore checked on the excited half of the list, every
    // tenth layer so each step spans about 150 K.
    let strides: Vec<usize> = (0..layers).step_by(10).chain([layers - 1]).collect();
    for line in 5..lines.len() {
        let center = grid.values().partition_point(|value| *value < lines.centers()[line]);
        let window = center.saturating_sub(8)..(center + 8).min(grid.len());
        let peaks: Vec<f64> = strides
            .iter()
            .map(|layer| peak(&output.cross_sections.row(*layer)[window.clone()]).1)
            .collect();
        for step in 1..peaks.len() {
            assert!(
                peaks[step] < peaks[step - 1],
                "line {line}: peak at layer {} ({:e}) >= layer {} ({:e})",
                strides[step],
                peaks[step],
                strides[step - 1],
                peaks[step - 1]
            );
        }
    }

    let integrals: Vec<f64> = (0..layers)
        .map(|layer| integrate(&grid, &output.cross_sections.row(layer)))
        .collect();
    for layer in 1..layers {
        assert!(
            integrals[layer] < integrals[layer - 1],
            "layer {layer}: {:e} >= {:e}",
            integrals[layer],
            integrals[layer - 1]
        );
    }
    for (layer, integral) in integrals.iter().enumerate() {
        let expected: f64 = parameters.layer_strengths(layer).iter().sum();
        assert_close("layer integral", expected, *integral, 0.0, 1.0e-2);
    }
}

#[test]
fn modit_tracks_line_by_line_summation() {
    let grid = WavenumberGrid::log_uniform(4050.0, 4060.0, 4000).expect("grid");
    let centers: Vec<f64> = (0..10).map(|line| 4051.2 + 0.83 * line as f64).collect();
    let strengths: Vec<f64> = (0..10).map(|line| 1.0e-20 * (1.0 + 0.3 * line as f64)).collect();
    let energies: Vec<f64> = (0..10).map(|line| 150.0 * line as f64).collect();
    let lines = carbon_monoxide(centers, strengths, energies);
    let atmosphere = AtmosphereProfile::new(vec![1500.0, 1500.0], vec![0.1, 1.0]).expect("atm");

    let modit = synthesize(&ModitSynthesizer::default(), &grid, &lines, &atmosphere);
    let direct = synthesize(&DirectSynthesizer::default(), &grid, &lines, &atmosphere);

    for layer in 0..atmosphere.layer_count() {
        let fast = modit.cross_sections.row(layer);
        let exact = direct.cross_sections.row(layer);
        let difference: f64 = fast
            .iter()
            .zip(&exact)
            .map(|(lhs, rhs)| (lhs - rhs).abs())
            .sum();
        let norm: f64 = exact.iter().map(|value| value.abs()).sum();
        assert!(
            difference / norm < 5.0e-2,
            "layer {layer}: relative L1 difference {}",
            difference / norm
        );
        assert_close(
            "integrals agree",
            integrate(&grid, &exact),
            integrate(&grid, &fast),
            0.0,
            2.0e-2,
        );
    }
}
