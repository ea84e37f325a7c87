use crate::modules::broadening::BroadeningGrid;
use crate::modules::wavenumber::WavenumberIndex;
use crate::numerics::stable_sum;

/// Line strength of one isotopologue in one layer, scattered onto
/// `[broadening point x wavenumber]` buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShapeDensity {
    isotope: usize,
    grid_len: usize,
    buckets: Vec<Vec<f64>>,
    line_count: usize,
}

impl LineShapeDensity {
    fn new(isotope: usize, broadening_points: usize, grid_len: usize) -> Self {
        Self {
            isotope,
            grid_len,
            buckets: vec![Vec::new(); broadening_points],
            line_count: 0,
        }
    }

    pub fn isotope(&self) -> usize {
        self.isotope
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn broadening_points(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets that received strength, as `(broadening point, values)`.
    pub fn occupied_buckets(&self) -> impl Iterator<Item = (usize, &[f64])> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(point, bucket)| (point, bucket.as_slice()))
    }

    pub fn bucket_total(&self, point: usize) -> f64 {
        stable_sum(&self.buckets[point])
    }

    pub fn total(&self) -> f64 {
        (0..self.buckets.len())
            .map(|point| self.bucket_total(point))
            .sum()
    }

    fn add(&mut self, point: usize, wavenumber: usize, value: f64) {
        if value == 0.0 {
            return;
        }
        let bucket = &mut self.buckets[point];
        if bucket.is_empty() {
            bucket.resize(self.grid_len, 0.0);
        }
        bucket[wavenumber] += value;
    }
}

/// Per-layer view needed to scatter line strengths.
#[derive(Debug, Clone, Copy)]
pub struct LayerBinning<'a> {
    pub index: &'a WavenumberIndex,
    pub broadening: &'a BroadeningGrid,
    pub isotopes: &'a [usize],
    pub isotope_count: usize,
}

/// Scatters each line with positive strength onto four targets: the two
/// wavenumber neighbors times the two bracketing broadening points.
///
/// Returns one density per isotopologue that has at least one such line.
pub fn bin_layer_line_strengths(
    binning: &LayerBinning<'_>,
    strengths: &[f64],
    normalized_widths: &[f64],
) -> Vec<LineShapeDensity> {
    let grid_len = binning.index.grid_len();
    let points = binning.broadening.len();
    let mut densities: Vec<Option<LineShapeDensity>> = vec![None; binning.isotope_count];

    for (line, (&strength, &width)) in strengths.iter().zip(normalized_widths).enumerate() {
        if !(strength > 0.0) {
            continue;
        }
        let isotope = binning.isotopes[line];
        let density = densities[isotope]
            .get_or_insert_with(|| LineShapeDensity::new(isotope, points, grid_len));
        density.line_count += 1;

        let lower = binning.index.lower_index(line);
        let upper_nu = binning.index.upper_weight(line);
        let (point, upper_gamma) = binning.broadening.bracket(width);
        let lower_nu = 1.0 - upper_nu;
        let lower_gamma = 1.0 - upper_gamma;

        density.add(point, lower, strength * lower_nu * lower_gamma);
        density.add(point, lower + 1, strength * upper_nu * lower_gamma);
        density.add(point + 1, lower, strength * lower_nu * upper_gamma);
        density.add(point + 1, lower + 1, strength * upper_nu * upper_gamma);
    }

    densities.into_iter().flatten().collect()
}
