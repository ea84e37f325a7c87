pub mod broadening;
pub mod direct;
pub mod pipeline;
pub mod preprocess;
pub mod synthesis;
pub mod wavenumber;

mod traits;

pub use broadening::{
    BroadeningGrid, BroadeningGridError, BroadeningGridInput, BroadeningGridPolicy,
    build_broadening_grid, build_layer_broadening_grids,
};
pub use direct::DirectSynthesizer;
pub use pipeline::CrossSectionPipeline;
pub use preprocess::{LayerLineParameters, LineParameterInput, compute_layer_line_parameters};
pub use synthesis::{
    CrossSectionMatrix, ModitSynthesizer, NegativeValuePolicy, NegativeValueReport,
    SynthesisDiagnostics, SynthesisOptions, SynthesisOutput, SynthesisRequest,
};
pub use traits::CrossSectionSynthesizer;
pub use wavenumber::{
    SpectralUnit, WavenumberGrid, WavenumberGridError, WavenumberIndex, WavenumberIndexCache,
    WavenumberIndexError,
};
