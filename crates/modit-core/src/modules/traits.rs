use super::synthesis::{SynthesisOutput, SynthesisRequest};
use crate::domain::ModitResult;

pub trait CrossSectionSynthesizer {
    /// Short label recorded in diagnostics.
    fn method(&self) -> &'static str;

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> ModitResult<SynthesisOutput>;
}
