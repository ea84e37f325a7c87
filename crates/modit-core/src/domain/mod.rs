pub mod atmosphere;
pub mod errors;
pub mod lines;
pub mod partition;

pub use atmosphere::{AtmosphereData, AtmosphereError, AtmosphereProfile};
pub use errors::{ModitError, ModitErrorCategory, ModitResult};
pub use lines::{Isotopologue, LineList, LineListData, LineListError, StrengthFilter};
pub use partition::{
    PartitionFunction, PartitionFunctionError, PartitionTable, TabulatedPartitionFunction,
    UnitPartitionFunction,
};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How independent layers are scheduled during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Serial,
    #[default]
    Parallel,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Parallel => "parallel",
        }
    }
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
