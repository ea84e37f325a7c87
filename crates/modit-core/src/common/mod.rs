pub mod config;
pub mod constants;

pub use config::{
    ConfigError, SynthesisConfig, WavenumberGridConfig, load_atmosphere, load_line_list,
    load_partition_tables, load_synthesis_config,
};
