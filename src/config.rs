use std::env;

use log::warn;

pub const OUTPUT_VAR: &str = "HCERTDEC_OUTPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty `Debug` dump.
    Debug,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: OutputFormat::Debug,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_output(env::var(OUTPUT_VAR).ok().as_deref())
    }

    fn from_output(value: Option<&str>) -> Self {
        let output = match value.map(str::trim) {
            None | Some("") | Some("debug") => OutputFormat::Debug,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                warn!("unknown {} value {:?}, using debug", OUTPUT_VAR, other);
                OutputFormat::Debug
            }
        };
        Config { output }
    }
}
