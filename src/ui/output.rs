//! ui::output
//!
//! Report encoding.
//!
//! Every command writes exactly one report to stdout, encoded as JSON
//! (pretty or compact) or YAML.

use std::io::Write;

use serde::Serialize;

/// Report encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(alias = "j")]
    Json,
    #[value(alias = "y")]
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" | "j" => Ok(OutputFormat::Json),
            "yaml" | "y" => Ok(OutputFormat::Yaml),
            other => Err(format!("invalid output format {other:?}: expected json or yaml")),
        }
    }
}

/// Encodes reports in the chosen format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    pub format: OutputFormat,
    /// Single-line JSON; ignored for YAML.
    pub compact: bool,
}

impl Encoder {
    pub fn new(format: OutputFormat, compact: bool) -> Self {
        Encoder { format, compact }
    }

    /// Encode `value`, always ending in a newline.
    pub fn encode<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        let mut out = match (self.format, self.compact) {
            (OutputFormat::Json, true) => serde_json::to_string(value)?,
            (OutputFormat::Json, false) => serde_json::to_string_pretty(value)?,
            (OutputFormat::Yaml, _) => serde_yaml::to_string(value)?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Encode `value` to `writer`.
    pub fn write<T: Serialize>(&self, writer: &mut impl Write, value: &T) -> anyhow::Result<()> {
        writer.write_all(self.encode(value)?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
