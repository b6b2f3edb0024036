use super::*;
use cbor::{diag::DumpOptions, stream::Config};
use netbufs::Schema;
use serde::Deserialize;
use std::path::Path;

/// Options common to every tool, read from an optional configuration file
/// and `NETBUFS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    // One of trace, debug, info, warn, error or off
    pub log_level: String,
    // Deepest allowed nesting of containers and tags
    pub max_depth: usize,
    // Read and write window, in bytes
    pub buffer_size: usize,
    // Dumped strings are cut after this many bytes, 0 to never cut
    pub truncate: usize,
    // Spaces per nesting level in dumps
    pub indent: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let config = Config::default();
        let dump = DumpOptions::default();
        Self {
            log_level: "info".to_string(),
            max_depth: config.max_depth,
            buffer_size: config.buffer_size,
            truncate: dump.truncate.unwrap_or(0),
            indent: dump.indent,
        }
    }
}

impl Settings {
    pub fn codec(&self) -> Config {
        Config {
            max_depth: self.max_depth,
            buffer_size: self.buffer_size,
        }
    }

    pub fn dump_options(&self) -> DumpOptions {
        DumpOptions {
            truncate: (self.truncate > 0).then_some(self.truncate),
            indent: self.indent,
        }
    }
}

pub fn load(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    // Allow environment variables to override
    builder = builder.add_source(config::Environment::with_prefix("NETBUFS").try_parsing(true));

    builder.build()?.try_deserialize().map_err(Into::into)
}

/// Reads a schema file: TOML, YAML or JSON by extension.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .build()?
        .try_deserialize()
        .map_err(Into::into)
}

/// Parses a TOML schema held in memory.
pub fn parse_schema(text: &str) -> anyhow::Result<Schema> {
    config::Config::builder()
        .add_source(config::File::from_str(text, config::FileFormat::Toml))
        .build()?
        .try_deserialize()
        .map_err(Into::into)
}
