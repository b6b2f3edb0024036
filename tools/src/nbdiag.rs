/*!
nbdiag - print NetBufs records with the names a schema gives their ids

```bash
nbdiag -s tools/schemas/bgp.toml routes.nb
```
*/

use anyhow::Context;
use clap::Parser;
use netbufs::Schema;
use netbufs_tools::{
    exit_code,
    io::{Input, Output},
    logger, parse_args, settings,
};
use std::{io::Write, path::PathBuf, process::ExitCode};
use tracing::warn;

/// Print NetBufs records using the names from a schema
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema file naming the group and attribute ids
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Read the input as hex text
    #[arg(short = 'x', long)]
    hex_input: bool,

    /// Cut strings after N bytes, 0 to show them whole
    #[arg(short, long, value_name = "N")]
    truncate: Option<usize>,

    /// Output file, '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: Output,

    /// Input file, '-' for stdin
    #[arg(default_value = "-")]
    input: Input,
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = settings::load(args.config.as_deref())?;
    if let Some(truncate) = args.truncate {
        settings.truncate = truncate;
    }
    logger::init(&settings.log_level)?;

    let schema = match &args.schema {
        Some(path) => settings::load_schema(path)
            .with_context(|| format!("Failed to load schema {}", path.display()))?,
        None => {
            warn!("No schema given, ids will not be named");
            Schema::builder().build()?
        }
    };

    let mut decoder = args
        .input
        .decoder(args.hex_input, &settings.codec())
        .context("Failed to open input")?;
    let mut out = netbufs::diag::render(
        &mut decoder,
        &schema,
        args.output.writer()?,
        &settings.dump_options(),
    )?;
    out.flush()?;
    decoder.finish()?;
    Ok(())
}

fn main() -> ExitCode {
    match parse_args::<Args>() {
        Ok(args) => exit_code("nbdiag", run(args)),
        Err(code) => code,
    }
}
