/*!
cbordump - validate, copy or dump a stream of CBOR items

```bash
# Re-encode every item, failing on the first malformed one
cbordump data.cbor -o copy.cbor

# Indented diagnostic notation
cbordump -d data.cbor

# Hex in, hex out
echo '83 01 02 03' | cbordump -x -X
```
*/

use anyhow::Context;
use clap::Parser;
use netbufs_cbor::{
    self as cbor,
    buffer::Buffer,
    decode::Decoder,
    diag,
    encode::Encoder,
};
use netbufs_tools::{
    exit_code,
    io::{Input, Output},
    logger, parse_args, settings,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::info;

/// Validate, copy or dump a stream of CBOR items
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print indented diagnostic notation instead of re-encoding
    #[arg(short, long)]
    dump: bool,

    /// Read the input as hex text
    #[arg(short = 'x', long)]
    hex_input: bool,

    /// Write the output as hex text
    #[arg(short = 'X', long, conflicts_with = "dump")]
    hex_output: bool,

    /// Cut dumped strings after N bytes, 0 to show them whole
    #[arg(short, long, value_name = "N")]
    truncate: Option<usize>,

    /// Output file, '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: Output,

    /// Input file, '-' for stdin
    #[arg(default_value = "-")]
    input: Input,
}

/// Decodes every top-level item and writes it straight back out.
fn passthrough(decoder: &mut Decoder, encoder: &mut Encoder) -> Result<u64, cbor::Error> {
    let mut count = 0;
    loop {
        match decoder.decode_item() {
            Ok(item) => encoder.encode_item(&item)?,
            Err(cbor::Error::NoMore) => return Ok(count),
            Err(e) => return Err(e),
        }
        count += 1;
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = settings::load(args.config.as_deref())?;
    if let Some(truncate) = args.truncate {
        settings.truncate = truncate;
    }
    logger::init(&settings.log_level)?;

    let codec = settings.codec();
    let mut decoder = args
        .input
        .decoder(args.hex_input, &codec)
        .context("Failed to open input")?;

    if args.dump {
        diag::dump(&mut decoder, args.output.writer()?, &settings.dump_options())?;
    } else if args.hex_output {
        let mut encoder = Encoder::with_config(Buffer::memory(), &codec);
        let count = passthrough(&mut decoder, &mut encoder)?;
        args.output.write_hex(&encoder.build()?)?;
        info!("Copied {count} items");
    } else {
        let mut encoder = args
            .output
            .encoder(&codec)
            .context("Failed to create output")?;
        let count = passthrough(&mut decoder, &mut encoder)?;
        encoder.finish()?.close()?;
        info!("Copied {count} items");
    }
    decoder.finish()?;
    Ok(())
}

fn main() -> ExitCode {
    match parse_args::<Args>() {
        Ok(args) => exit_code("cbordump", run(args)),
        Err(code) => code,
    }
}
