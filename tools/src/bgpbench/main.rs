/*!
bgpbench - compare wire formats on a real BGP table

Reads the output of BIRD's `show route all`, then encodes and decodes the
routes with each format, checking nothing was lost on the way.

```bash
birdc show route all > table.txt
bgpbench -n 20 table.txt
bgpbench -f cbor,netbufs --save out/ table.txt && nbdiag -s tools/schemas/bgp.toml out/routes.netbufs
```
*/

use anyhow::{Context, bail};
use clap::Parser;
use formats::{Format, Kind};
use netbufs_tools::{exit_code, io::Input, logger, parse_args, settings};
use route::Route;
use std::{
    fs,
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};
use tracing::info;

mod bird;
mod formats;
mod route;

/// Compare wire formats on a BIRD routing table dump
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Formats to measure, all of them by default
    #[arg(short, long, value_enum, value_delimiter = ',')]
    format: Vec<Kind>,

    /// Encode and decode passes per format
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    iterations: u32,

    /// Also write each encoding to DIR/routes.<format>
    #[arg(long, value_name = "DIR")]
    save: Option<PathBuf>,

    /// Output of `show route all`, '-' for stdin
    #[arg(default_value = "-")]
    input: Input,
}

struct Measurement {
    name: &'static str,
    data: Vec<u8>,
    encode: Duration,
    decode: Duration,
}

fn measure(format: &dyn Format, routes: &[Route], iterations: u32) -> anyhow::Result<Measurement> {
    let start = Instant::now();
    let mut data = Vec::new();
    for _ in 0..iterations {
        data = format.encode(routes)?;
    }
    let encode = start.elapsed() / iterations;

    let start = Instant::now();
    let mut decoded = Vec::new();
    for _ in 0..iterations {
        decoded = format.decode(&data)?;
    }
    let decode = start.elapsed() / iterations;

    if decoded != routes {
        bail!("{} did not decode the routes it encoded", format.name());
    }
    Ok(Measurement {
        name: format.name(),
        data,
        encode,
        decode,
    })
}

fn print_table(results: &[Measurement], routes: usize) {
    println!(
        "{:<10} {:>12} {:>12} {:>20} {:>20}",
        "format", "bytes", "bytes/route", "encode", "decode"
    );
    for m in results {
        println!(
            "{:<10} {:>12} {:>12.1} {:>20} {:>20}",
            m.name,
            m.data.len(),
            m.data.len() as f64 / routes.max(1) as f64,
            humantime::format_duration(m.encode).to_string(),
            humantime::format_duration(m.decode).to_string(),
        );
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let settings = settings::load(args.config.as_deref())?;
    logger::init(&settings.log_level)?;

    let text = args.input.read_to_string().context("Failed to read input")?;
    let routes = bird::parse(&text)?;
    info!("Parsed {} routes", routes.len());

    let kinds = if args.format.is_empty() {
        Kind::all()
    } else {
        args.format
    };

    let mut results = Vec::new();
    for kind in kinds {
        let format = kind.format()?;
        let m = measure(format.as_ref(), &routes, args.iterations)?;
        if let Some(dir) = &args.save {
            let path = dir.join(format!("routes.{}", m.name));
            fs::write(&path, &m.data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        results.push(m);
    }
    print_table(&results, routes.len());
    Ok(())
}

fn main() -> ExitCode {
    match parse_args::<Args>() {
        Ok(args) => exit_code("bgpbench", run(args)),
        Err(code) => code,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn measures_every_format() {
        let routes = route::test::sample();
        for kind in Kind::all() {
            let m = measure(kind.format().unwrap().as_ref(), &routes, 2).unwrap();
            assert!(!m.data.is_empty());
        }
    }

    #[test]
    fn flags() {
        let a = Args::try_parse_from(["bgpbench", "-f", "cbor,protobuf", "-n", "3"]).unwrap();
        assert_eq!(a.format, [Kind::Cbor, Kind::Protobuf]);
        assert_eq!(a.iterations, 3);
        assert!(Args::try_parse_from(["bgpbench", "-n", "0"]).is_err());
        assert!(Args::try_parse_from(["bgpbench", "-f", "xml"]).is_err());
    }
}
