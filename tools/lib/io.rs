/*!
Input and output selection for the tools: a path, or `-` for stdin/stdout.
*/

use super::*;
use cbor::{buffer::Buffer, decode::Decoder, encode::Encoder, stream::Config};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Input source - either stdin or a file
#[derive(Debug, Clone)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn read_to_string(&self) -> io::Result<String> {
        match self {
            Input::Stdin => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
            Input::File(path) => fs::read_to_string(path),
        }
    }

    /// Opens the input for decoding.
    ///
    /// Binary input is streamed through the configured window; hex text is
    /// read whole and decoded, ignoring whitespace.
    pub fn decoder(&self, hex: bool, config: &Config) -> anyhow::Result<Decoder> {
        if hex {
            let digits: String = self.read_to_string()?.split_whitespace().collect();
            return Ok(Decoder::with_config(
                Buffer::from_vec(hex::decode(digits)?),
                config,
            ));
        }
        Ok(match self {
            Input::Stdin => Decoder::reader(io::stdin(), config),
            Input::File(path) => Decoder::reader(fs::File::open(path)?, config),
        })
    }
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Input::Stdin)
        } else {
            Ok(Input::File(PathBuf::from(s)))
        }
    }
}

/// Output destination - either stdout or a file
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    pub fn writer(&self) -> io::Result<Box<dyn Write + Send>> {
        Ok(match self {
            Output::Stdout => Box::new(io::stdout()),
            Output::File(path) => Box::new(fs::File::create(path)?),
        })
    }

    /// Opens the destination for encoding, flushed a window at a time.
    pub fn encoder(&self, config: &Config) -> io::Result<Encoder> {
        Ok(Encoder::writer(self.writer()?, config))
    }

    /// Writes `data` as one line of hex text.
    pub fn write_hex(&self, data: &[u8]) -> io::Result<()> {
        let mut out = self.writer()?;
        writeln!(out, "{}", hex::encode(data))?;
        out.flush()
    }
}

impl FromStr for Output {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "-" {
            Ok(Output::Stdout)
        } else {
            Ok(Output::File(PathBuf::from(s)))
        }
    }
}
