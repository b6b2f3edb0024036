/*!
Plumbing shared by the `cbordump`, `nbdiag` and `bgpbench` binaries.
*/

use netbufs_cbor as cbor;
use std::process::ExitCode;

pub mod io;
pub mod logger;
pub mod settings;

/// True when `err` was caused by malformed input rather than by the
/// environment (files, configuration, arguments).
pub fn is_data_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<cbor::Error>() {
            !e.is_io()
        } else if let Some(e) = cause.downcast_ref::<netbufs::Error>() {
            match e {
                netbufs::Error::Cbor(e) => !e.is_io(),
                netbufs::Error::UnexpectedGroup { .. }
                | netbufs::Error::MissingRequired { .. }
                | netbufs::Error::NoGroup => true,
                _ => false,
            }
        } else {
            cause.is::<hex::FromHexError>()
        }
    })
}

/// Reports the outcome of a tool run: 0 on success, 2 for bad data, 1 otherwise.
pub fn exit_code(program: &str, result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{program}: {e:#}");
            if is_data_error(&e) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Parses the command line, exiting 0 for `--help`/`--version` and 1 for usage errors.
pub fn parse_args<P: clap::Parser>() -> Result<P, ExitCode> {
    P::try_parse().map_err(|e| {
        let code = if e.use_stderr() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
        // Nothing useful to do if the terminal is gone
        let _ = e.print();
        code
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify() {
        assert!(is_data_error(&cbor::Error::Eof.into()));
        assert!(is_data_error(
            &anyhow::Error::from(cbor::Error::Parse(0x1c)).context("Decoding input")
        ));
        assert!(is_data_error(
            &netbufs::Error::UnexpectedGroup {
                expected: 1,
                found: 2
            }
            .into()
        ));
        assert!(is_data_error(&hex::decode("abc").unwrap_err().into()));
        assert!(!is_data_error(
            &cbor::Error::Read(std::io::Error::other("gone")).into()
        ));
        assert!(!is_data_error(&netbufs::Error::DuplicateId(3).into()));
        assert!(!is_data_error(&anyhow::anyhow!("bad configuration")));
    }
}
