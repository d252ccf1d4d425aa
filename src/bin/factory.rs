//! Factory planning CLI
//!
//! Reads one JSON problem document from stdin, writes one JSON result
//! document to stdout. All handled failures land in the output document
//! with exit code 0; diagnostics go to stderr (enable with `RUST_LOG`).

use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let output = flowforge::factory::run(&input);

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
