//! Convert a GPUTLINE binary trace to Chrome trace-event JSON.
//!
//! Usage:
//!   cargo run --example trace_to_chrome -- <input.bin> <output.json>
//!
//! Open the output in `chrome://tracing` or https://ui.perfetto.dev.

use dial9_gpu_timeline::telemetry::{ChromeTraceWriter, TraceReader, TraceWriter};

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: trace_to_chrome <input.bin> <output.json>");
        std::process::exit(1);
    }

    let mut reader = TraceReader::new(&args[1])?;
    let (magic, version) = reader.read_header()?;
    if magic != "GPUTLINE" {
        eprintln!("not a GPUTLINE file (got: {magic})");
        std::process::exit(1);
    }
    eprintln!("GPUTLINE v{version}, converting...");

    let mut writer = ChromeTraceWriter::new(&args[2])?;
    while let Some(event) = reader.read_event()? {
        writer.write_event(&event)?;
    }
    writer.flush()?;
    eprintln!("wrote {} events to {}", writer.len(), args[2]);
    Ok(())
}
