use dial9_gpu_timeline::telemetry::{TraceReader, analyze_trace, print_analysis};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <trace_file>", args[0]);
        std::process::exit(1);
    }

    let trace_file = &args[1];
    println!("Analyzing trace: {}", trace_file);

    let mut reader = TraceReader::new(trace_file).expect("Failed to open trace file");
    let (magic, version) = reader.read_header().expect("Failed to read header");
    println!("Magic: {}, Version: {}", magic, version);

    let events = reader.read_all().expect("Failed to read events");
    println!("Read {} events, {} labels", events.len(), reader.labels.len());

    let analysis = analyze_trace(&events);
    print_analysis(&analysis);
}
