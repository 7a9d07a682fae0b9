mod cli;

use std::process::ExitCode;

use clap::Parser;
use coherence_core::{CacheConfig, Protocol};
use coherence_sim::System;
use coherence_trace::{load_trace, write_report};

use cli::Cli;

const WORD_SIZE: usize = 4;
const PROCESSOR_NUM: usize = 4;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let protocol: Protocol = cli.protocol.parse().unwrap_or(Protocol::None);
    log::info!(
        "Protocol: {protocol}\nTrace file: {}\nCache size: {} bytes\nAssociativity: {}-way\nBlock size: {} bytes",
        cli.trace,
        cli.cache_size,
        cli.associativity,
        cli.block_size
    );

    if protocol == Protocol::None {
        log::warn!("unrecognized protocol {:?}; not running a simulation", cli.protocol);
        return ExitCode::SUCCESS;
    }

    let config = match CacheConfig::new(cli.cache_size, cli.associativity, cli.block_size, WORD_SIZE) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid cache configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut traces = Vec::with_capacity(PROCESSOR_NUM);
    for core_id in 0..PROCESSOR_NUM {
        let path = cli.trace_dir.join(format!("{}_{core_id}.data", cli.trace));
        match load_trace(&path) {
            Ok(records) => traces.push(records),
            Err(err) => {
                eprintln!("failed to load trace for core {core_id}: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let system = System::new(protocol, PROCESSOR_NUM, config);
    let report = system.run(traces);

    if let Err(err) = write_report(&cli.output, &report.core_trackers, &report.bus_tracker) {
        eprintln!("failed to write report: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
