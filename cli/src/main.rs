mod args;
mod logging;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use powerscan_common::device::Bus;
use powerscan_common::error::{EXIT_USAGE, UsageError};
use powerscan_core::budget::ConcurrencyBudget;
use powerscan_core::orchestrator::{ExecStrategy, Orchestrator};
use powerscan_core::probeset::{ProbeSet, RealProbes};
use tracing::error;

use args::CommandLine;
use render::Renderer;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = CommandLine::parse();

    logging::init(cmd.debug, cmd.quiet);

    if cmd.version {
        println!("powerscan {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let probes = RealProbes;

    if cmd.available {
        for bus in Bus::ALL {
            if probes.available(bus) {
                println!("{}", render::bus_token(bus));
            }
        }
        return ExitCode::SUCCESS;
    }

    match run(cmd, Arc::new(probes)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if e.downcast_ref::<UsageError>().is_some() {
                let _ = CommandLine::command().print_help();
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cmd: CommandLine, probes: Arc<dyn ProbeSet>) -> anyhow::Result<()> {
    let enabled = cmd.enabled();

    // A bus named by its own flag without backing support is a usage error;
    // buses picked up by `-C` or the everything-but-serial default merely
    // log a skip.
    for bus in cmd.explicit_buses() {
        if !probes.available(bus) {
            return Err(UsageError::BackendUnavailable(bus).into());
        }
    }

    let registry = cmd.build_registry()?;
    let options = cmd.scan_options();

    let mut budget = ConcurrencyBudget::default();
    if let Some(arg) = &cmd.thread {
        budget = budget.with_override(arg);
    }

    let strategy = if cmd.sequential {
        ExecStrategy::Sequential
    } else {
        ExecStrategy::Parallel
    };

    let mut renderer = Renderer::new(cmd.display_mode());
    let orchestrator = Orchestrator::new(
        probes,
        registry,
        options,
        enabled,
        budget,
        strategy,
    );

    orchestrator
        .run(|bus, devices| renderer.render(bus, devices))
        .await
}
