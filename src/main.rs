use clap::Parser;
use std::sync::Arc;

use dashboard_gateway::cli::Cli;
use dashboard_gateway::config::Config;
use dashboard_gateway::handler::Dispatcher;
use dashboard_gateway::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config, cli.port)?;
    logger::init(&cfg.logging)?;

    // Size the runtime from the workers setting, defaulting to CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let dispatcher = Arc::new(Dispatcher::from_config(&cfg)?);

    logger::log_server_start(&addr, &cfg);

    server::serve(listener, dispatcher, server::signal::wait_for_shutdown()).await;
    Ok(())
}
