use std::path::Path;
use std::sync::Arc;

use dirserve::config::{AppState, Config};
use dirserve::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Tokio runtime sized by `server.workers`, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.worker_threads() {
        runtime_builder.worker_threads(workers);
        logger::log_workers(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    let root = Path::new(&cfg.server.root).to_path_buf();
    if !root.is_dir() {
        logger::log_root_missing(&root);
    }

    let listener = match server::create_listener(addr) {
        Ok(l) => l,
        Err(e) => {
            logger::log_bind_failed(&addr, &e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(cfg));
    logger::log_server_start(&addr, &root);

    server::serve(listener, state, server::shutdown_signal()).await;
    Ok(())
}
