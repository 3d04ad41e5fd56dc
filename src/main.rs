// Entry point for shelf.
// Loads config, installs logging, wires the cache to the API, and runs the UI.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{error, info};

use shelf::api::ApiClient;
use shelf::app::App;
use shelf::cache::QueryCache;
use shelf::config::Config;
use shelf::library::Library;
use shelf::{logging, paths};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shelf: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so buffered log lines are flushed.
    let _guard = match paths::log_dir().map(|dir| logging::init(&config, &dir)) {
        Some(Ok(guard)) => Some(guard),
        Some(Err(e)) => {
            eprintln!("shelf: logging disabled: {}", e);
            None
        }
        None => None,
    };

    let client = match ApiClient::new(&config.api_base_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("shelf: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(base_url = %client.base_url(), page_size = config.page_size, "starting");

    let cache = QueryCache::new(Arc::new(client)).with_keep_unused_for(config.keep_unused_for());
    let library = Library::new(cache);
    let mut app = App::new(library, config.page_size, Handle::current());

    let mut terminal = ratatui::init();
    // The UI loop polls the terminal synchronously; keep the runtime's other workers free.
    let result = tokio::task::block_in_place(|| app.run(&mut terminal));
    ratatui::restore();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "terminal error");
            eprintln!("shelf: {}", e);
            ExitCode::FAILURE
        }
    }
}
