use std::io;

use library::{AppConfig, Console, Library};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Logs go to stderr so they never interleave with the menu on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded configuration: clear_screen={}, pause_after_action={}",
        config.clear_screen,
        config.pause_after_action
    );

    let mut console = Console::new(Library::new(), io::stdin().lock(), io::stdout().lock(), config);
    if let Err(e) = console.run() {
        tracing::error!("Console I/O failed: {e}");
        std::process::exit(1);
    }

    let library = console.into_library();
    tracing::info!(
        "Session ended with {} books, {} users, {} active loans",
        library.books().len(),
        library.users().len(),
        library.loans().len()
    );
}
