//! Console entry point.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracker::{Config, Console, Reply, Repositories, TrackerService};

fn prompt(username: &str) {
    print!("{username}> ");
    if let Err(e) = std::io::stdout().flush() {
        tracing::debug!(error = %e, "failed to flush prompt");
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing on stderr so it does not mix with console output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 2. Load configuration
    let config = Config::from_env();
    tracing::info!(
        storage = ?config.storage,
        data_dir = %config.data_dir.display(),
        "starting tracker"
    );

    // 3. Open repositories and sign in
    let service = TrackerService::new(Repositories::from_config(&config));
    let user = match service.bootstrap_user(&config.username).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, username = %config.username, "cannot sign in");
            std::process::exit(1);
        }
    };
    let console = Console::new(service, user);
    println!(
        "signed in as {} ({}), type 'help' for commands",
        console.user().username(),
        console.user().role()
    );

    // 4. Read commands until EOF or quit
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(console.user().username());
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };

        if !line.trim().is_empty() {
            match console.handle(&line).await {
                Ok(Reply::Text(text)) => println!("{text}"),
                Ok(Reply::Quit) => break,
                Err(e) => println!("error: {e}"),
            }
        }
        prompt(console.user().username());
    }

    tracing::info!("tracker stopped");
}
