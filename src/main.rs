use transformer_walkthrough::cli::run_cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run_cli() {
        eprintln!("Application error: {}", e);
        let mut current_err: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(&e);
        while let Some(source) = current_err {
            eprintln!("Caused by: {}", source);
            current_err = source.source();
        }
        std::process::exit(1);
    }
}
