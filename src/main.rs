use anyhow::Result;
use clap::Parser;
use photobooth::{backends, Booth, BoothConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "photobooth")]
#[command(about = "Kiosk photobooth controller")]
#[command(version)]
#[command(long_about = "A kiosk photobooth controller that drives a camera, a physical \
start button with ready LED, a fullscreen display and a printer through a fixed stage \
sequence: greeting, four captures, print and farewell, looping forever.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "photobooth.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the booth")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - resolve configuration and backend names, don't touch hardware
    #[arg(long, help = "Perform dry run - resolve configuration and backend names, then exit")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write daily rolling log files into this directory
    #[arg(long, value_name = "DIR", help = "Also write daily rolling logs into this directory")]
    log_dir: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    // Initialize logging; the guard must stay alive for file logging
    let _log_guard = init_logging(&args)?;

    info!("Starting photobooth v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    // Load and validate configuration
    let config = match BoothConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    // Handle dry run mode before any hardware is touched
    if args.dry_run {
        backends::validate_selection(&config)?;
        info!("Dry run mode - configuration and backend names resolved");
        println!("✓ Dry run completed successfully - all backend names resolved");
        return Ok(());
    }

    let shutdown = CancellationToken::new();

    // Resolve the configured backends once, then hand them to the booth
    let backend_set = backends::resolve_backends(&config, shutdown.clone()).map_err(|e| {
        error!("Failed to resolve backends: {}", e);
        e
    })?;

    let mut booth = Booth::new(config, backend_set, shutdown.clone()).map_err(|e| {
        error!("Failed to initialize the booth: {}", e);
        e
    })?;

    setup_signal_handlers(&shutdown);

    match booth.run().await {
        Ok(()) => {
            info!("Photobooth exited cleanly");
            Ok(())
        }
        Err(e) => {
            error!("Photobooth exited with error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Cancel the booth loop on SIGINT and, on Unix, SIGTERM.
fn setup_signal_handlers(shutdown: &CancellationToken) {
    #[cfg(unix)]
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Ok(mut sigterm) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            {
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    shutdown.cancel();
                }
            }
        });
    }

    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            shutdown.cancel();
        }
    });
}

fn init_logging(args: &Args) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("photobooth={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(dir) = &args.log_dir {
        let file_appender = tracing_appender::rolling::daily(dir, "photobooth.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
        registry.with(file_layer).init();
        Ok(Some(guard))
    } else {
        registry.init();
        Ok(None)
    }
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Photobooth configuration file");
    println!("# Default values for all available options");
    println!();
    println!("{}", toml::to_string_pretty(&BoothConfig::default())?);
    Ok(())
}
