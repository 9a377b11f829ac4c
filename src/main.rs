use std::sync::Arc;

use color_eyre::{Report, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trishul_link::adapters::{ConsoleSurface, FileStorage, ReqwestHttpClient, TungsteniteConnector};
use trishul_link::app::{App, AppDeps};
use trishul_link::cli::{
    handle_version_command, parse_args, parse_command, CliCommand, ConsoleCommand, COMMANDS_HELP,
    USAGE,
};
use trishul_link::config::ConsoleConfig;
use trishul_link::error::ConsoleError;
use trishul_link::traits::{DurableStorage, SystemClock};

const DEFAULT_LOG_FILTER: &str = "trishul_link=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let options = match parse_args(std::env::args())? {
        CliCommand::Version => {
            handle_version_command();
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Run(options) => options,
    };

    init_tracing();

    let config = options.resolve().map_err(report)?;

    // Bus dispatch, module timers and the transport driver share one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

/// Log a startup failure and attach the recovery hint for its category.
fn report(err: ConsoleError) -> Report {
    let category = err.category();
    error!("startup failed [{}, {}]: {}", err.error_code(), category, err);
    Report::new(err).wrap_err(category.recovery_hint())
}

async fn run(config: ConsoleConfig) -> Result<()> {
    let storage: Arc<dyn DurableStorage> = match &config.data_dir {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => Arc::new(
            FileStorage::default_location().map_err(|e| report(ConsoleError::from(e)))?,
        ),
    };
    let surface = Arc::new(ConsoleSurface::new());
    let deps = AppDeps {
        connector: Arc::new(TungsteniteConnector::new()),
        http: Arc::new(ReqwestHttpClient::new()),
        storage,
        surface: surface.clone(),
        observer: surface,
        clock: Arc::new(SystemClock),
    };

    let mut app = App::new(&config, deps);
    info!("console backend at {}", config.transport.api_base());

    if let Some(token) = &config.token {
        app.connect(token);
    }
    app.navigate(&config.route).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            notice = app.next_notice() => match notice {
                Some(notice) => app.handle_notice(notice).await,
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => execute(&mut app, command).await,
                    Ok(None) => {}
                    Err(message) => eprintln!("{}", message),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.shutdown().await;
    Ok(())
}

async fn execute(app: &mut App, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Connect(token) => app.connect(&token),
        ConsoleCommand::Disconnect => app.disconnect(),
        ConsoleCommand::Navigate(location) => {
            app.navigate(&location).await;
        }
        ConsoleCommand::Input(input) => {
            if !app.dispatch(input) {
                eprintln!("the active module does not take that input");
            }
        }
        ConsoleCommand::Status => println!(
            "{:?} (connected: {}, module: {})",
            app.connection_state(),
            app.is_connected(),
            app.active_route().map_or("none", |r| r.as_str())
        ),
        ConsoleCommand::Help => println!("{}", COMMANDS_HELP),
        ConsoleCommand::Quit => {}
    }
}
