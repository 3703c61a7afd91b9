use std::io;

use clap::{Args, Parser, Subcommand};
use santa_backend::config::ServerConfig;
use santa_backend::{app, console, AppState};
use santa_core::Party;

#[derive(Parser)]
#[command(
    name = "secret-santa",
    version,
    about = "Secret Santa party game: roster, draw, challenges and leaderboard"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API used by the web front-end (default)
    Serve(ServeArgs),
    /// Play from an interactive menu in this terminal
    Console,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Address to listen on (also reads SANTA_BIND_ADDR, default 0.0.0.0:5000)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve(ServeArgs::default()));

    // The console shares the terminal with the menu, so only warnings show there.
    let default_filter = match command {
        Command::Serve(_) => "info",
        Command::Console => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match command {
        Command::Serve(args) => serve(args).await,
        Command::Console => tokio::task::spawn_blocking(play_in_terminal)
            .await
            .map_err(io::Error::other)?,
    }
}

async fn serve(args: ServeArgs) -> io::Result<()> {
    let config = ServerConfig::resolve(args.bind.as_deref())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("Starting server on {}", config.bind_addr);
    axum::serve(listener, app(AppState::default())).await
}

fn play_in_terminal() -> io::Result<()> {
    let mut party = Party::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    console::run(&mut party, stdin.lock(), &mut stdout, &mut rand::thread_rng())
}
