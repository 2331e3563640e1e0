//! # fabled CLI
//!
//! Entry points for the fabled text adventure service.
//!
//! Usage:
//!   fabled serve
//!   fabled games
//!   fabled play zork1 "open mailbox" "take leaflet"
//!   fabled play zork1 --walkthrough
//!
//! `serve` reads its configuration from the environment (FABLED_ADDR,
//! FABLED_PORT, FABLED_GAMES_DIR, FABLED_SAVE_DIR); command-line flags
//! override it.

use clap::{Parser, Subcommand};
use fabled_core::{GameLibrary, SessionRegistry};
use fabled_server::ServerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fabled")]
#[command(author, version, about = "Text adventure sessions for automated agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP tool server
    Serve {
        /// Bind address (overrides FABLED_ADDR)
        #[arg(long)]
        addr: Option<String>,

        /// Bind port (overrides FABLED_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Directory of Z-machine story files (overrides FABLED_GAMES_DIR)
        #[arg(long)]
        games_dir: Option<PathBuf>,
    },
    /// List the games in the library
    Games {
        /// Maximum number to show (0 = all)
        #[arg(short, long, default_value = "0")]
        limit: usize,

        /// Directory of Z-machine story files
        #[arg(long)]
        games_dir: Option<PathBuf>,
    },
    /// Play a game from the terminal
    Play {
        /// Game id (see `fabled games`)
        game: String,

        /// Commands to run, in order
        #[arg(trailing_var_arg = true)]
        commands: Vec<String>,

        /// Replay the reference solution instead of explicit commands
        #[arg(short, long)]
        walkthrough: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let exit = match cli.command {
        Commands::Serve { addr, port, games_dir } => serve(addr, port, games_dir).await,
        Commands::Games { limit, games_dir } => games(limit, games_dir),
        Commands::Play { game, commands, walkthrough } => play(&game, commands, walkthrough).await,
    };
    std::process::exit(exit);
}

async fn serve(addr: Option<String>, port: Option<u16>, games_dir: Option<PathBuf>) -> i32 {
    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return 1;
        }
    };
    if let Some(addr) = addr {
        config.addr = addr;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(games_dir) = games_dir {
        config.games_dir = Some(games_dir);
    }

    match fabled_server::serve(config).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("server error: {}", e);
            1
        }
    }
}

fn games(limit: usize, games_dir: Option<PathBuf>) -> i32 {
    let library = GameLibrary::discover(games_dir.as_deref());
    let games = library.list(limit);
    println!("{} game(s) available:", library.len());
    for game in games {
        println!("  {:<12} {}", game.id, game.name);
    }
    0
}

async fn play(game: &str, commands: Vec<String>, walkthrough: bool) -> i32 {
    let registry = SessionRegistry::new(GameLibrary::discover(None));
    let (session, opening) = match registry.create(game).await {
        Ok(created) => created,
        Err(e) => {
            eprintln!("failed to start '{}': {}", game, e);
            return 1;
        }
    };
    println!("{}\n", opening.text);

    let script: Vec<String> = if walkthrough {
        // The reference solution is engine-provided; replay it verbatim
        session.walkthrough_commands()
    } else {
        commands
    };

    for command in &script {
        println!("> {}", command);
        match session.step(command).await {
            Ok(report) => {
                println!("{}", report.outcome.text);
                if report.outcome.reward != 0 {
                    println!("[score {} ({:+})]", report.outcome.score, report.outcome.reward);
                }
                println!();
                if report.outcome.game_over {
                    break;
                }
            }
            Err(e) => {
                eprintln!("step failed: {}", e);
                return 1;
            }
        }
    }

    let comparison = session.compare_walkthrough();
    println!(
        "walkthrough: {}",
        serde_json::to_string(&comparison).unwrap_or_else(|_| "unavailable".to_string())
    );

    match registry.close(session.id()).await {
        Ok(summary) => {
            println!(
                "final: {} points in {} moves ({})",
                summary.final_score, summary.total_moves, summary.performance
            );
            0
        }
        Err(e) => {
            eprintln!("close failed: {}", e);
            1
        }
    }
}
