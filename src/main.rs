use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use phom_score::config::Config;
use phom_score::diagnostics;
use phom_score::output;
use phom_score::round::{Place, PlayerId, RoundEdit};
use phom_score::scoring::Tariff;
use phom_score::session::{Session, SessionId, SessionStore};

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_CONFIG: i32 = 4;
const EXIT_STORAGE: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sessions (default if no subcommand)
    List,
    /// Start a new session with one blank round
    New {
        /// Session name (defaults to the current date and time)
        #[arg(short, long)]
        name: Option<String>,
        /// Four comma-separated player names (defaults to config)
        #[arg(short, long, value_delimiter = ',')]
        players: Option<Vec<String>>,
    },
    /// Show a round of a session with its score
    Show {
        session: SessionId,
        /// Round number (1-based, defaults to the current round)
        round: Option<usize>,
    },
    /// Show running totals and statistics for a session
    Summary { session: SessionId },
    /// Delete a session permanently
    Delete { session: SessionId },
    /// Put a player in a ranking slot of the current round
    Rank {
        session: SessionId,
        /// 1-4 or first/second/third/fourth
        place: Place,
        /// Seat number, P1-P4 or player name
        player: String,
    },
    /// Clear a ranking slot of the current round
    Unrank { session: SessionId, place: Place },
    /// Switch self-win mode on (or off with --off) for the current round
    SelfWin {
        session: SessionId,
        #[arg(long)]
        off: bool,
    },
    /// Record that a player burned in the current round
    Burn { session: SessionId, player: String },
    /// Remove a player's burn from the current round
    Unburn { session: SessionId, player: String },
    /// Record a manual transfer (eaten stake) in the current round
    Transfer {
        session: SessionId,
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        amount: i32,
    },
    /// Remove a manual transfer by id from the current round
    Untransfer { session: SessionId, id: u32 },
    /// Move to the next round, opening a blank one after the last
    Next { session: SessionId },
    /// Move to the previous round
    Prev { session: SessionId },
    /// Move to a round by number (1-based)
    Goto { session: SessionId, round: usize },
    /// Delete a round (defaults to the current round)
    DropRound {
        session: SessionId,
        round: Option<usize>,
    },
    /// Rename a session
    Rename { session: SessionId, name: String },
    /// Rename a player of a session
    RenamePlayer {
        session: SessionId,
        player: String,
        name: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "phom-score")]
#[command(about = "Score keeper for four-player Phỏm sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and score breakdowns
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/phom-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the session store (overrides the config file)
    #[arg(short, long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Everything a command needs besides the store
struct RunContext {
    config: Config,
    tariff: Tariff,
    verbose: bool,
    use_colors: bool,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List);

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match phom_score::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = phom_score::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let store_path = match cli.store.as_deref() {
        Some(path) => phom_score::config::expand_home(path),
        None => match phom_score::config::store_path(&config) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
    };

    let mut store = match SessionStore::open(&store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Storage error: {:#}", e);
            std::process::exit(EXIT_STORAGE);
        }
    };

    if cli.verbose {
        eprintln!(
            "Loaded {} sessions from {}",
            store.len(),
            store.path().display()
        );
    }

    let ctx = RunContext {
        tariff: config.tariff(),
        config,
        verbose: cli.verbose,
        use_colors: output::should_use_colors(),
    };

    // Flush warnings are printed after the command's own output
    diagnostics::activate();
    let outcome = run(command, &mut store, &ctx);
    diagnostics::flush();

    match outcome {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn run(command: Commands, store: &mut SessionStore, ctx: &RunContext) -> Result<()> {
    match command {
        Commands::List => {
            let sessions: Vec<&Session> = store.list().collect();
            println!("{}", output::format_session_list(&sessions, ctx.use_colors));
        }
        Commands::New { name, players } => {
            let player_names = match players {
                Some(names) => to_four_names(names)?,
                None => ctx.config.player_names(),
            };
            let name = name.unwrap_or_else(|| {
                chrono::Local::now().format("Session %Y-%m-%d %H:%M").to_string()
            });
            let id = store.create_session(name, player_names);
            let session = get_session(store, id)?;
            println!("Created session #{}: {}", id, session.name);
            for player in &session.players {
                println!("  {}  {}", player.id, player.name);
            }
        }
        Commands::Show { session, round } => {
            let session = get_session(store, session)?;
            let index = match round {
                Some(n) => round_index(session, n)?,
                None => session.current_round_index,
            };
            show_round(session, index, ctx);
        }
        Commands::Summary { session } => {
            let session = get_session(store, session)?;
            let summary = session.summary(&ctx.tariff);
            println!("{}", output::format_summary(session, &summary, ctx.use_colors));
        }
        Commands::Delete { session } => {
            let removed = store.delete_session(session)?;
            println!("Deleted session #{}: {}", removed.id, removed.name);
        }
        Commands::Rank {
            session,
            place,
            player,
        } => edit_round(store, session, ctx, |s| {
            let player = resolve_player(s, &player)?;
            Ok(RoundEdit::Assign { place, player })
        })?,
        Commands::Unrank { session, place } => {
            edit_round(store, session, ctx, |_| Ok(RoundEdit::ClearSlot(place)))?
        }
        Commands::SelfWin { session, off } => {
            edit_round(store, session, ctx, |_| Ok(RoundEdit::SetSelfWin(!off)))?
        }
        Commands::Burn { session, player } => {
            let amount = ctx.tariff.burn_penalty;
            edit_round(store, session, ctx, |s| {
                let player = resolve_player(s, &player)?;
                Ok(RoundEdit::AddBurn { player, amount })
            })?
        }
        Commands::Unburn { session, player } => edit_round(store, session, ctx, |s| {
            Ok(RoundEdit::RemoveBurn(resolve_player(s, &player)?))
        })?,
        Commands::Transfer {
            session,
            from,
            to,
            amount,
        } => edit_round(store, session, ctx, |s| {
            Ok(RoundEdit::AddTransfer {
                from: resolve_player(s, &from)?,
                to: resolve_player(s, &to)?,
                amount,
            })
        })?,
        Commands::Untransfer { session, id } => {
            edit_round(store, session, ctx, |_| Ok(RoundEdit::RemoveTransfer(id)))?
        }
        Commands::Next { session } => navigate(store, session, |s| {
            s.next_round();
            Ok(())
        })?,
        Commands::Prev { session } => navigate(store, session, |s| {
            s.previous_round();
            Ok(())
        })?,
        Commands::Goto { session, round } => navigate(store, session, |s| {
            let index = round_index(s, round)?;
            s.go_to_round(index)
        })?,
        Commands::DropRound { session, round } => {
            let removed = store.update(session, |s| {
                let index = match round {
                    Some(n) => round_index(s, n)?,
                    None => s.current_round_index,
                };
                s.delete_round(index).map(|_| index)
            })?;
            println!("Deleted round {}", removed + 1);
            println!("{}", output::format_cursor(get_session(store, session)?));
        }
        Commands::Rename { session, name } => {
            store.update(session, |s| {
                let name = name.trim();
                if name.is_empty() {
                    anyhow::bail!("Session name cannot be empty");
                }
                s.name = name.to_string();
                Ok(())
            })?;
            println!("{}", output::format_cursor(get_session(store, session)?));
        }
        Commands::RenamePlayer {
            session,
            player,
            name,
        } => {
            store.update(session, |s| {
                let id = resolve_player(s, &player)?;
                s.rename_player(id, &name)
            })?;
            let session = get_session(store, session)?;
            for player in &session.players {
                println!("  {}  {}", player.id, player.name);
            }
        }
    }
    Ok(())
}

fn get_session(store: &SessionStore, id: SessionId) -> Result<&Session> {
    store
        .get(id)
        .with_context(|| format!("No session with id {}. Run `phom-score list`.", id))
}

fn resolve_player(session: &Session, text: &str) -> Result<PlayerId> {
    session.resolve_player(text).with_context(|| {
        let known: Vec<String> = session
            .players
            .iter()
            .map(|p| format!("{} ({})", p.id, p.name))
            .collect();
        format!("Unknown player '{}'. Players: {}", text, known.join(", "))
    })
}

/// Convert a 1-based round number into an index, checking bounds
fn round_index(session: &Session, number: usize) -> Result<usize> {
    if number < 1 || number > session.round_count() {
        anyhow::bail!(
            "Invalid round {}. Must be between 1 and {}.",
            number,
            session.round_count()
        );
    }
    Ok(number - 1)
}

fn to_four_names(names: Vec<String>) -> Result<[String; 4]> {
    let names: Vec<String> = names.into_iter().map(|n| n.trim().to_string()).collect();
    if names.iter().any(|n| n.is_empty()) {
        anyhow::bail!("Player names cannot be empty");
    }
    names
        .try_into()
        .map_err(|names: Vec<String>| anyhow::anyhow!("Expected 4 player names, got {}", names.len()))
}

fn show_round(session: &Session, index: usize, ctx: &RunContext) {
    if let Some(result) = session.score_round(index, &ctx.tariff) {
        println!(
            "{}",
            output::format_round(session, index, &result, ctx.verbose, ctx.use_colors)
        );
    }
}

/// Build an edit against the session, apply it to the current round and show the result
fn edit_round<F>(store: &mut SessionStore, id: SessionId, ctx: &RunContext, build: F) -> Result<()>
where
    F: FnOnce(&Session) -> Result<RoundEdit>,
{
    let changed = store.update(id, |s| {
        let edit = build(&*s)?;
        if ctx.verbose {
            eprintln!("Applying {:?} to round {}", edit, s.current_round_index + 1);
        }
        Ok(s.edit_current_round(edit))
    })?;

    if !changed {
        eprintln!("No change: the edit does not apply to this round.");
    }

    let session = get_session(store, id)?;
    show_round(session, session.current_round_index, ctx);
    Ok(())
}

fn navigate<F>(store: &mut SessionStore, id: SessionId, step: F) -> Result<()>
where
    F: FnOnce(&mut Session) -> Result<()>,
{
    store.update(id, step)?;
    let session = get_session(store, id)?;
    println!("{}", output::format_cursor(session));
    Ok(())
}
