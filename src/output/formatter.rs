use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::round::{Place, PlayerId, Round};
use crate::scoring::{ScoreResult, SessionSummary, TopStat};
use crate::session::Session;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a point change with an explicit sign: "+6", "-3", "0"
pub fn format_delta(points: impl Into<i64>, use_colors: bool) -> String {
    let points: i64 = points.into();
    let text = if points > 0 {
        format!("+{}", points)
    } else {
        points.to_string()
    };

    if !use_colors {
        return text;
    }
    match points.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text.dimmed().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn slot_name(session: &Session, player: Option<PlayerId>) -> String {
    match player {
        Some(id) => session.player_name(id),
        None => "-".to_string(),
    }
}

fn format_ranking(session: &Session, round: &Round) -> String {
    if round.self_win {
        return format!("  Self-win: {}", slot_name(session, round.winner()));
    }
    Place::ALL
        .into_iter()
        .map(|place| {
            format!(
                "  {:<7} {}",
                format!("{}:", place),
                slot_name(session, round.ranking.get(place))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one round: mode, placements, burns, transfers, deltas and warnings.
/// Verbose mode adds the line-by-line breakdown.
pub fn format_round(
    session: &Session,
    index: usize,
    result: &ScoreResult,
    verbose: bool,
    use_colors: bool,
) -> String {
    let Some(round) = session.rounds.get(index) else {
        return format!("No round {} in this session.", index + 1);
    };

    let mut lines = Vec::new();
    let title = format!(
        "{} #{} - round {}/{} ({} mode)",
        session.name,
        session.id,
        index + 1,
        session.round_count(),
        result.mode
    );
    lines.push(if use_colors {
        title.bold().to_string()
    } else {
        title
    });

    lines.push(format_ranking(session, round));

    if !round.burns.is_empty() {
        let burned: Vec<String> = round
            .burns
            .iter()
            .map(|b| slot_name(session, b.from))
            .collect();
        lines.push(format!("  Burned:  {}", burned.join(", ")));
    }

    for transfer in &round.manual_transfers {
        lines.push(format!(
            "  Transfer #{}: {} -> {} ({})",
            transfer.id,
            slot_name(session, transfer.from),
            slot_name(session, transfer.to),
            transfer.amount
        ));
    }

    lines.push(String::new());
    let name_width = name_column_width(session);
    for player in &session.players {
        lines.push(format!(
            "  {:<width$}  {:>4}",
            player.name,
            format_delta(result.delta(player.id), use_colors),
            width = name_width
        ));
    }

    if verbose && !result.breakdown.is_empty() {
        lines.push(String::new());
        lines.push("  Breakdown:".to_string());
        for line in &result.breakdown {
            lines.push(format!(
                "    {:<width$}  {:>4}  {}",
                session.player_name(line.player),
                format_delta(line.points, use_colors),
                line.label,
                width = name_width
            ));
        }
    }

    if result.total != 0 {
        lines.push(format!("  Unbalanced total: {}", format_delta(result.total, use_colors)));
    }
    lines.extend(format_warnings(result, use_colors));

    lines.join("\n")
}

fn format_warnings(result: &ScoreResult, use_colors: bool) -> Vec<String> {
    result
        .warnings
        .iter()
        .map(|w| {
            let text = format!("  ! {}", w);
            if use_colors {
                text.yellow().to_string()
            } else {
                text
            }
        })
        .collect()
}

fn name_column_width(session: &Session) -> usize {
    session
        .players
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(4, 24)
}

fn format_top(label: &str, stat: &TopStat) -> String {
    if stat.count == 0 {
        format!("  {}: {}", label, stat.names.join(", "))
    } else {
        format!("  {}: {} ({}x)", label, stat.names.join(", "), stat.count)
    }
}

/// Format session totals and statistics
pub fn format_summary(session: &Session, summary: &SessionSummary, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let title = format!(
        "{} #{} - {} rounds",
        session.name,
        session.id,
        session.round_count()
    );
    lines.push(if use_colors {
        title.bold().to_string()
    } else {
        title
    });

    let name_width = name_column_width(session);
    let mut standings: Vec<_> = session.players.iter().collect();
    // Highest total first; seat order breaks ties
    standings.sort_by_key(|p| std::cmp::Reverse(summary.total(p.id)));
    for player in standings {
        lines.push(format!(
            "  {:<width$}  {:>5}",
            player.name,
            format_delta(summary.total(player.id), use_colors),
            width = name_width
        ));
    }

    if summary.grand_total != 0 {
        lines.push(format!(
            "  Unbalanced grand total: {}",
            format_delta(summary.grand_total, use_colors)
        ));
    }

    lines.push(String::new());
    lines.push(format_top("Most burned", &summary.top_burned));
    lines.push(format_top("Most stakes eaten from", &summary.top_manually_transferred_from));

    if !summary.rounds_with_warnings.is_empty() {
        let rounds: Vec<String> = summary
            .rounds_with_warnings
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        let text = format!("  ! Rounds with warnings: {}", rounds.join(", "));
        lines.push(if use_colors {
            text.yellow().to_string()
        } else {
            text
        });
    }

    lines.join("\n")
}

fn mode_tag(round: &Round) -> &'static str {
    if round.self_win {
        "self-win"
    } else if !round.burns.is_empty() {
        "burn"
    } else {
        "ranking"
    }
}

/// Format sessions as one line each: id, rounds, created date, name.
/// Names are truncated to the terminal width.
pub fn format_session_list(sessions: &[&Session], use_colors: bool) -> String {
    if sessions.is_empty() {
        return "No sessions yet. Start one with `phom-score new`.".to_string();
    }

    let term_width = get_terminal_width();
    // "#id" (5) + rounds (10) + date (12) + spacing
    let fixed_width = 5 + 1 + 10 + 1 + 12 + 1;

    sessions
        .iter()
        .map(|session| {
            let id = format!("#{:<4}", session.id);
            let rounds = format!("{:>3} rounds", session.round_count());
            let created = session.created_at.format("%Y-%m-%d").to_string();
            let name = match term_width {
                Some(w) if w > fixed_width + 3 => truncate(&session.name, w - fixed_width),
                _ => session.name.clone(),
            };
            if use_colors {
                format!("{} {} {}  {}", id.cyan(), rounds, created.dimmed(), name.bold())
            } else {
                format!("{} {} {}  {}", id, rounds, created, name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line description of the current round, used after navigation
pub fn format_cursor(session: &Session) -> String {
    let round = session.current_round();
    let state = if round.is_blank() {
        "blank"
    } else {
        mode_tag(round)
    };
    format!(
        "{} #{}: round {}/{} ({})",
        session.name,
        session.id,
        session.current_round_index + 1,
        session.round_count(),
        state
    )
}
