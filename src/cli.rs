use clap::{Parser, Subcommand};
use std::collections::BTreeMap;

use crate::domain::{PlayerScore, VideoScore};

#[derive(Parser)]
#[command(name = "engagement-board")]
#[command(version)]
#[command(
    about = "Tracks short-video engagement across platforms and serves weighted player scores",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, default_value = "config", env = "ENGAGEMENT_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the API server with the background refresh scheduler (default)
    Serve,
    /// Run one refresh cycle and exit
    Refresh {
        /// Refresh even if the data is still fresh
        #[arg(short, long)]
        force: bool,
    },
    /// Print the latest scores from the data file
    Scores {
        /// Show the player leaderboard instead of videos
        #[arg(short, long)]
        players: bool,
    },
    /// Check the configuration and exit
    Validate,
}

/// Print video scores, highest combined engagement first
pub fn print_video_scores(scores: &BTreeMap<String, VideoScore>) {
    if scores.is_empty() {
        println!("No samples recorded yet. Run `engagement-board refresh` first.");
        return;
    }

    let mut rows: Vec<(&String, &VideoScore)> = scores.iter().collect();
    rows.sort_by(|a, b| b.1.combined.cmp(&a.1.combined).then_with(|| a.0.cmp(b.0)));

    println!(
        "{:<16} {:<28} {:>12} {:>12} {:>10} {:>10}",
        "KEY", "NAME", "COMBINED", "VIEWS", "LIKES", "COMMENTS"
    );
    println!("{}", "-".repeat(93));
    for (key, score) in rows {
        println!(
            "{:<16} {:<28} {:>12} {:>12} {:>10} {:>10}",
            key,
            truncate(&score.name, 28),
            score.combined,
            score.views,
            score.likes,
            score.comments
        );
    }
}

/// Print the player leaderboard, highest combined first
pub fn print_player_scores(scores: &BTreeMap<String, PlayerScore>) {
    let mut rows: Vec<&PlayerScore> = scores.values().collect();
    rows.sort_by(|a, b| {
        b.totals
            .combined
            .cmp(&a.totals.combined)
            .then_with(|| a.name.cmp(&b.name))
    });

    println!(
        "{:<4} {:<20} {:>12} {:>12} {:>10} {:>10}",
        "#", "PLAYER", "COMBINED", "VIEWS", "LIKES", "COMMENTS"
    );
    println!("{}", "-".repeat(73));
    for (rank, score) in rows.into_iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>12} {:>12} {:>10} {:>10}",
            rank + 1,
            truncate(&score.name, 20),
            score.totals.combined,
            score.totals.views,
            score.totals.likes,
            score.totals.comments
        );
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["engagement-board"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_refresh_force() {
        let cli = Cli::try_parse_from(["engagement-board", "--config", "/etc/eb", "refresh", "--force"])
            .unwrap();
        assert_eq!(cli.config, "/etc/eb");
        assert_eq!(cli.command, Some(Commands::Refresh { force: true }));
    }

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("Kings", 10), "Kings");
        assert_eq!(truncate("Dimension 20 Crossover", 10), "Dimension…");
    }
}
