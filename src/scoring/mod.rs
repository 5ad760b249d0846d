pub mod aggregate;
pub mod config;
pub mod engine;
pub mod validation;

pub use aggregate::{aggregate, aggregate_with, SessionSummary, TopStat, NONE_YET};
pub use config::Tariff;
pub use engine::{
    compute_round_score, compute_round_score_with, ScoreLine, ScoreResult, ScoringMode, Warning,
};
pub use validation::validate_tariff;
