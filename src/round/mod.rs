pub mod edit;
pub mod types;

pub use edit::RoundEdit;
pub use types::{Place, Player, PlayerId, Ranking, Round, Transfer};
