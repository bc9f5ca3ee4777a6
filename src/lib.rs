pub mod aggregation;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod game_log;
pub mod game_store;
pub mod pipeline;
pub mod player_detail;
pub mod power_rank;
pub mod state;
pub mod table;
pub mod team_summary;
pub mod trend;

pub use error::{Result, StatsError};
