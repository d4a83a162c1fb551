pub mod connection;
pub mod entities;
pub mod repositories;

pub use repositories::game_result_repository::{FinalResult, GameResultRepository};
