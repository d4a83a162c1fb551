pub mod game_results;
pub mod prelude;
