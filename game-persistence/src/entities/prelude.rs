pub use super::game_results::Entity as GameResults;
