pub mod game_result_repository;

pub use game_result_repository::GameResultRepository;
