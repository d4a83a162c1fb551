pub mod dictionary;
pub mod round_gen;
pub mod rounds;
pub mod scoring;

// Re-export main components
pub use dictionary::*;
pub use round_gen::*;
pub use rounds::*;
pub use scoring::*;
