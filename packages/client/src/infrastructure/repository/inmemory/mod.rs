//! インメモリ Repository 実装

mod game_history;

pub use game_history::InMemoryGameHistoryRepository;
