pub mod handlers;
pub mod matching;
pub mod schedule;
