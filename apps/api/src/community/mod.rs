//! Community Q&A: questions, answers, votes and best-answer selection.

pub mod handlers;
pub mod repo;
pub mod scoring;
