//! Core library for a textbook study group's progress dashboard.
//!
//! - `detector`: maps notebook filenames to curriculum chapters
//! - `aggregator`: lists member repositories and builds the cached
//!   submission matrix
//! - `scoring` / `report`: derived scores, rankings, badges and views
//! - `board`: quizzes, papers and projects over a pluggable store
//!
//! I/O lives behind the `RepoLister` and `BoardStore` traits; the GitHub,
//! Supabase and local JSON implementations are provided here as well.

pub mod aggregator;
pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod detector;
pub mod models;
pub mod report;
pub mod scoring;
pub mod store;

pub use aggregator::{Aggregator, RepoFile, RepoLister};
pub use board::{Board, BoardError, BoardStore};
pub use config::StudyConfig;
pub use store::JsonFileStore;
