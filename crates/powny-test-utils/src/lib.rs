//! Shared test fixtures for the powny workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git repository fixtures at three realism levels
//! - [`repo`]: [`RulesRepo`](repo::RulesRepo) builder for rule checkouts

pub mod git;
pub mod repo;
