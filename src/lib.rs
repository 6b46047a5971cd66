//! kokcall - emergency room finder
//!
//! The interactive state machines behind a terminal client for finding an
//! available emergency room: draggable bottom sheets, hospital selection,
//! and the onboarding wizard that collects a health profile first.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
