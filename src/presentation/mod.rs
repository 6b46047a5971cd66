//! Presentation layer handling terminal UI and user input.
//!
//! Renders the screens with ratatui and routes crossterm key and mouse
//! events into the application state.

pub mod ui;
pub mod input;

pub use ui::*;
pub use input::*;
