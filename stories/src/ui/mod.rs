//! UI module for the stories TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;
