//! TUI widgets for the stories client

pub mod input;
pub mod progress;
pub mod story_card;
pub mod tray;

pub use input::InputWidget;
pub use progress::ProgressBarWidget;
pub use story_card::StoryCardWidget;
pub use tray::tray_list;
