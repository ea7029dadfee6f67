pub mod commands;
pub mod context;
pub mod ui;

pub use context::CommandContext;
pub use ui::Output;
