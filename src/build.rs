mod builder;
mod content;
mod controller;
mod highlight;
pub mod pipeline;
mod render;
mod watch;

pub use builder::Builder;
pub use content::PageQuery;
pub use controller::{Completion, PageController, RenderOutcome};
pub use watch::{FileWatcher, WatchEvent, WatchPaths};
