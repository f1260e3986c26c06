//! Pipeline stages, in execution order.
//!
//! 1. **ParseStage** - markdown text to a document tree
//! 2. **SlugStage** - heading ids
//! 3. **TocStage** - table of contents injection
//! 4. **MarkupStage** - document tree to markup tree
//! 5. **HighlightStage** - code block token spans
//! 6. **MaterializeStage** - markup tree to UI nodes

mod highlight;
mod markup;
mod materialize;
mod parse;
mod slug;
mod toc;

pub use highlight::HighlightStage;
pub use markup::MarkupStage;
pub use materialize::MaterializeStage;
pub use parse::ParseStage;
pub use slug::SlugStage;
pub use toc::TocStage;
