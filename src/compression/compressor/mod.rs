pub mod sliding_window;
pub mod summary;

pub use sliding_window::SlidingWindowCompressor;
pub use summary::{DefaultSummaryPrompt, FnSummaryPrompt, SummaryPromptBuilder, render_transcript};
