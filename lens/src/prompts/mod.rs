//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files, one per analysis operation.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override from config)
//! 2. Embedded fallback compiled from `lens/prompts/`
//!
//! Templates use Handlebars syntax; the render context is the operation's
//! camelCase input record, so `{{{documentText}}}` is always available.

pub mod embedded;
mod loader;

pub use loader::PromptLoader;
