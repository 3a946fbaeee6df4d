//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (`prompts.dir` in config)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates in `user_dir`
    ///
    /// A directory that does not exist is ignored.
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        debug!(?user_dir, "PromptLoader::new: called");
        let user_dir = user_dir.filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                debug!(?dir, "PromptLoader::new: override directory missing, ignoring");
            }
            exists
        });

        Self {
            hbs: Self::engine(),
            user_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    /// Strict mode turns a template referencing an absent field into a render error.
    /// Document text is plain text, so HTML escaping is disabled.
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{user_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in user override");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_embedded_substitutes_without_escaping() {
        let loader = PromptLoader::embedded_only();
        let context = json!({
            "documentText": "Tenant pays <b>$500</b> & fees",
            "question": "Is rent \"due\" monthly?"
        });

        let rendered = loader.render("answer-question", &context).unwrap();
        assert!(rendered.contains("Tenant pays <b>$500</b> & fees"));
        assert!(rendered.contains("Is rent \"due\" monthly?"));
    }

    #[test]
    fn test_render_missing_field_fails() {
        let loader = PromptLoader::embedded_only();
        let context = json!({ "documentText": "text" });
        assert!(loader.render("explain-clause", &context).is_err());
    }

    #[test]
    fn test_unknown_template_fails() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }

    #[test]
    fn test_user_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summarize.pmt"), "Custom: {{{documentText}}}").unwrap();

        let loader = PromptLoader::new(Some(dir.path().to_path_buf()));
        let rendered = loader.render("summarize", &json!({ "documentText": "lease" })).unwrap();
        assert_eq!(rendered, "Custom: lease");

        // Templates not overridden still come from the embedded set
        let rendered = loader.render("detect-risks", &json!({ "documentText": "lease" })).unwrap();
        assert!(rendered.contains("lease"));
    }

    #[test]
    fn test_missing_override_dir_ignored() {
        let loader = PromptLoader::new(Some(PathBuf::from("/nonexistent/legallens/prompts")));
        assert!(loader.user_dir.is_none());
        assert!(loader.render("summarize", &json!({ "documentText": "x" })).is_ok());
    }
}
