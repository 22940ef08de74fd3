//! Email template rendering with Handlebars
//!
//! Templates are HTML Handlebars files with an optional YAML frontmatter
//! carrying the subject:
//!
//! ```text
//! ---
//! subject: Happy Birthday
//! ---
//! <p>{{student_name}}</p>
//! ```
//!
//! Built-in templates are compiled into the binary. A template directory may
//! override any of them with a `<name>.html.hbs` file.

use handlebars::Handlebars;
use serde::Deserialize;

use crate::prelude::*;

pub const BIRTHDAY_TEMPLATE: &str = "birthday";

const BUILTIN_TEMPLATES: &[(&str, &str)] =
	&[(BIRTHDAY_TEMPLATE, include_str!("../templates/birthday.html.hbs"))];

/// Metadata extracted from template frontmatter
#[derive(Debug, Default, Deserialize)]
pub struct TemplateMetadata {
	#[serde(default)]
	pub subject: Option<String>,
}

/// Result of template rendering
#[derive(Debug)]
pub struct RenderResult {
	/// Subject rendered from the frontmatter, if the template defines one
	pub subject: Option<String>,
	pub html_body: String,
}

/// Template engine for email rendering
pub struct TemplateEngine {
	handlebars: Handlebars<'static>,
	template_dir: Option<Box<str>>,
}

impl std::fmt::Debug for TemplateEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TemplateEngine").field("template_dir", &self.template_dir).finish()
	}
}

impl TemplateEngine {
	pub fn new(template_dir: Option<Box<str>>) -> Self {
		let mut handlebars = Handlebars::new();

		// Enable strict mode to catch undefined variables
		handlebars.set_strict_mode(true);

		Self { handlebars, template_dir }
	}

	/// Parse YAML frontmatter from template content
	///
	/// Returns (metadata, content_without_frontmatter)
	fn parse_frontmatter(content: &str) -> (TemplateMetadata, &str) {
		let content = content.trim_start();

		if !content.starts_with("---") {
			return (TemplateMetadata::default(), content);
		}

		let after_first = &content[3..];
		if let Some(end_pos) = after_first.find("\n---") {
			let yaml_content = &after_first[..end_pos];
			let template_content = &after_first[end_pos + 4..]; // Skip "\n---"

			match serde_yaml::from_str(yaml_content) {
				Ok(metadata) => (metadata, template_content.trim_start_matches(['\r', '\n'])),
				Err(e) => {
					warn!("Failed to parse frontmatter YAML: {}", e);
					(TemplateMetadata::default(), content)
				}
			}
		} else {
			// No closing delimiter found
			(TemplateMetadata::default(), content)
		}
	}

	/// Loads a template: the override directory first, then the built-in set
	async fn load_template(&self, template_name: &str) -> SfResult<String> {
		if let Some(template_dir) = &self.template_dir {
			let path = format!("{}/{}.html.hbs", template_dir, template_name);
			match tokio::fs::read_to_string(&path).await {
				Ok(content) => {
					debug!("Loaded template override: {}", path);
					return Ok(content);
				}
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
				Err(e) => warn!("Failed to read template override {}: {}", path, e),
			}
		}

		BUILTIN_TEMPLATES
			.iter()
			.find(|(name, _)| *name == template_name)
			.map(|(_, content)| (*content).to_string())
			.ok_or_else(|| Error::ConfigError(format!("Template not found: {}", template_name)))
	}

	/// Render a template with the given variables
	pub async fn render(
		&self,
		template_name: &str,
		vars: &serde_json::Value,
	) -> SfResult<RenderResult> {
		let content = self.load_template(template_name).await?;
		let (metadata, template) = Self::parse_frontmatter(&content);

		let subject = match metadata.subject {
			Some(subject) => Some(self.handlebars.render_template(&subject, vars).map_err(|e| {
				Error::ValidationError(format!("Failed to render email subject: {}", e))
			})?),
			None => None,
		};

		let html_body = self.handlebars.render_template(template, vars).map_err(|e| {
			Error::ValidationError(format!("Failed to render template '{}': {}", template_name, e))
		})?;

		Ok(RenderResult { subject, html_body })
	}
}


// vim: ts=4
