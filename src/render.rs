use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::marker::{self, CommentIdentity};

/// Variables every template receives in addition to the caller-supplied ones.
pub const INPUT_LINES_VAR: &str = "input_lines";
pub const IS_APPEND_VAR: &str = "is_append";

/// A comment template loaded from disk.
///
/// The reference it was loaded from doubles as the template half of the
/// comment marker, so it must not contain whitespace.
#[derive(Debug, Clone)]
pub struct Template {
    reference: String,
    source: String,
}

impl Template {
    pub fn load(path: &Path) -> Result<Self> {
        let reference = path.to_string_lossy().to_string();
        if reference.is_empty() || reference.chars().any(char::is_whitespace) {
            return Err(Error::ConfigValidation(format!(
                "template path must be non-empty and contain no whitespace: {reference:?}"
            )));
        }
        let source = std::fs::read_to_string(path).map_err(|e| Error::TemplateNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_source(reference, source)
    }

    /// Build a template from an in-memory source, checking its syntax up front.
    pub fn from_source(reference: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let template = Self {
            reference: reference.into(),
            source: source.into(),
        };
        let engine = upon::Engine::new();
        engine
            .compile(template.source.as_str())
            .map_err(|e| Error::TemplateRender(format!("{}: {e}", template.reference)))?;
        Ok(template)
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Turns input lines into a finished comment body.
pub struct Renderer {
    vars: BTreeMap<String, String>,
}

impl Renderer {
    /// `vars` is the explicit variable mapping handed to every template,
    /// usually the process environment captured once at startup.
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Render `lines` into a comment body.
    ///
    /// Without a template the lines are joined by newlines and no marker is
    /// added. With a template, a fresh comment (`is_append == false`) is
    /// prefixed with the marker line for `(template, build)`; an append
    /// fragment is not, since the comment it extends already carries one.
    pub fn render(
        &self,
        lines: &[String],
        template: Option<&Template>,
        build: &str,
        is_append: bool,
    ) -> Result<String> {
        let Some(template) = template else {
            let comment = lines.join("\n");
            debug!(comment = %comment, "rendered unmanaged comment");
            return Ok(comment);
        };

        let body = self.render_template(template, lines, is_append)?;
        let comment = if is_append {
            body
        } else {
            let identity = CommentIdentity::new(template.reference(), build);
            format!("{}\n{body}", marker::encode(&identity))
        };
        debug!(comment = %comment, is_append, "rendered comment");
        Ok(comment)
    }

    fn render_template(&self, template: &Template, lines: &[String], is_append: bool) -> Result<String> {
        let mut ctx: BTreeMap<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        ctx.insert(
            INPUT_LINES_VAR.to_string(),
            Value::Array(lines.iter().cloned().map(Value::String).collect()),
        );
        ctx.insert(IS_APPEND_VAR.to_string(), Value::Bool(is_append));

        let render_err = |e: upon::Error| Error::TemplateRender(format!("{}: {e}", template.reference));
        let engine = upon::Engine::new();
        let compiled = engine.compile(template.source.as_str()).map_err(render_err)?;
        let rendered = compiled.render(&engine, &ctx).to_string().map_err(render_err)?;
        Ok(rendered)
    }
}
