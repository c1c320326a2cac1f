//! # djutils-mail
//!
//! Renders the bodies of an email from a template pair.
//!
//! A message named `account_recover` under `accounts/user` is two templates,
//! `accounts/user/account_recover.txt` and `accounts/user/account_recover.html`,
//! rendered with the same context by [`render_messages`]. Templates use the
//! [Tera](https://keats.github.io/tera/) syntax; `.html` templates are
//! auto-escaped, `.txt` templates are not.
//!
//! ```
//! use djutils_mail::{render_messages, MessageRenderer};
//!
//! let renderer = MessageRenderer::from_templates([
//!     ("accounts/welcome.txt", "Hi {{ name }}"),
//!     ("accounts/welcome.html", "<p>Hi {{ name }}</p>"),
//! ])
//! .unwrap();
//!
//! let mut context = djutils_mail::Context::new();
//! context.insert("name", "Ada");
//! let (text, html) = render_messages(&renderer, "accounts", "welcome", &context).unwrap();
//! assert_eq!(text, "Hi Ada");
//! assert_eq!(html, "<p>Hi Ada</p>");
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use djutils_core::{Settings, UtilsError};

pub use tera::Context;

/// Errors raised while loading or rendering message templates.
#[derive(Error, Debug)]
pub enum MailError {
    /// A template directory does not exist.
    #[error("Template directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),

    /// No template with this name is loaded.
    #[error("Template '{0}' does not exist")]
    TemplateNotFound(String),

    /// Templates failed to load or parse.
    #[error("Failed to load templates: {0}")]
    Load(#[source] tera::Error),

    /// A template failed to render.
    #[error("Failed to render template '{name}': {source}")]
    Render {
        /// The template being rendered.
        name: String,
        /// The underlying error.
        #[source]
        source: tera::Error,
    },

    /// The context could not be converted to a template context.
    #[error("Invalid template context: {0}")]
    Context(#[source] tera::Error),
}

impl From<MailError> for UtilsError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::MissingDirectory(_) => Self::ImproperlyConfigured(err.to_string()),
            _ => Self::InternalServerError(err.to_string()),
        }
    }
}

/// Loaded message templates.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    tera: tera::Tera,
}

impl MessageRenderer {
    /// Loads every template under `dir`. Names are paths relative to `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MailError> {
        Self::from_dirs([dir])
    }

    /// Loads templates from several directories.
    ///
    /// When two directories hold the same name, the earlier directory wins.
    pub fn from_dirs<I, P>(dirs: I) -> Result<Self, MailError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut tera = tera::Tera::default();
        for dir in dirs {
            let loaded = load_dir(dir.as_ref())?;
            tera.extend(&loaded).map_err(MailError::Load)?;
        }
        tracing::debug!(templates = tera.get_template_names().count(), "loaded message templates");
        Ok(Self { tera })
    }

    /// Loads templates from `settings.template_dirs`.
    pub fn from_settings(settings: &Settings) -> Result<Self, MailError> {
        Self::from_dirs(&settings.template_dirs)
    }

    /// Builds a renderer from `(name, source)` pairs.
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self, MailError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut tera = tera::Tera::default();
        tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())
            .map_err(MailError::Load)?;
        Ok(Self { tera })
    }

    /// Returns `true` if a template called `name` is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Renders one template.
    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, MailError> {
        if !self.has_template(name) {
            return Err(MailError::TemplateNotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|source| MailError::Render {
                name: name.to_string(),
                source,
            })
    }
}

fn load_dir(dir: &Path) -> Result<tera::Tera, MailError> {
    if !dir.is_dir() {
        return Err(MailError::MissingDirectory(dir.to_path_buf()));
    }
    let glob = format!("{}/**/*", dir.display());
    tera::Tera::new(&glob).map_err(MailError::Load)
}

/// Returns the name of a message template: `<rpath>/<filename>.<extension>`.
fn template_name(rpath: &str, filename: &str, extension: &str) -> String {
    let rpath = rpath.trim_end_matches('/');
    if rpath.is_empty() {
        format!("{filename}.{extension}")
    } else {
        format!("{rpath}/{filename}.{extension}")
    }
}

/// Renders the text and HTML bodies of a message.
///
/// `rpath` is the directory of the template pair relative to the template
/// root, and `filename` the template name without extension. Returns
/// `(text, html)`.
pub fn render_messages(
    renderer: &MessageRenderer,
    rpath: &str,
    filename: &str,
    context: &tera::Context,
) -> Result<(String, String), MailError> {
    let text = renderer.render(&template_name(rpath, filename, "txt"), context)?;
    let html = renderer.render(&template_name(rpath, filename, "html"), context)?;
    Ok((text, html))
}

/// Like [`render_messages`], with any serializable map as the context.
pub fn render_messages_with<C: serde::Serialize>(
    renderer: &MessageRenderer,
    rpath: &str,
    filename: &str,
    context: &C,
) -> Result<(String, String), MailError> {
    let context = tera::Context::from_serialize(context).map_err(MailError::Context)?;
    render_messages(renderer, rpath, filename, &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MessageRenderer {
        MessageRenderer::from_templates([
            ("accounts/user/account_recover.txt", "Reset: {{ link }}"),
            ("accounts/user/account_recover.html", "<a href=\"{{ link }}\">{{ name }}</a>"),
            ("plain.txt", "plain"),
            ("plain.html", "<b>plain</b>"),
        ])
        .unwrap()
    }

    #[test]
    fn test_template_name() {
        assert_eq!(template_name("a/b", "c", "txt"), "a/b/c.txt");
        assert_eq!(template_name("a/b/", "c", "html"), "a/b/c.html");
        assert_eq!(template_name("", "c", "txt"), "c.txt");
    }

    #[test]
    fn test_html_is_escaped_text_is_not() {
        let mut context = tera::Context::new();
        context.insert("link", "https://x.test/?a=1&b=2");
        context.insert("name", "<Ada>");
        let (text, html) =
            render_messages(&renderer(), "accounts/user", "account_recover", &context).unwrap();
        assert_eq!(text, "Reset: https://x.test/?a=1&b=2");
        assert!(html.contains("&lt;Ada&gt;"));
        assert!(html.contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_empty_context_and_rpath() {
        let (text, html) = render_messages(&renderer(), "", "plain", &tera::Context::new()).unwrap();
        assert_eq!((text.as_str(), html.as_str()), ("plain", "<b>plain</b>"));
    }

    #[test]
    fn test_missing_html_half() {
        let renderer = MessageRenderer::from_templates([("only.txt", "x")]).unwrap();
        let err = render_messages(&renderer, "", "only", &tera::Context::new()).unwrap_err();
        assert!(matches!(err, MailError::TemplateNotFound(ref name) if name == "only.html"));
    }

    #[test]
    fn test_serializable_context() {
        let context = serde_json::json!({"link": "L", "name": "N"});
        let (text, _) =
            render_messages_with(&renderer(), "accounts/user", "account_recover", &context)
                .unwrap();
        assert_eq!(text, "Reset: L");
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let err = render_messages(&renderer(), "accounts/user", "account_recover", &tera::Context::new())
            .unwrap_err();
        assert!(matches!(err, MailError::Render { .. }));
        let utils: UtilsError = err.into();
        assert_eq!(utils.status_code(), 500);
    }

    #[test]
    fn test_missing_directory() {
        let err = MessageRenderer::from_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, MailError::MissingDirectory(_)));
        assert_eq!(UtilsError::from(err).status_code(), 500);
    }
}
