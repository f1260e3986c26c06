use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera};

use crate::build::content::SiteMetadata;
use crate::theme::Theme;

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("page.html", include_str!("../../templates/page.html")),
    ("seo.html", include_str!("../../templates/seo.html")),
];

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// The page shell: layout, SEO tags and the rendered document, via Tera.
pub struct PageShell {
    tera: Tera,
}

impl PageShell {
    /// Shell using only the built-in templates.
    pub fn builtin() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES)?;
        Ok(Self { tera })
    }

    /// Shell using the theme's templates, falling back to the built-in ones
    /// for any template the theme does not define.
    pub fn for_theme(theme: &Theme) -> Result<Self, RenderError> {
        let Some(templates_path) = theme.templates_dir() else {
            return Self::builtin();
        };

        let glob = templates_path.join("**/*.html");
        let glob_str = glob.to_string_lossy();
        // Parse only: theme templates may extend built-in ones, which
        // are not loaded until `extend` builds the inheritance chains.
        let mut tera = Tera::parse(&glob_str)?;
        tera.extend(&Self::builtin()?.tera)?;

        Ok(Self { tera })
    }

    /// Render the page with the given context.
    pub fn render(&self, context: &ShellContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("page", &context.page);
        tera_context.insert("content", &context.content);
        tera_context.insert("error", &context.error);
        tera_context.insert("theme", &context.theme);
        tera_context.insert("pagewright", &context.pagewright);

        Ok(self.tera.render("page.html", &tera_context)?)
    }
}

/// Context passed to page templates.
#[derive(Debug, Serialize)]
pub struct ShellContext {
    pub site: SiteMetadata,
    pub page: PageInfo,
    /// HTML of the rendered document (empty when absent or failed)
    pub content: String,
    /// Error notice, only set when `page.show_errors` is on
    pub error: Option<String>,
    /// Theme settings, accessible as `theme.*` in templates
    pub theme: serde_json::Value,
    pub pagewright: ShellFlags,
}

/// Information about the page being shown.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    /// SEO title
    pub title: String,
    pub description: Option<String>,
    /// Location token: the URL path of the page
    pub location: String,
    /// Whether the location is the site root
    pub is_root: bool,
    /// Custom front matter fields
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl PageInfo {
    pub fn new(title: String, description: Option<String>, location: String) -> Self {
        let is_root = location == "/";
        Self {
            title,
            description,
            location,
            is_root,
            extra: HashMap::new(),
        }
    }
}

/// Build flags exposed to templates as `pagewright.*`.
#[derive(Debug, Clone, Serialize)]
pub struct ShellFlags {
    pub dev: bool,
    pub live_reload: bool,
    pub version: String,
}

impl ShellFlags {
    pub fn new(dev_mode: bool, live_reload: bool) -> Self {
        Self {
            dev: dev_mode,
            live_reload: dev_mode && live_reload,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use std::fs;
    use tempfile::TempDir;

    fn context(location: &str) -> ShellContext {
        ShellContext {
            site: SiteMetadata {
                title: "My Site".to_string(),
                description: None,
                author: Some("@me".to_string()),
                lang: "fr".to_string(),
                url: None,
            },
            page: PageInfo::new(
                "Hello".to_string(),
                Some("About <things>".to_string()),
                location.to_string(),
            ),
            content: "<p>Body</p>".to_string(),
            error: None,
            theme: serde_json::Value::Null,
            pagewright: ShellFlags::new(false, true),
        }
    }

    #[test]
    fn test_seo_tags() {
        let html = PageShell::builtin().unwrap().render(&context("/")).unwrap();
        assert!(html.contains("<html lang=\"fr\">"));
        assert!(html.contains("<title>Hello | My Site</title>"));
        assert!(html.contains("<meta name=\"description\" content=\"About &lt;things&gt;\">"));
        assert!(html.contains("<meta property=\"og:title\" content=\"Hello\">"));
        assert!(html.contains("<meta property=\"og:type\" content=\"website\">"));
        assert!(html.contains("<meta name=\"twitter:card\" content=\"summary\">"));
        assert!(html.contains("<meta name=\"twitter:creator\" content=\"@me\">"));
        assert!(html.contains("<meta name=\"twitter:description\""));
    }

    #[test]
    fn test_content_is_not_escaped() {
        let html = PageShell::builtin().unwrap().render(&context("/")).unwrap();
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn test_header_depends_on_location() {
        let shell = PageShell::builtin().unwrap();
        let root = shell.render(&context("/")).unwrap();
        assert!(root.contains("<h1 class=\"site-title\">My Site</h1>"));
        let nested = shell.render(&context("/guide/")).unwrap();
        assert!(!nested.contains("<h1 class=\"site-title\">"));
        assert!(nested.contains("<a class=\"site-title\" href=\"/\">My Site</a>"));
    }

    #[test]
    fn test_error_notice_and_live_reload() {
        let shell = PageShell::builtin().unwrap();
        let plain = shell.render(&context("/")).unwrap();
        assert!(!plain.contains("render-error"));
        assert!(!plain.contains("EventSource"));

        let mut ctx = context("/");
        ctx.error = Some("stage 'highlight' failed".to_string());
        ctx.pagewright = ShellFlags::new(true, true);
        let html = shell.render(&ctx).unwrap();
        assert!(html.contains("render-error"));
        assert!(html.contains("stage &#x27;highlight&#x27; failed"));
        assert!(html.contains("/_pagewright/live-reload"));
    }

    #[test]
    fn test_theme_overrides_single_template() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("theme/templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(
            templates.join("page.html"),
            "{% extends \"base.html\" %}{% block main %}<div class=\"custom\">{{ content | safe }}</div>{% endblock main %}",
        )
        .unwrap();

        let theme = Theme::resolve(
            &ThemeConfig {
                path: Some("theme".into()),
                stylesheet: None,
            },
            dir.path(),
        )
        .unwrap();
        let html = PageShell::for_theme(&theme)
            .unwrap()
            .render(&context("/"))
            .unwrap();
        assert!(html.contains("<div class=\"custom\"><p>Body</p></div>"));
        assert!(html.contains("<title>Hello | My Site</title>"));
    }
}
