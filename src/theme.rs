use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ThemeConfig;

/// Stylesheet written when no theme provides one.
pub const BUILTIN_STYLESHEET: &str = include_str!("../assets/style.css");

const MANIFEST_FILE: &str = "pagewright-theme.yaml";

/// Theme manifest loaded from pagewright-theme.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeManifest {
    /// Theme metadata
    #[serde(default)]
    pub name: Option<String>,

    /// Stylesheet relative to the theme directory
    #[serde(default)]
    pub stylesheet: Option<PathBuf>,

    /// Free-form settings, available as `theme.*` in templates
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl ThemeManifest {
    /// Load the manifest from a theme directory.
    /// Returns the default manifest if the file doesn't exist.
    pub fn load(theme_path: &Path) -> Result<Self, ThemeError> {
        let manifest_path = theme_path.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| ThemeError::Io(manifest_path.clone(), e))?;

        serde_yaml::from_str(&content).map_err(|e| ThemeError::Parse(manifest_path, e))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ThemeError {
    #[error("theme not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse theme manifest {0}: {1}")]
    Parse(PathBuf, serde_yaml::Error),
}

/// The resolved theme: an optional template directory plus the stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    path: Option<PathBuf>,
    stylesheet: Option<PathBuf>,
    pub manifest: ThemeManifest,
}

impl Theme {
    /// Resolve the theme configured in `pagewright.yaml`.
    ///
    /// `theme.stylesheet` wins over the manifest's stylesheet; without
    /// either the built-in stylesheet is used.
    pub fn resolve(config: &ThemeConfig, base_path: &Path) -> Result<Self, ThemeError> {
        let path = match &config.path {
            Some(path) => {
                let path = base_path.join(path);
                if !path.is_dir() {
                    return Err(ThemeError::NotFound(path));
                }
                Some(path)
            }
            None => None,
        };

        let manifest = match &path {
            Some(path) => ThemeManifest::load(path)?,
            None => ThemeManifest::default(),
        };

        let stylesheet = config
            .stylesheet
            .as_ref()
            .map(|s| base_path.join(s))
            .or_else(|| {
                let theme_path = path.as_ref()?;
                manifest.stylesheet.as_ref().map(|s| theme_path.join(s))
            });

        Ok(Self {
            path,
            stylesheet,
            manifest,
        })
    }

    /// Directory holding the theme's `**/*.html` templates, if it has one.
    pub fn templates_dir(&self) -> Option<PathBuf> {
        let dir = self.path.as_ref()?.join("templates");
        dir.is_dir().then_some(dir)
    }

    /// Files whose change should trigger a rebuild.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.path.iter().chain(self.stylesheet.iter()).cloned().collect()
    }

    /// Contents of the stylesheet to write as `style.css`.
    pub fn stylesheet(&self) -> Result<String, ThemeError> {
        match &self.stylesheet {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|e| ThemeError::Io(path.clone(), e))
            }
            None => Ok(BUILTIN_STYLESHEET.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_theme_uses_builtin_stylesheet() {
        let dir = TempDir::new().unwrap();
        let theme = Theme::resolve(&ThemeConfig::default(), dir.path()).unwrap();
        assert!(theme.path.is_none());
        assert!(theme.templates_dir().is_none());
        assert_eq!(theme.stylesheet().unwrap(), BUILTIN_STYLESHEET);
    }

    #[test]
    fn test_missing_theme_dir() {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig {
            path: Some("nope".into()),
            stylesheet: None,
        };
        assert!(matches!(
            Theme::resolve(&config, dir.path()),
            Err(ThemeError::NotFound(_))
        ));
    }

    #[test]
    fn test_manifest_stylesheet_and_settings() {
        let dir = TempDir::new().unwrap();
        let theme_dir = dir.path().join("theme");
        fs::create_dir_all(theme_dir.join("templates")).unwrap();
        fs::write(
            theme_dir.join(MANIFEST_FILE),
            "name: dusk\nstylesheet: dusk.css\nsettings:\n  accent: teal\n",
        )
        .unwrap();
        fs::write(theme_dir.join("dusk.css"), "body{}").unwrap();

        let config = ThemeConfig {
            path: Some("theme".into()),
            stylesheet: None,
        };
        let theme = Theme::resolve(&config, dir.path()).unwrap();
        assert_eq!(theme.manifest.name.as_deref(), Some("dusk"));
        assert_eq!(theme.manifest.settings["accent"], "teal");
        assert_eq!(theme.templates_dir(), Some(theme_dir.join("templates")));
        assert_eq!(theme.stylesheet().unwrap(), "body{}");
    }

    #[test]
    fn test_configured_stylesheet_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.css"), "main{}").unwrap();
        let config = ThemeConfig {
            path: None,
            stylesheet: Some("site.css".into()),
        };
        let theme = Theme::resolve(&config, dir.path()).unwrap();
        assert_eq!(theme.stylesheet().unwrap(), "main{}");
        assert_eq!(theme.watched_paths(), vec![dir.path().join("site.css")]);
    }

    #[test]
    fn test_missing_stylesheet_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig {
            path: None,
            stylesheet: Some("gone.css".into()),
        };
        let theme = Theme::resolve(&config, dir.path()).unwrap();
        assert!(matches!(theme.stylesheet(), Err(ThemeError::Io(..))));
    }
}
