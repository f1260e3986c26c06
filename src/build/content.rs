//! Content source: the document and site metadata a page is built from.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Config, SiteConfig};
use crate::util::title_case;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("failed to read document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// =============================================================================
// Site metadata
// =============================================================================

/// Site-level metadata, handed to the page shell unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteMetadata {
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub lang: String,
    pub url: Option<String>,
}

impl From<&SiteConfig> for SiteMetadata {
    fn from(site: &SiteConfig) -> Self {
        Self {
            title: site.title.clone(),
            description: site.description.clone(),
            author: site.author.clone(),
            lang: site.lang.clone(),
            url: site.url.clone(),
        }
    }
}

// =============================================================================
// Documents
// =============================================================================

/// Content identity of a document: a hash of its markdown body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn of(body: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        body.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

const FRONT_MATTER_DELIMITER: &str = "---";

/// Front matter metadata parsed from the top of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Page title (overrides the filename-derived title)
    pub title: Option<String>,
    /// Page description for SEO tags
    pub description: Option<String>,
    /// Additional metadata (available in templates as `page.extra`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// A fetched document. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    /// Markdown body without front matter
    pub body: String,
    pub front_matter: FrontMatter,
}

impl Document {
    /// Split front matter off `raw` and compute the document id from the body.
    pub fn from_raw(raw: &str) -> Self {
        let (front_matter, body) = parse_front_matter(raw);
        Self {
            id: DocumentId::of(&body),
            body,
            front_matter,
        }
    }
}

/// Parse the YAML front matter block delimited by `---` lines.
///
/// Returns the front matter (empty if none) and the remaining markdown. Both
/// delimiters must be lines of their own, and the block must hold a YAML
/// mapping; anything else is markdown (a leading thematic break, say) and
/// comes back untouched.
pub fn parse_front_matter(content: &str) -> (FrontMatter, String) {
    let unchanged = || (FrontMatter::default(), content.to_string());

    let trimmed = content.trim_start();
    let Some((opening, after_opening)) = trimmed.split_once('\n') else {
        return unchanged();
    };
    if opening.trim_end() != FRONT_MATTER_DELIMITER {
        return unchanged();
    }

    let mut offset = 0;
    let mut closing = None;
    for line in after_opening.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            closing = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((yaml_end, body_start)) = closing else {
        return unchanged();
    };

    let yaml = &after_opening[..yaml_end];
    let body = after_opening[body_start..]
        .trim_start_matches(['\r', '\n'])
        .to_string();
    if yaml.trim().is_empty() {
        return (FrontMatter::default(), body);
    }

    let value = match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(value @ serde_yaml::Value::Mapping(_)) => value,
        Ok(_) => return unchanged(),
        Err(e) => {
            tracing::warn!(error = %e, "front matter is not valid YAML, keeping it as markdown");
            return unchanged();
        }
    };
    match serde_yaml::from_value(value) {
        Ok(front_matter) => (front_matter, body),
        Err(e) => {
            tracing::warn!(error = %e, "unexpected front matter fields, keeping it as markdown");
            unchanged()
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Result of querying a content source.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub site: SiteMetadata,
    /// `None` until the document exists
    pub document: Option<Document>,
    /// Title for the `<title>` and SEO tags
    pub seo_title: String,
    /// Page description, falling back to the site description
    pub description: Option<String>,
}

/// Supplies the document and site metadata for a page.
pub trait ContentSource {
    fn query(&self) -> Result<PageQuery, ContentError>;
}

/// Content source reading a markdown file from disk.
#[derive(Debug, Clone)]
pub struct FileContentSource {
    site: SiteMetadata,
    path: PathBuf,
    title: Option<String>,
}

impl FileContentSource {
    pub fn new(site: SiteMetadata, path: PathBuf, title: Option<String>) -> Self {
        Self { site, path, title }
    }

    /// Build the source for the page described by `config`.
    pub fn from_config(config: &Config, base_path: &Path) -> Self {
        Self::new(
            SiteMetadata::from(&config.site),
            config.page.resolve_source(base_path),
            config.page.title.clone(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Title cased file stem, the last resort for the SEO title.
    fn stem_title(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(title_case)
            .unwrap_or_else(|| "Untitled".to_string())
    }
}

impl ContentSource for FileContentSource {
    fn query(&self) -> Result<PageQuery, ContentError> {
        let document = match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(Document::from_raw(&raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "document not found, page stays empty");
                None
            }
            Err(e) => {
                return Err(ContentError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let front_matter = document.as_ref().map(|doc| &doc.front_matter);
        let seo_title = self
            .title
            .clone()
            .or_else(|| front_matter.and_then(|fm| fm.title.clone()))
            .unwrap_or_else(|| self.stem_title());
        let description = front_matter
            .and_then(|fm| fm.description.clone())
            .or_else(|| self.site.description.clone());

        Ok(PageQuery {
            site: self.site.clone(),
            document,
            seo_title,
            description,
        })
    }
}
