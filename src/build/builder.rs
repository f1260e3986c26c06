use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::theme::{Theme, ThemeError};

use super::content::{ContentError, ContentSource, FileContentSource, PageQuery};
use super::controller::PageController;
use super::pipeline::{Pipeline, PipelineConfig, PipelineError};
use super::render::{PageInfo, PageShell, RenderError, ShellContext, ShellFlags};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("theme error: {0}")]
    Theme(#[from] ThemeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Whether the document existed and rendered without error
    pub rendered: bool,
}

/// Builds the page: queries the content source, hands the document to the
/// controller and writes the shell around the result.
pub struct Builder {
    config: Config,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    source: FileContentSource,
    pipeline: Arc<Pipeline>,
    theme: Theme,
    shell: PageShell,
    /// Replaces `site.output` when set
    output_dir: Option<PathBuf>,
    dev_mode: bool,
    live_reload: bool,
}

impl Builder {
    /// Compile everything the build needs: the pipeline, the theme and the
    /// templates. Fails fast on bad configuration.
    pub fn new(config: Config, base_path: PathBuf) -> Result<Self, BuildError> {
        let pipeline = Pipeline::new(PipelineConfig::from_config(&config))?;
        let theme = Theme::resolve(&config.theme, &base_path)?;
        let shell = PageShell::for_theme(&theme)?;
        let source = FileContentSource::from_config(&config, &base_path);

        Ok(Self {
            config,
            base_path,
            source,
            pipeline: Arc::new(pipeline),
            theme,
            shell,
            output_dir: None,
            dev_mode: false,
            live_reload: false,
        })
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_live_reload(mut self, live_reload: bool) -> Self {
        self.live_reload = live_reload;
        self
    }

    /// Write to `dir` whatever `site.output` says.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn document_path(&self) -> &Path {
        self.source.path()
    }

    /// Ask the content source for the current page.
    pub fn query(&self) -> Result<PageQuery, BuildError> {
        Ok(self.source.query()?)
    }

    /// One-shot build with a fresh controller.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let query = self.query()?;
        let mut controller = PageController::new();
        controller.render_now(query.document.as_ref(), &self.pipeline);
        self.write(&query, &controller)
    }

    /// Write the page for the controller's current result.
    pub fn write(
        &self,
        query: &PageQuery,
        controller: &PageController,
    ) -> Result<BuildResult, BuildError> {
        let html = self.render_page(query, controller)?;

        let output_dir = self.output_dir();
        std::fs::create_dir_all(&output_dir)?;
        std::fs::write(output_dir.join("index.html"), html)?;
        std::fs::write(output_dir.join("style.css"), self.theme.stylesheet()?)?;

        Ok(BuildResult {
            output_dir,
            rendered: controller.content().is_some(),
        })
    }

    /// Render the full HTML page without writing it.
    pub fn render_page(
        &self,
        query: &PageQuery,
        controller: &PageController,
    ) -> Result<String, BuildError> {
        let content = controller
            .content()
            .map(|tree| tree.to_html())
            .unwrap_or_default();
        let error = controller
            .error()
            .filter(|_| self.config.page.show_errors)
            .map(|e| e.to_string());

        let mut page = PageInfo::new(
            query.seo_title.clone(),
            query.description.clone(),
            self.config.page.location.clone(),
        );
        if let Some(document) = &query.document {
            page.extra = document.front_matter.extra.clone();
        }

        let context = ShellContext {
            site: query.site.clone(),
            page,
            content,
            error,
            theme: self.theme.manifest.settings.clone(),
            pagewright: ShellFlags::new(self.dev_mode, self.live_reload),
        };

        Ok(self.shell.render(&context)?)
    }

    /// Get the output directory path, resolved against base_path.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        let output = &self.config.site.output;
        if output.is_relative() {
            self.base_path.join(output)
        } else {
            output.clone()
        }
    }
}
