//! Page controller: owns the latest render result for the page.
//!
//! The controller decides when the pipeline runs. Each distinct document
//! triggers exactly one [`RenderJob`], tagged with the document's id. Jobs may
//! run anywhere; their outcomes come back through [`PageController::complete`],
//! which drops outcomes produced for a document that is no longer current.

use crate::build::content::{Document, DocumentId};
use crate::build::pipeline::{Pipeline, PipelineError, UiTree};

/// A pending pipeline run for one document.
#[derive(Debug, Clone)]
pub struct RenderJob {
    id: DocumentId,
    body: String,
}

impl RenderJob {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Run the pipeline. Safe to call off the controller's thread.
    pub fn run(self, pipeline: &Pipeline) -> RenderOutcome {
        RenderOutcome {
            id: self.id,
            result: pipeline.render(&self.body),
        }
    }
}

/// The result of a [`RenderJob`], tagged with the document it was made for.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub id: DocumentId,
    pub result: Result<UiTree, PipelineError>,
}

/// What [`PageController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The outcome replaced the live result
    Applied,
    /// The outcome belonged to an older document and was dropped
    Stale,
}

#[derive(Debug, Default)]
pub struct PageController {
    current: Option<DocumentId>,
    result: Option<RenderOutcome>,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note the document currently supplied by the content source.
    ///
    /// Returns a job when the document is present and differs from the last
    /// one observed. An absent document changes nothing.
    pub fn observe(&mut self, document: Option<&Document>) -> Option<RenderJob> {
        let document = document?;
        if self.current == Some(document.id) {
            return None;
        }
        tracing::debug!(document = %document.id, "document changed, scheduling render");
        self.current = Some(document.id);
        Some(RenderJob {
            id: document.id,
            body: document.body.clone(),
        })
    }

    /// Offer a finished run to the controller.
    pub fn complete(&mut self, outcome: RenderOutcome) -> Completion {
        if self.current != Some(outcome.id) {
            tracing::debug!(document = %outcome.id, "discarding stale render result");
            return Completion::Stale;
        }
        if let Err(e) = &outcome.result {
            tracing::error!(document = %outcome.id, error = %e, "failed to render document");
        }
        self.result = Some(outcome);
        Completion::Applied
    }

    /// Observe, run and complete in one step.
    pub fn render_now(
        &mut self,
        document: Option<&Document>,
        pipeline: &Pipeline,
    ) -> Option<Completion> {
        let job = self.observe(document)?;
        Some(self.complete(job.run(pipeline)))
    }

    /// The live UI tree, if the last applied run succeeded.
    pub fn content(&self) -> Option<&UiTree> {
        self.result.as_ref()?.result.as_ref().ok()
    }

    /// The error of the last applied run, if it failed.
    pub fn error(&self) -> Option<&PipelineError> {
        self.result.as_ref()?.result.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::PipelineConfig;
    use crate::config::HighlightConfig;

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_empty() {
        let controller = PageController::new();
        assert!(controller.content().is_none());
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_absent_document_never_triggers() {
        let mut controller = PageController::new();
        assert!(controller.observe(None).is_none());
        assert!(controller.render_now(None, &pipeline()).is_none());
        assert!(controller.content().is_none());
    }

    #[test]
    fn test_one_job_per_distinct_document() {
        let mut controller = PageController::new();
        let doc = Document::from_raw("# One\n");
        assert!(controller.observe(Some(&doc)).is_some());
        assert!(controller.observe(Some(&doc)).is_none());
        let other = Document::from_raw("# Two\n");
        assert!(controller.observe(Some(&other)).is_some());
    }

    #[test]
    fn test_absence_keeps_previous_result() {
        let pipeline = pipeline();
        let mut controller = PageController::new();
        let doc = Document::from_raw("# Kept\n");
        controller.render_now(Some(&doc), &pipeline);
        controller.observe(None);
        assert!(controller.content().is_some());
    }

    #[test]
    fn test_render_now_applies() {
        let mut controller = PageController::new();
        let doc = Document::from_raw("Hello.\n");
        assert_eq!(
            controller.render_now(Some(&doc), &pipeline()),
            Some(Completion::Applied)
        );
        assert_eq!(controller.content().unwrap().to_html(), "<p>Hello.</p>");
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let pipeline = pipeline();
        let mut controller = PageController::new();

        let first = Document::from_raw("First.\n");
        let second = Document::from_raw("Second.\n");
        let first_job = controller.observe(Some(&first)).unwrap();
        let second_job = controller.observe(Some(&second)).unwrap();

        // The newer run finishes first, then the older one arrives late.
        assert_eq!(controller.complete(second_job.run(&pipeline)), Completion::Applied);
        assert_eq!(controller.complete(first_job.run(&pipeline)), Completion::Stale);
        assert_eq!(controller.content().unwrap().to_html(), "<p>Second.</p>");
    }

    #[test]
    fn test_failure_is_stored() {
        let pipeline = Pipeline::new(PipelineConfig {
            highlight: HighlightConfig {
                ignore_missing: false,
            },
            ..Default::default()
        })
        .unwrap();
        let mut controller = PageController::new();
        let doc = Document::from_raw("```nosuchlang\nx\n```\n");

        assert_eq!(
            controller.render_now(Some(&doc), &pipeline),
            Some(Completion::Applied)
        );
        assert!(controller.content().is_none());
        assert!(matches!(
            controller.error(),
            Some(PipelineError::Stage { stage, .. }) if stage == "highlight"
        ));
    }
}
