//! Report assembly: classify, plan, render, paginate, write, clean up.

use crate::classify::classify;
use crate::config::ReportConfig;
use crate::data::Dataset;
use crate::error::{RenderError, ReportError};
use crate::pdf::{self, DocumentSummary};
use crate::plan::{plan_auto, plan_single, PlanOptions, PlotKind, PlotPlan, PlotRequest, PlotSelection};
use crate::render::{Artifact, ChartRenderer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A request that could not be rendered.
#[derive(Debug)]
pub struct RenderFailure {
    pub request: PlotRequest,
    pub error: RenderError,
}

/// Artifacts and failures of one rendering pass, both in plan order.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<RenderFailure>,
}

impl RenderOutcome {
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        self.artifacts.iter().map(|a| a.path.clone()).collect()
    }
}

#[derive(Debug)]
pub struct ReportSummary {
    pub document: DocumentSummary,
    pub failures: Vec<RenderFailure>,
    /// Artifact files that were kept on disk
    pub kept_artifacts: Vec<PathBuf>,
}

/// Removes artifact files when dropped.
struct ArtifactCleanup {
    paths: Vec<PathBuf>,
}

impl Drop for ArtifactCleanup {
    fn drop(&mut self) {
        for path in &self.paths {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed artifact"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
            }
        }
    }
}

pub struct ReportAssembler<R> {
    renderer: R,
    config: ReportConfig,
}

impl<R: ChartRenderer> ReportAssembler<R> {
    pub fn new(renderer: R, config: ReportConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Render every chart the auto-generation policy plans for `dataset`.
    pub fn generate_plots(&self, dataset: &Dataset) -> Result<RenderOutcome, ReportError> {
        let options = PlanOptions {
            max_scatter_pairs: self.config.max_scatter_pairs,
        };
        let plan = plan_auto(&classify(dataset.schema()), &options);
        self.render_plan(&plan, dataset)
    }

    /// Render one explicitly selected chart.
    pub fn generate_single(
        &self,
        dataset: &Dataset,
        selection: &PlotSelection,
    ) -> Result<RenderOutcome, ReportError> {
        let plan = plan_single(dataset.schema(), selection)?;
        self.render_plan(&plan, dataset)
    }

    /// Render `plan` in order. A failed request is recorded and the rest still render.
    pub fn render_plan(
        &self,
        plan: &PlotPlan,
        dataset: &Dataset,
    ) -> Result<RenderOutcome, ReportError> {
        let out_dir = self.config.output_dir.as_path();
        fs::create_dir_all(out_dir).map_err(|source| ReportError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut outcome = RenderOutcome::default();
        for request in plan {
            self.check_cardinality(request, dataset);
            match self.renderer.render(request, dataset, out_dir) {
                Ok(artifact) => outcome.artifacts.push(artifact),
                Err(error) => {
                    warn!(artifact = %request.artifact_name, error = %error, "render failed");
                    outcome.failures.push(RenderFailure {
                        request: request.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            rendered = outcome.artifacts.len(),
            failed = outcome.failures.len(),
            "rendered plan"
        );
        Ok(outcome)
    }

    fn check_cardinality(&self, request: &PlotRequest, dataset: &Dataset) {
        if request.kind != PlotKind::PieChart {
            return;
        }
        for column in &request.columns {
            if let Some(distinct) = dataset.distinct_count(&column.name) {
                if distinct > self.config.pie_cardinality_warning {
                    warn!(
                        column = %column.name,
                        distinct,
                        threshold = self.config.pie_cardinality_warning,
                        "pie chart has many slices"
                    );
                }
            }
        }
    }

    /// Build the full PDF report at `output`.
    ///
    /// Rendered artifacts are removed afterwards when `delete_artifacts` is set,
    /// whether or not the document was written.
    pub fn assemble(&self, dataset: &Dataset, output: &Path) -> Result<ReportSummary, ReportError> {
        let outcome = self.generate_plots(dataset)?;
        let paths = outcome.artifact_paths();

        let cleanup = self.config.delete_artifacts.then(|| ArtifactCleanup {
            paths: paths.clone(),
        });

        let document = pdf::write_document(
            &paths,
            &self.config.page,
            &self.config.title,
            self.config.artifact_read_policy,
            output,
        )?;
        drop(cleanup);

        let kept_artifacts = if self.config.delete_artifacts {
            Vec::new()
        } else {
            paths
        };

        Ok(ReportSummary {
            document,
            failures: outcome.failures,
            kept_artifacts,
        })
    }
}
