//! Plot planning: the auto-generation policy and single-request mode.
//!
//! A [`PlotPlan`] is an ordered list of [`PlotRequest`]s. The order is
//! significant: it is the order in which charts are rendered and, later, the
//! order in which they are laid out in the document.
//!
//! Scatter generation is quadratic in the number of numerical columns
//! (`k * (k - 1) / 2` requests). This is unbounded by default; see
//! [`PlanOptions::max_scatter_pairs`].

use crate::classify::{classify, Classification, ColumnDescriptor, ColumnKind};
use crate::data::Schema;
use crate::error::PlanError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// The chart types the planner can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotKind {
    Histogram,
    Scatter,
    Pairplot,
    CorrelationHeatmap,
    PieChart,
}

impl PlotKind {
    pub const ALL: [PlotKind; 5] = [
        PlotKind::Histogram,
        PlotKind::Scatter,
        PlotKind::Pairplot,
        PlotKind::CorrelationHeatmap,
        PlotKind::PieChart,
    ];

    /// Prefix used in artifact names.
    pub fn slug(self) -> &'static str {
        match self {
            PlotKind::Histogram => "histogram",
            PlotKind::Scatter => "scatter",
            PlotKind::Pairplot => "pairplot",
            PlotKind::CorrelationHeatmap => "correlation_heatmap",
            PlotKind::PieChart => "pie_chart",
        }
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Histogram => "Histogram",
            PlotKind::Scatter => "Scatter Plot",
            PlotKind::Pairplot => "Pairplot",
            PlotKind::CorrelationHeatmap => "Correlation Heatmap",
            PlotKind::PieChart => "Pie Chart",
        }
    }

    /// Number of columns an explicit selection of this kind must name.
    /// `None` means "all numerical columns, or any explicit list".
    pub fn arity(self) -> Option<usize> {
        match self {
            PlotKind::Histogram | PlotKind::PieChart => Some(1),
            PlotKind::Scatter => Some(2),
            PlotKind::Pairplot | PlotKind::CorrelationHeatmap => None,
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PlotKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "histogram" | "hist" => Ok(PlotKind::Histogram),
            "scatter" | "scatter_plot" => Ok(PlotKind::Scatter),
            "pairplot" | "pair_plot" => Ok(PlotKind::Pairplot),
            "correlation_heatmap" | "heatmap" | "correlation" => Ok(PlotKind::CorrelationHeatmap),
            "pie_chart" | "pie" => Ok(PlotKind::PieChart),
            other => Err(PlanError::InvalidSelection(format!(
                "unknown plot kind '{}'",
                other
            ))),
        }
    }
}

/// One rendering instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRequest {
    pub kind: PlotKind,
    pub columns: Vec<ColumnDescriptor>,
    pub artifact_name: String,
}

impl PlotRequest {
    /// The canonical artifact name for a request of `kind` over `columns`.
    pub fn canonical_name(kind: PlotKind, columns: &[ColumnDescriptor]) -> String {
        let raw = match kind {
            PlotKind::Histogram | PlotKind::PieChart => {
                format!("{}_{}", kind.slug(), columns[0].name)
            }
            PlotKind::Scatter => {
                format!("{}_{}vs{}", kind.slug(), columns[0].name, columns[1].name)
            }
            PlotKind::Pairplot | PlotKind::CorrelationHeatmap => kind.slug().to_string(),
        };
        sanitize_name(&raw)
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Ordered sequence of plot requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlotPlan {
    requests: Vec<PlotRequest>,
}

impl PlotPlan {
    pub fn requests(&self) -> &[PlotRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlotRequest> {
        self.requests.iter()
    }

    pub fn artifact_names(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.artifact_name.as_str()).collect()
    }
}

impl IntoIterator for PlotPlan {
    type Item = PlotRequest;
    type IntoIter = std::vec::IntoIter<PlotRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlotPlan {
    type Item = &'a PlotRequest;
    type IntoIter = std::slice::Iter<'a, PlotRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}

/// Accumulates requests while keeping artifact names unique within the plan.
#[derive(Default)]
struct PlanBuilder {
    requests: Vec<PlotRequest>,
    names: HashSet<String>,
}

impl PlanBuilder {
    fn push(&mut self, kind: PlotKind, columns: Vec<ColumnDescriptor>) {
        let base = PlotRequest::canonical_name(kind, &columns);
        let mut name = base.clone();
        let mut suffix = 2;
        while self.names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.names.insert(name.clone());
        self.requests.push(PlotRequest {
            kind,
            columns,
            artifact_name: name,
        });
    }

    fn build(self) -> PlotPlan {
        PlotPlan {
            requests: self.requests,
        }
    }
}

/// Knobs for the auto-generation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Keep at most this many scatter requests (first in iteration order).
    /// `None` keeps every pair.
    pub max_scatter_pairs: Option<usize>,
}

/// Build the full plan for a classified schema.
///
/// Order: histograms, scatter pairs (`i < j`), correlation heatmap, pairplot,
/// pie charts. An empty classification yields an empty plan.
pub fn plan_auto(classification: &Classification, options: &PlanOptions) -> PlotPlan {
    let numerical = &classification.numerical;
    let mut builder = PlanBuilder::default();

    for column in numerical {
        builder.push(PlotKind::Histogram, vec![column.clone()]);
    }

    if numerical.len() > 1 {
        let mut emitted = 0usize;
        'pairs: for i in 0..numerical.len() {
            for j in (i + 1)..numerical.len() {
                if options.max_scatter_pairs.is_some_and(|cap| emitted >= cap) {
                    let total = numerical.len() * (numerical.len() - 1) / 2;
                    info!(kept = emitted, total, "scatter pairs capped");
                    break 'pairs;
                }
                builder.push(
                    PlotKind::Scatter,
                    vec![numerical[i].clone(), numerical[j].clone()],
                );
                emitted += 1;
            }
        }
    }

    if !numerical.is_empty() {
        builder.push(PlotKind::CorrelationHeatmap, numerical.clone());
        builder.push(PlotKind::Pairplot, numerical.clone());
    }

    for column in &classification.categorical {
        builder.push(PlotKind::PieChart, vec![column.clone()]);
    }

    let plan = builder.build();
    debug!(
        numerical = numerical.len(),
        categorical = classification.categorical.len(),
        requests = plan.len(),
        "planned plots"
    );
    plan
}

/// An explicit user request for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSelection {
    pub kind: PlotKind,
    pub columns: Vec<String>,
}

impl PlotSelection {
    pub fn new(kind: PlotKind, columns: Vec<String>) -> Self {
        Self { kind, columns }
    }

    /// Check the number of named columns against the plot kind.
    pub fn validate(&self) -> Result<(), PlanError> {
        match self.kind.arity() {
            Some(n) if self.columns.len() != n => Err(PlanError::InvalidSelection(format!(
                "{} takes {} column(s), got {}",
                self.kind,
                n,
                self.columns.len()
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PlotSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.columns.join(", "))
        }
    }
}

/// Plan a single explicitly selected chart.
///
/// Every named column must exist in the schema; otherwise the error names all of
/// the missing ones. Heatmap and pairplot selections with no columns cover every
/// numerical column.
pub fn plan_single(schema: &Schema, selection: &PlotSelection) -> Result<PlotPlan, PlanError> {
    selection.validate()?;

    let missing: Vec<String> = selection
        .columns
        .iter()
        .filter(|name| !schema.contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PlanError::ColumnNotFound { columns: missing });
    }

    let columns: Vec<ColumnDescriptor> = if selection.columns.is_empty() {
        classify(schema).numerical
    } else {
        selection
            .columns
            .iter()
            .filter_map(|name| schema.get(name))
            .map(|column| {
                // Explicit requests may name columns the auto policy would skip.
                let kind = ColumnKind::of(column.declared).unwrap_or(ColumnKind::Categorical);
                ColumnDescriptor::new(column.name.clone(), kind)
            })
            .collect()
    };

    let mut builder = PlanBuilder::default();
    builder.push(selection.kind, columns);
    Ok(builder.build())
}
