// Library exports for autoplot

pub mod classify;
pub mod command;
pub mod config;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod layout;
pub mod parser;
pub mod pdf;
pub mod plan;
pub mod render;
pub mod report;
pub mod stats;

pub use classify::{classify, Classification, ColumnDescriptor, ColumnKind};
pub use config::{ChartOptions, ReportConfig};
pub use data::{Dataset, DeclaredType, Schema};
pub use layout::{paginate, DocumentLayout, PageGeometry};
pub use plan::{plan_auto, plan_single, PlanOptions, PlotKind, PlotPlan, PlotRequest, PlotSelection};
pub use render::{Artifact, ChartRenderer, PlottersRenderer};
pub use report::{ReportAssembler, ReportSummary};
