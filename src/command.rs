//! User-facing commands.
//!
//! Both the subcommand CLI and the interactive menu build a [`Command`] value
//! first; it is validated and only then executed.

use crate::config::ReportConfig;
use crate::csv_reader::read_csv_from_path;
use crate::data::Dataset;
use crate::error::CommandError;
use crate::plan::{PlotKind, PlotSelection};
use crate::render::ChartRenderer;
use crate::report::{RenderOutcome, ReportAssembler, ReportSummary};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Render every chart the auto-generation policy plans
    AutoGenerate { input: PathBuf },
    /// Render one selected chart
    Plot {
        input: PathBuf,
        selection: PlotSelection,
    },
    /// Render everything and assemble the PDF report
    Report {
        input: PathBuf,
        output: PathBuf,
        keep_artifacts: bool,
    },
}

#[derive(Debug)]
pub enum CommandOutcome {
    Rendered(RenderOutcome),
    Report(ReportSummary),
}

impl Command {
    pub fn input(&self) -> &Path {
        match self {
            Command::AutoGenerate { input }
            | Command::Plot { input, .. }
            | Command::Report { input, .. } => input,
        }
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        let input = self.input();
        if !input.is_file() {
            return Err(CommandError::InputNotFound(input.to_path_buf()));
        }
        self.validate_arguments()
    }

    fn validate_arguments(&self) -> Result<(), CommandError> {
        match self {
            Command::Plot { selection, .. } => selection.validate()?,
            Command::Report { output, .. } if output.as_os_str().is_empty() => {
                return Err(CommandError::Invalid(
                    "report output path is empty".to_string(),
                ))
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate, load the input and run the command.
    pub fn execute<R: ChartRenderer>(
        &self,
        renderer: R,
        config: ReportConfig,
    ) -> Result<CommandOutcome, CommandError> {
        self.validate()?;
        let dataset = Dataset::from_csv(read_csv_from_path(self.input())?);
        info!(
            input = %self.input().display(),
            rows = dataset.row_count(),
            columns = dataset.schema().len(),
            "loaded dataset"
        );
        self.execute_on(&dataset, renderer, config)
    }

    /// Run the command against a dataset that is already loaded.
    ///
    /// The input path is not read again.
    pub fn execute_on<R: ChartRenderer>(
        &self,
        dataset: &Dataset,
        renderer: R,
        mut config: ReportConfig,
    ) -> Result<CommandOutcome, CommandError> {
        self.validate_arguments()?;
        if let Command::Report { keep_artifacts: true, .. } = self {
            config.delete_artifacts = false;
        }
        let assembler = ReportAssembler::new(renderer, config);

        let outcome = match self {
            Command::AutoGenerate { .. } => {
                CommandOutcome::Rendered(assembler.generate_plots(dataset)?)
            }
            Command::Plot { selection, .. } => {
                CommandOutcome::Rendered(assembler.generate_single(dataset, selection)?)
            }
            Command::Report { output, .. } => {
                CommandOutcome::Report(assembler.assemble(dataset, output)?)
            }
        };
        Ok(outcome)
    }
}

/// Top-level choice in the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AutoGenerate,
    Specific,
    Report,
}

impl FromStr for MenuChoice {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::AutoGenerate),
            "2" => Ok(MenuChoice::Specific),
            "3" => Ok(MenuChoice::Report),
            other => Err(CommandError::Invalid(format!("Invalid choice '{}'", other))),
        }
    }
}

/// Map a numbered sub-menu entry to a plot kind, numbered in [`PlotKind::ALL`] order.
pub fn menu_plot_kind(input: &str) -> Result<PlotKind, CommandError> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| PlotKind::ALL.get(idx).copied())
        .ok_or_else(|| CommandError::Invalid(format!("Invalid plot type '{}'", input.trim())))
}

/// Column prompts the menu asks for a plot kind. Kinds with no prompts
/// cover every numerical column.
pub fn column_prompts(kind: PlotKind) -> &'static [&'static str] {
    match kind {
        PlotKind::Histogram => &["Enter the column name for the histogram"],
        PlotKind::Scatter => &[
            "Enter the column name for the x-axis",
            "Enter the column name for the y-axis",
        ],
        PlotKind::PieChart => &["Enter the column name for the pie chart"],
        PlotKind::Pairplot | PlotKind::CorrelationHeatmap => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlanError, RenderError};
    use crate::plan::PlotRequest;
    use crate::render::Artifact;
    use image::{Rgb, RgbImage};
    use std::fs;

    struct StubRenderer;

    impl ChartRenderer for StubRenderer {
        fn render(
            &self,
            request: &PlotRequest,
            _dataset: &Dataset,
            out_dir: &Path,
        ) -> Result<Artifact, RenderError> {
            let path = out_dir.join(format!("{}.png", request.artifact_name));
            RgbImage::from_pixel(8, 6, Rgb([0, 0, 0])).save(&path).unwrap();
            Ok(Artifact {
                path,
                request: request.clone(),
            })
        }
    }

    fn write_csv(dir: &Path) -> PathBuf {
        let path = dir.join("people.csv");
        fs::write(&path, "age,income,city\n30,50000,Paris\n41,62000,Rome\n").unwrap();
        path
    }

    fn config_in(dir: &Path) -> ReportConfig {
        ReportConfig {
            output_dir: dir.join("plots"),
            ..ReportConfig::default()
        }
    }

    #[test]
    fn test_validate_missing_input() {
        let command = Command::AutoGenerate {
            input: PathBuf::from("no/such/file.csv"),
        };
        assert!(matches!(
            command.validate(),
            Err(CommandError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_validate_bad_selection() {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::Plot {
            input: write_csv(dir.path()),
            selection: PlotSelection::new(PlotKind::Scatter, vec!["age".to_string()]),
        };
        assert!(matches!(
            command.validate(),
            Err(CommandError::Plan(PlanError::InvalidSelection(_)))
        ));
    }

    #[test]
    fn test_execute_auto_generate() {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::AutoGenerate {
            input: write_csv(dir.path()),
        };
        match command.execute(StubRenderer, config_in(dir.path())).unwrap() {
            CommandOutcome::Rendered(outcome) => assert_eq!(outcome.artifacts.len(), 6),
            other => panic!("Expected rendered outcome, got {:?}", other),
        }
        assert!(dir.path().join("plots").join("pie_chart_city.png").exists());
    }

    #[test]
    fn test_execute_plot_unknown_column() {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::Plot {
            input: write_csv(dir.path()),
            selection: PlotSelection::new(PlotKind::PieChart, vec!["country".to_string()]),
        };
        let err = command.execute(StubRenderer, config_in(dir.path())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "column(s) not found in dataset: country"
        );
    }

    #[test]
    fn test_execute_report_keep_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.pdf");
        let command = Command::Report {
            input: write_csv(dir.path()),
            output: output.clone(),
            keep_artifacts: true,
        };
        match command.execute(StubRenderer, config_in(dir.path())).unwrap() {
            CommandOutcome::Report(summary) => {
                assert_eq!(summary.document.embedded.len(), 6);
                assert_eq!(summary.kept_artifacts.len(), 6);
            }
            other => panic!("Expected report outcome, got {:?}", other),
        }
        assert!(output.exists());
    }

    #[test]
    fn test_execute_on_loaded_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path());
        let dataset = Dataset::from_csv(read_csv_from_path(&input).unwrap());
        fs::remove_file(&input).unwrap();

        let command = Command::Plot {
            input,
            selection: PlotSelection::new(PlotKind::Histogram, vec!["age".to_string()]),
        };
        match command
            .execute_on(&dataset, StubRenderer, config_in(dir.path()))
            .unwrap()
        {
            CommandOutcome::Rendered(outcome) => assert_eq!(outcome.artifacts.len(), 1),
            other => panic!("Expected rendered outcome, got {:?}", other),
        }
        assert!(dir.path().join("plots").join("histogram_age.png").exists());
    }

    #[test]
    fn test_execute_on_rejects_bad_selection() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::from_csv(read_csv_from_path(write_csv(dir.path())).unwrap());
        let command = Command::Plot {
            input: PathBuf::from("unused.csv"),
            selection: PlotSelection::new(PlotKind::Scatter, vec!["age".to_string()]),
        };
        assert!(matches!(
            command.execute_on(&dataset, StubRenderer, config_in(dir.path())),
            Err(CommandError::Plan(PlanError::InvalidSelection(_)))
        ));
    }

    #[test]
    fn test_menu_choice() {
        assert_eq!("1".parse::<MenuChoice>().unwrap(), MenuChoice::AutoGenerate);
        assert_eq!(" 2 ".parse::<MenuChoice>().unwrap(), MenuChoice::Specific);
        assert_eq!("3".parse::<MenuChoice>().unwrap(), MenuChoice::Report);
        assert!("4".parse::<MenuChoice>().is_err());
        assert!("report".parse::<MenuChoice>().is_err());
    }

    #[test]
    fn test_menu_plot_kind() {
        assert_eq!(menu_plot_kind("1").unwrap(), PlotKind::Histogram);
        assert_eq!(menu_plot_kind("2").unwrap(), PlotKind::Scatter);
        assert_eq!(menu_plot_kind("3").unwrap(), PlotKind::Pairplot);
        assert_eq!(menu_plot_kind("4").unwrap(), PlotKind::CorrelationHeatmap);
        assert_eq!(menu_plot_kind("5").unwrap(), PlotKind::PieChart);
        assert!(menu_plot_kind("0").is_err());
        assert!(menu_plot_kind("6").is_err());
    }

    #[test]
    fn test_column_prompts_match_arity() {
        for kind in PlotKind::ALL {
            let prompts = column_prompts(kind).len();
            match kind.arity() {
                Some(n) => assert_eq!(prompts, n),
                None => assert_eq!(prompts, 0),
            }
        }
    }
}
