use anyhow::{Context, Result};
use autoplot::command::{column_prompts, menu_plot_kind, Command, CommandOutcome, MenuChoice};
use autoplot::config::{ReportConfig, DEFAULT_REPORT_FILE};
use autoplot::csv_reader::read_csv_from_path;
use autoplot::data::Dataset;
use autoplot::error::{CommandError, ReportError};
use autoplot::parser::parse_plot_selection;
use autoplot::plan::PlotSelection;
use autoplot::render::PlottersRenderer;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "autoplot",
    version,
    about = "Generate charts and a PDF report from CSV data",
    long_about = "Classifies the columns of a CSV file, renders the charts that fit them \
                  and optionally lays them out in a paginated PDF report.\n\n\
                  EXAMPLES:\n  \
                  autoplot auto data.csv --output-dir plots/\n  \
                  autoplot plot data.csv 'scatter(age, income)'\n  \
                  autoplot report data.csv -o report.pdf\n  \
                  autoplot menu"
)]
struct Args {
    #[command(subcommand)]
    command: Cmd,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rendered charts (overrides the config file)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Render every chart the dataset supports
    Auto {
        /// Path to the CSV file
        input: PathBuf,
    },
    /// Render one chart, e.g. 'histogram(age)' or 'scatter(age, income)'
    Plot {
        /// Path to the CSV file
        input: PathBuf,
        /// Plot selection
        selection: String,
    },
    /// Render every chart and assemble them into a PDF report
    Report {
        /// Path to the CSV file
        input: PathBuf,
        /// Output PDF path
        #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,
        /// Keep the chart images after the report is written
        #[arg(long)]
        keep_artifacts: bool,
    },
    /// Interactive menu
    Menu {
        /// Path to the CSV file; prompted for when omitted
        input: Option<PathBuf>,
    },
}

fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let mut config = match &args.config {
        Some(path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let command = match args.command {
        Cmd::Auto { input } => Command::AutoGenerate { input },
        Cmd::Plot { input, selection } => Command::Plot {
            input,
            selection: parse_plot_selection(&selection)
                .with_context(|| format!("Invalid plot selection '{}'", selection))?,
        },
        Cmd::Report {
            input,
            output,
            keep_artifacts,
        } => Command::Report {
            input,
            output,
            keep_artifacts,
        },
        Cmd::Menu { input } => return run_menu(input, config),
    };

    let renderer = PlottersRenderer::new(config.chart.clone());
    let outcome = command
        .execute(renderer, config)
        .context("Command failed")?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Rendered(rendered) => {
            for artifact in &rendered.artifacts {
                println!("Saved {}", artifact.path.display());
            }
            for failure in &rendered.failures {
                eprintln!("Failed: {}", failure.error);
            }
        }
        CommandOutcome::Report(summary) => {
            for failure in &summary.failures {
                eprintln!("Failed: {}", failure.error);
            }
            println!(
                "PDF report generated: {} ({} page(s), {} chart(s))",
                summary.document.output.display(),
                summary.document.pages,
                summary.document.embedded.len()
            );
        }
    }
}

/// Print `label` and read one trimmed line; empty at end of input
fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn run_menu(input: Option<PathBuf>, config: ReportConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    let input = match input {
        Some(path) => path,
        None => PathBuf::from(prompt(&mut stdin, "Enter the path to the dataset (CSV file)")?),
    };

    let dataset = Dataset::from_csv(
        read_csv_from_path(&input)
            .with_context(|| format!("Failed to load '{}'", input.display()))?,
    );
    println!("Columns available in the dataset:");
    println!("{}", dataset.schema().names().collect::<Vec<_>>().join(", "));

    println!("\nChoose an option:");
    println!("1. Auto-generate all plots");
    println!("2. Generate specific plots");
    println!("3. Generate PDF report");

    let choice = match prompt(&mut stdin, "Enter the number of your choice")?.parse::<MenuChoice>() {
        Ok(choice) => choice,
        Err(_) => {
            println!("Invalid choice.");
            return Ok(());
        }
    };

    let command = match choice {
        MenuChoice::AutoGenerate => Command::AutoGenerate { input },
        MenuChoice::Specific => {
            println!("\nChoose specific plots to generate:");
            println!("1. Histogram");
            println!("2. Scatter Plot");
            println!("3. Pairplot");
            println!("4. Correlation Heatmap");
            println!("5. Pie Chart");

            let kind = match menu_plot_kind(&prompt(&mut stdin, "Enter the number of your choice")?) {
                Ok(kind) => kind,
                Err(_) => {
                    println!("Invalid choice.");
                    return Ok(());
                }
            };
            let columns = column_prompts(kind)
                .iter()
                .map(|label| prompt(&mut stdin, label))
                .collect::<Result<Vec<_>>>()?;
            Command::Plot {
                input,
                selection: PlotSelection::new(kind, columns),
            }
        }
        MenuChoice::Report => Command::Report {
            input,
            output: PathBuf::from(DEFAULT_REPORT_FILE),
            keep_artifacts: false,
        },
    };

    let renderer = PlottersRenderer::new(config.chart.clone());
    match command.execute_on(&dataset, renderer, config) {
        Ok(outcome) => print_outcome(&outcome),
        // A mistyped column is reported, not treated as a failure.
        Err(CommandError::Report(ReportError::Plan(e))) | Err(CommandError::Plan(e)) => {
            println!("{}", e);
        }
        Err(e) => return Err(e).context("Command failed"),
    }
    Ok(())
}
