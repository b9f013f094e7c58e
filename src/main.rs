use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use exam_marker::config::{ExamSequence, MarkerConfig, Variant};
use exam_marker::shutdown::install_shutdown_handler;
use exam_marker::{MarkerError, RunSummary, Supervisor};

#[derive(Parser, Debug)]
#[command(name = "exam-marker")]
#[command(version)]
#[command(about = "A pool of concurrent TAs marking a shared sequence of exams")]
struct Args {
    /// Number of TAs (at least 2)
    tas: usize,

    /// Marking protocol
    #[arg(long, value_enum, default_value_t = Variant::Synchronized)]
    variant: Variant,

    /// Rubric file, one "index, answer" line per question
    #[arg(long, default_value = "rubric.txt")]
    rubric: PathBuf,

    /// Directory holding exam_0001.txt, exam_0002.txt, ... and the termination exam
    #[arg(long, default_value = "exams")]
    exams_dir: PathBuf,

    /// Exam index from which every exam resolves to the termination exam
    #[arg(long, default_value = "20")]
    exam_threshold: u32,

    /// Student id of the termination exam
    #[arg(long, default_value = "9999")]
    sentinel: i64,

    /// Questions per exam
    #[arg(long, default_value = "5")]
    questions: usize,

    /// Base seed for the TAs' random delays (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Output format for the final summary
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

impl Args {
    fn into_config(self) -> (MarkerConfig, OutputFormat) {
        let mut config = MarkerConfig::new(self.tas)
            .with_variant(self.variant)
            .with_rubric_path(self.rubric)
            .with_exams_dir(self.exams_dir)
            .with_questions(self.questions)
            .with_sequence(ExamSequence {
                threshold: self.exam_threshold,
                sentinel_student: self.sentinel,
                ..Default::default()
            });
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        (config, self.output)
    }
}

fn print_summary(summary: &RunSummary, output: &OutputFormat) -> Result<(), MarkerError> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Table => {
            let m = &summary.metrics;
            println!("Run:             {}", summary.run_id);
            println!("Exam index:      {}", summary.state.exam_index);
            println!("Corrections:     {}", m.corrections);
            println!("Questions:       {} marked, {} double claims", m.questions_marked, m.double_claims);
            println!("Lost updates:    {}", m.lost_updates);
            println!("Lost transitions: {}", m.lost_transitions);
            if summary.failed_tas > 0 {
                println!("Failed TAs:      {}", summary.failed_tas);
            }
            println!("{}", summary.summary_line());
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, output) = args.into_config();
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        eprintln!("Usage: exam-marker <number_of_TAs>");
        return ExitCode::from(1);
    }

    let supervisor = Supervisor::new(config);
    install_shutdown_handler(supervisor.stop_flag());

    let summary = match supervisor.run().await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    match print_summary(&summary, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
