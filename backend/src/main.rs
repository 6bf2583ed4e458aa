//! sloscore CLI - SLO score sheets from gradebook exports
//!
//! ```bash
//! sloscore extract bio101-grades.csv bio101-questionstats.csv   # one section
//! sloscore batch -d exports/ -o combined.csv                   # all sections in a folder
//! sloscore inspect bio101-grades.csv bio101-questionstats.csv   # show SLO mapping
//! sloscore mail                                                # open mail composer
//! sloscore serve                                               # HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use sloscore::{
    collect_section_files, extract_to_csv, load_grades, load_question_catalog, open_composer,
    pair_mixed_files, parse_question_columns, parse_question_header, process_pairs,
    resolve_joined_slo_mapping,
    write_slo_table, ExtractOptions, MailConfig, SectionFile,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sloscore")]
#[command(about = "Extract Student Learning Outcome scores from gradebook exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn one grades + question-stats pair into an SLO score sheet
    Extract {
        /// Gradebook export
        grades: PathBuf,

        /// Question statistics export
        questions: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "slo_grades.csv")]
        output: PathBuf,
    },

    /// Pair <id>-grades.csv / <id>-questionstats.csv files and combine all sections
    Batch {
        /// Input files (role taken from the name suffix)
        files: Vec<PathBuf>,

        /// Also read every .csv in this directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Combined roster output
        #[arg(short, long, default_value = "combined_slo_grades.csv")]
        output: PathBuf,

        /// Write each section's score sheet to this directory as <id>-slo.csv
        #[arg(long)]
        sections_dir: Option<PathBuf>,

        /// Open the mail composer when done
        #[arg(long)]
        mail: bool,
    },

    /// Show question columns, question names and the resolved SLO mapping
    Inspect {
        /// Gradebook export
        grades: PathBuf,

        /// Question statistics export
        questions: PathBuf,
    },

    /// Open the default mail composer with a pre-filled subject
    Mail {
        /// Recipient (default: SLOSCORE_MAIL_TO or a placeholder)
        #[arg(long)]
        to: Option<String>,

        /// Subject (default: SLOSCORE_MAIL_SUBJECT or "SLO Grades")
        #[arg(long)]
        subject: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let options = ExtractOptions::default();

    let result = match cli.command {
        Commands::Extract {
            grades,
            questions,
            output,
        } => cmd_extract(&grades, &questions, &output, &options),

        Commands::Batch {
            files,
            dir,
            output,
            sections_dir,
            mail,
        } => cmd_batch(files, dir.as_deref(), &output, sections_dir.as_deref(), mail, &options),

        Commands::Inspect { grades, questions } => cmd_inspect(&grades, &questions, &options),

        Commands::Mail { to, subject } => cmd_mail(MailConfig::from_env().with_overrides(to, subject)),

        Commands::Serve { port } => sloscore::server::start_server(port, options).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn cmd_extract(grades: &Path, questions: &Path, output: &Path, options: &ExtractOptions) -> CliResult {
    eprintln!("📄 Grades:    {}", grades.display());
    eprintln!("📄 Questions: {}", questions.display());

    let (csv, outcome) = extract_to_csv(&fs::read(grades)?, &fs::read(questions)?, options)?;

    for warning in &outcome.warnings {
        eprintln!("   ⚠️  {}", warning);
    }
    eprintln!(
        "✅ {} students, {} SLO column(s): {}",
        outcome.stats.students,
        outcome.table.slo_labels.len(),
        outcome.table.slo_labels.join(", ")
    );

    fs::write(output, csv)?;
    eprintln!("💾 Output written to: {}", output.display());
    Ok(())
}

fn cmd_batch(
    files: Vec<PathBuf>,
    dir: Option<&Path>,
    output: &Path,
    sections_dir: Option<&Path>,
    mail: bool,
    options: &ExtractOptions,
) -> CliResult {
    let mut inputs = files
        .iter()
        .map(|p| SectionFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(dir) = dir {
        eprintln!("📂 Scanning: {}", dir.display());
        inputs.extend(collect_section_files(dir)?);
    }
    if inputs.is_empty() {
        return Err("no input files; pass files or --dir".into());
    }

    let batch = process_pairs(pair_mixed_files(inputs, options), options);

    if let Some(sections_dir) = sections_dir {
        fs::create_dir_all(sections_dir)?;
        for section in &batch.sections {
            let path = sections_dir.join(format!("{}-slo.csv", section.common_id));
            fs::write(&path, write_slo_table(&section.outcome.table, options)?)?;
            eprintln!("   💾 {}", path.display());
        }
    }

    eprintln!("\n📊 Summary");
    eprintln!("   Sections processed: {}", batch.sections.len());
    eprintln!("   Sections failed:    {}", batch.failures.len());
    for failure in &batch.failures {
        eprintln!("   ❌ {}: {}", failure.common_id, failure.message);
    }
    for warning in batch.all_warnings() {
        eprintln!("   ⚠️  {}", warning);
    }

    let csv = batch.combined_csv(options)?;
    fs::write(output, csv)?;
    if let Ok(roster) = batch.roster() {
        eprintln!(
            "✅ {} students across {} section(s)",
            roster.table.rows.len(),
            roster.sections.len()
        );
    }
    eprintln!("💾 Output written to: {}", output.display());

    if mail {
        cmd_mail(MailConfig::from_env())?;
    }
    Ok(())
}

fn cmd_inspect(grades: &Path, questions: &Path, options: &ExtractOptions) -> CliResult {
    let grade_table = load_grades(&fs::read(grades)?, options)?;
    let catalog = load_question_catalog(&fs::read(questions)?, options)?;
    let resolution = resolve_joined_slo_mapping(&catalog, &parse_question_columns(&grade_table.columns));

    println!("Grade columns ({} students):", grade_table.rows.len());
    for label in &grade_table.columns {
        match parse_question_header(label) {
            Some(col) => {
                let name = catalog
                    .get(col.question_number)
                    .map(|q| q.question_name.as_str())
                    .unwrap_or("(not in question stats)");
                let slo = resolution.mapping.label(col.question_number).unwrap_or("-");
                println!(
                    "  {:<20} Q#{:<4} max {:<7} {:<8} {}",
                    label, col.question_number, col.max_score, slo, name
                );
            }
            None => println!("  {:<20} (not a question column)", label),
        }
    }

    for warning in catalog.warnings.iter().chain(&resolution.warnings) {
        eprintln!("⚠️  {}", warning);
    }
    Ok(())
}

fn cmd_mail(config: MailConfig) -> CliResult {
    eprintln!("✉️  Opening mail composer for {} (\"{}\")", config.recipient, config.subject);
    if let Err(e) = open_composer(&config) {
        eprintln!("⚠️  {}", e);
    }
    Ok(())
}
