use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use dass_score::assessment::{DEPARTMENTS, YEARS};
use dass_score::config::AppConfig;
use dass_score::report::write_students_csv;
use dass_score::store::{profiles_for, FileStore, ResultStore};
use dass_score::{aggregate, telemetry, Error, Filter, SeverityLevel, Subscale};
use tracing::{info, warn};

/// Overall DASS-42 results across students.
#[derive(Parser)]
struct Args {
    /// Department to include, or "All"
    #[arg(long, default_value = "All")]
    department: Filter<String>,
    /// Year of study to include, or "All"
    #[arg(long, default_value = "All")]
    year: Filter<String>,
    /// Only show this subscale (Depression, Anxiety or Stress)
    #[arg(long)]
    subscale: Option<Subscale>,
    /// Narrow student lists to one level, or "All"
    #[arg(long, default_value = "All")]
    level: Filter<SeverityLevel>,
    /// Also write the student lists to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Result store directory (defaults to DASS_STORE_DIR)
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Filter::Only(department) = &args.department {
        if !DEPARTMENTS.contains(&department.as_str()) {
            warn!(department = %department, "department is not one of the profile choices");
        }
    }
    if let Filter::Only(year) = &args.year {
        if !YEARS.contains(&year.as_str()) {
            warn!(year = %year, "year is not one of the profile choices");
        }
    }

    let store = FileStore::open(args.store.as_ref().unwrap_or(&config.store.dir))?;
    let results = store.get_all_results()?;
    let profiles = profiles_for(&store, &results);
    info!(
        results = results.len(),
        profiles = profiles.len(),
        "loaded stored results"
    );

    let report = aggregate(&results, &profiles, &args.department, &args.year);
    println!(
        "Overall Results (department: {}, year: {})",
        args.department, args.year
    );
    if report.total == 0 {
        println!("No assessment data available for the selected filters.");
        return Ok(());
    }
    println!("Total Assessments (Filtered): {}", report.total);

    let subscales = match args.subscale {
        Some(subscale) => vec![subscale],
        None => Subscale::ordered().to_vec(),
    };
    for &subscale in &subscales {
        println!();
        println!("{} Severity Distribution", subscale.label());
        for slice in report.distribution(subscale) {
            println!(
                "  {:<16} {:>4}  {:>5.1}%  {}",
                slice.level.label(),
                slice.count,
                slice.percentage,
                slice.level.chart_color()
            );
        }

        let students = report.students(subscale, &args.level);
        println!("{} students ({}): {}", subscale.label(), args.level, students.len());
        for student in students {
            let profile = &student.profile;
            println!(
                "  {:<24} {:<10} {:<38} {:<12} D: {:<16} A: {:<16} S: {}",
                profile.display_name(),
                profile.roll_number,
                profile.department,
                profile.year,
                student.levels.depression.label(),
                student.levels.anxiety.label(),
                student.levels.stress.label()
            );
        }
    }

    if let Some(path) = &args.csv {
        write_students_csv(&report, &subscales, &args.level, File::create(path)?)?;
        info!(path = %path.display(), "wrote student lists");
    }
    Ok(())
}
