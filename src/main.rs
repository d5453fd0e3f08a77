use std::io::{stdin, stdout, Write};
use std::path::PathBuf;

use clap::Parser;
use dass_score::assessment::{DEPARTMENTS, YEARS};
use dass_score::config::AppConfig;
use dass_score::session::{Event, Screen, Session};
use dass_score::store::{save_with_retry, FileStore, RetryPolicy, ResultStore};
use dass_score::{
    telemetry, Error, Graded, ProfileUpdate, UserProfile, QUESTIONS, QUESTION_COUNT,
};
use tracing::{error, info};

/// Take the DASS-42 questionnaire and store the result.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Id of the user taking the assessment
    #[arg(long)]
    user: String,
    /// Result store directory (defaults to DASS_STORE_DIR)
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut store = FileStore::open(args.store.as_ref().unwrap_or(&config.store.dir))?;
    let policy = RetryPolicy::from(&config.store);
    let mut session = Session::resume();

    let loaded = store
        .get_profile(&args.user)
        .and_then(|profile| Ok((profile, store.get_user_results(&args.user)?)));
    let (profile, history) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            error!(user_id = %args.user, error = %err, "failed to load user data");
            session.advance(Event::LoadFailed);
            return Err(err);
        }
    };
    let signed_in = Event::SignedIn {
        user_id: args.user.clone(),
        profile,
        history,
    };
    if !session.advance(signed_in) {
        return Ok(());
    }

    loop {
        match session.screen().clone() {
            Screen::Profile => {
                fill_profile(&mut store, &args.user)?;
                let profile = store
                    .get_profile(&args.user)?
                    .unwrap_or_else(|| UserProfile::new(&args.user));
                if !session.advance(Event::ProfileSaved(profile)) {
                    break;
                }
            }
            Screen::AdminDashboard => {
                println!("Admin accounts review results with the `report` tool.");
                return Ok(());
            }
            Screen::Home => {
                println!(
                    "{} previous assessment(s) on record.",
                    session.history().len()
                );
                if !session.advance(Event::StartTest) {
                    break;
                }
            }
            Screen::Test { current, responses } => {
                if current == 0 && responses.answered() == 0 {
                    println!("{}", QUESTIONS.instructions);
                }
                let Some(question) = QUESTIONS.get(current) else {
                    break;
                };
                println!();
                println!("Question {}/{}", current + 1, QUESTION_COUNT);
                println!("{}", question.text);
                for score in &QUESTIONS.scores {
                    println!("  {} => {}", score.score, score.text);
                }
                let input = prompt("Answer 0-3 (b = back, q = quit): ")?;
                let event = match input.as_str() {
                    "q" => Event::Exit,
                    "b" => Event::Previous,
                    value => match value.parse::<i8>() {
                        Ok(answer) => {
                            if let Err(err) = session.handle(Event::Answer(answer)) {
                                println!("{err}");
                                continue;
                            }
                            Event::Next
                        }
                        Err(_) => {
                            println!("Please answer with a number from 0 to 3.");
                            continue;
                        }
                    },
                };
                if let Err(err) = session.handle(event) {
                    println!("{err}");
                }
                if session.screen() == &Screen::Home {
                    return Ok(());
                }
            }
            Screen::Submitting(result) => {
                let event = match save_with_retry(&mut store, &result, policy) {
                    Ok(()) => Event::SaveSucceeded,
                    Err(err) => Event::SaveFailed(err.to_string()),
                };
                if !session.advance(event) {
                    break;
                }
            }
            Screen::Result {
                result,
                saved,
                error,
            } => {
                println!();
                println!("Your DASS-42 results ({})", result.formatted_date());
                for row in result.interpret() {
                    println!(
                        "{:<11} {:>2}  {:<16} {}",
                        row.subscale.label(),
                        row.score,
                        row.level.label(),
                        row.description
                    );
                }
                println!();
                println!(
                    "This assessment is for informational purposes only and should not replace \
                     professional medical advice. Please consult a mental health professional for \
                     proper diagnosis and treatment."
                );
                if saved {
                    info!(user_id = %result.user_id, "assessment complete");
                    return Ok(());
                }
                println!(
                    "Failed to save your result: {}",
                    error.as_deref().unwrap_or("unknown error")
                );
                if prompt("Retry saving? [y/N] ")?.eq_ignore_ascii_case("y") {
                    if !session.advance(Event::RetrySave) {
                        break;
                    }
                } else {
                    return Ok(());
                }
            }
            _ => break,
        }
    }
    Ok(())
}

fn prompt(message: &str) -> Result<String, Error> {
    print!("{message}");
    stdout().flush()?;
    let mut buffer = String::new();
    stdin().read_line(&mut buffer)?;
    Ok(buffer.trim().to_string())
}

fn choose(label: &str, options: &[&str]) -> Result<String, Error> {
    println!("{label}:");
    for (index, option) in options.iter().enumerate() {
        println!("  {} => {}", index + 1, option);
    }
    loop {
        let input = prompt("> ")?;
        match input.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(options[n - 1].to_string()),
            _ => println!("Please pick a number from 1 to {}.", options.len()),
        }
    }
}

fn fill_profile(store: &mut FileStore, user_id: &str) -> Result<(), Error> {
    println!("Complete your profile");
    let name = loop {
        let name = prompt("Name: ")?;
        if !name.is_empty() {
            break name;
        }
    };
    let update = ProfileUpdate {
        name: Some(name),
        roll_number: Some(prompt("Roll number: ")?),
        mobile_number: Some(prompt("Mobile number: ")?),
        parent_contact_number: Some(prompt("Parent contact number: ")?),
        department: Some(choose("Department", &DEPARTMENTS)?),
        year: Some(choose("Year", &YEARS)?),
        ..ProfileUpdate::default()
    };
    store.update_profile(user_id, &update)
}
