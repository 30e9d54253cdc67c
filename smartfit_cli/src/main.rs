use clap::{Parser, Subcommand};
use smartfit_core::markers::{self, MarkerStore};
use smartfit_core::profile_store::profile_path;
use smartfit_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "smartfit")]
#[command(about = "Workout logging and training profile tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use the remote record store at this base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Person to act as
    #[arg(long, global = true)]
    person: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List suggested exercises for a body part
    Exercises {
        /// back, chest, legs, shoulders, biceps or triceps
        #[arg(long)]
        body_part: String,
    },

    /// Log a workout
    Log {
        /// "<body part>/<exercise>: <reps>x<weight>[@<rpe>], ..." (repeatable)
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,

        /// Dry run - show the workout without logging it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show sets logged to the local store
    History {
        /// Only show the most recent N sets
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record today's condition
    Checkin {
        /// Hours slept (0-24)
        #[arg(long, default_value_t = 7.0)]
        sleep: f64,

        /// Energy level (1-10)
        #[arg(long, default_value_t = 5)]
        energy: u8,

        /// Minutes available for training
        #[arg(long, default_value_t = 60)]
        time: u32,

        /// Body part to train today (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show or edit the training profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the stored profile
    Show,

    /// Change profile fields and save
    Set {
        /// metric or imperial; values given alongside are read in this system
        #[arg(long)]
        units: Option<String>,

        /// Height in cm (metric) or inches (imperial)
        #[arg(long, allow_hyphen_values = true)]
        height: Option<String>,

        /// Weight in kg (metric) or lb (imperial)
        #[arg(long, allow_hyphen_values = true)]
        weight: Option<String>,

        /// male, female or prefer-not-to-say
        #[arg(long)]
        sex: Option<String>,

        #[arg(long)]
        age: Option<String>,

        /// beginner, intermediate or advanced
        #[arg(long)]
        experience: Option<String>,

        /// bulk, cut, lean-mass or weight-loss
        #[arg(long)]
        goal: Option<String>,

        /// Training days per week (1-7)
        #[arg(long)]
        frequency: Option<u8>,
    },
}

/// Collaborators the commands run against
struct Stores {
    catalog: Box<dyn ExerciseCatalog>,
    sets: Box<dyn SetRecordSink>,
    checkins: Box<dyn UserMetricSink>,
    profiles: Box<dyn ProfileStore>,
}

impl Stores {
    fn open(data_dir: &Path, api_url: Option<&str>, config: &Config) -> Result<Self> {
        match api_url {
            Some(url) => {
                let http = HttpStore::new(url, config.remote.timeout())?;
                Ok(Self {
                    catalog: Box::new(http.clone()),
                    sets: Box::new(http.clone()),
                    checkins: Box::new(http.clone()),
                    profiles: Box::new(http),
                })
            }
            None => Ok(Self {
                catalog: Box::new(BuiltinCatalog),
                sets: Box::new(JsonlLog::new(set_log_path(data_dir))),
                checkins: Box::new(JsonlLog::new(checkin_log_path(data_dir))),
                profiles: Box::new(FileProfileStore::new(profile_path(data_dir))),
            }),
        }
    }
}

fn set_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("log").join("sets.jsonl")
}

fn checkin_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("log").join("checkins.jsonl")
}

#[tokio::main]
async fn main() -> ExitCode {
    smartfit_core::logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let api_url = cli.api_url.or_else(|| config.remote.api_url.clone());
    let person = cli.person.map(PersonId).unwrap_or(config.identity.person_id);

    greet_once(person);

    let stores = Stores::open(&data_dir, api_url.as_deref(), &config)?;

    match cli.command {
        Commands::Exercises { body_part } => cmd_exercises(&stores, &body_part).await,
        Commands::Log { entries, dry_run } => cmd_log(&stores, person, &entries, dry_run).await,
        Commands::History { limit } => {
            if api_url.is_some() {
                println!("History is only kept by the local store.");
                return Ok(());
            }
            cmd_history(&data_dir, person, limit)
        }
        Commands::Checkin {
            sleep,
            energy,
            time,
            targets,
            notes,
        } => {
            let today = TodayInput {
                sleep,
                energy,
                time,
                targets,
                notes,
            };
            cmd_checkin(&stores, person, today).await
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show => cmd_profile_show(&stores, person).await,
            ProfileAction::Set {
                units,
                height,
                weight,
                sex,
                age,
                experience,
                goal,
                frequency,
            } => {
                let changes = ProfileChanges {
                    units,
                    height,
                    weight,
                    sex,
                    age,
                    experience,
                    goal,
                    frequency,
                };
                cmd_profile_set(&stores, person, changes).await
            }
        },
    }
}

fn greet_once(person: PersonId) {
    match MarkerStore::session_scoped().mark_once(markers::WELCOME, person) {
        Ok(true) => println!("Welcome to SmartFit! Log a workout with `smartfit log`.\n"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not record welcome marker: {}", e),
    }
}

async fn cmd_exercises(stores: &Stores, body_part: &str) -> Result<()> {
    let part: BodyPart = body_part.parse()?;
    let mut builder = SessionBuilder::new();

    if let Err(e) = builder.select_body_part(part, stores.catalog.as_ref()).await {
        eprintln!("⚠ {}", e);
        println!("No suggestions available; custom exercise names are still accepted.");
        return Ok(());
    }

    println!("{} exercises:", part.label());
    for name in builder.suggestions() {
        println!("  - {}", name);
    }
    Ok(())
}

/// One `--entry` argument, parsed
struct Entry {
    body_part: BodyPart,
    name: String,
    sets: Vec<(u32, f64, Option<u8>)>,
}

fn bad_entry(entry: &str, why: &str) -> Error {
    Error::InvalidChoice(format!("bad entry {:?}: {}", entry, why))
}

/// Parse `"chest/Bench Press: 8x60@8, 8x62.5"`.
fn parse_entry(raw: &str) -> Result<Entry> {
    let (head, sets) = raw
        .split_once(':')
        .ok_or_else(|| bad_entry(raw, "expected ':' before the sets"))?;
    let (part, name) = head
        .split_once('/')
        .ok_or_else(|| bad_entry(raw, "expected <body part>/<exercise>"))?;

    let mut parsed = Vec::new();
    for set in sets.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (work, rpe) = match set.split_once('@') {
            Some((work, rpe)) => {
                let rpe = rpe
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| bad_entry(raw, "RPE must be a whole number"))?;
                (work, Some(rpe))
            }
            None => (set, None),
        };
        let (reps, weight) = work
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| bad_entry(raw, "sets look like <reps>x<weight>"))?;
        let reps = reps
            .trim()
            .parse::<u32>()
            .map_err(|_| bad_entry(raw, "reps must be a whole number"))?;
        let weight = weight
            .trim()
            .parse::<f64>()
            .map_err(|_| bad_entry(raw, "weight must be a number"))?;
        parsed.push((reps, weight, rpe));
    }

    if parsed.is_empty() {
        return Err(bad_entry(raw, "no sets given"));
    }

    Ok(Entry {
        body_part: part.parse()?,
        name: name.trim().to_string(),
        sets: parsed,
    })
}

async fn cmd_log(stores: &Stores, person: PersonId, raw_entries: &[String], dry_run: bool) -> Result<()> {
    let entries = raw_entries
        .iter()
        .map(|raw| parse_entry(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = SessionBuilder::new();

    for entry in entries {
        if builder.active_body_part() != Some(entry.body_part) {
            if let Err(e) = builder
                .select_body_part(entry.body_part, stores.catalog.as_ref())
                .await
            {
                eprintln!("⚠ {}", e);
            }
        }

        let is_custom = !builder.suggestions().iter().any(|s| *s == entry.name);
        let exercise = match builder.add_exercise(&entry.name, Some(entry.body_part), is_custom) {
            Ok(id) => id,
            Err(e) if e.kind() == ErrorKind::InputRejected => {
                eprintln!("⚠ {} - skipping", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        for (index, (reps, weight, rpe)) in entry.sets.into_iter().enumerate() {
            let set = match index {
                0 => builder
                    .exercise(exercise)
                    .and_then(|ex| ex.sets.first())
                    .map(|s| s.id)
                    .ok_or(Error::UnknownExercise(exercise))?,
                _ => builder.add_set(exercise)?,
            };
            builder.update_set(exercise, set, SetUpdate::Reps(reps))?;
            builder.update_set(exercise, set, SetUpdate::Weight(weight))?;
            if let Some(rpe) = rpe {
                builder.select_rating(exercise, set, rpe)?;
            }
        }
    }

    display_session(&builder);

    if dry_run {
        println!("\n[Dry run - not logging workout]");
        return Ok(());
    }

    let written = builder.submit(person, stores.sets.as_ref()).await?;
    println!("\n✓ Workout logged! ({} sets)", written);
    Ok(())
}

fn display_session(builder: &SessionBuilder) {
    let summary = builder.summary();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TODAY'S WORKOUT");
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  {} {} • {} {}",
        summary.exercises,
        if summary.exercises == 1 { "exercise" } else { "exercises" },
        summary.sets,
        if summary.sets == 1 { "set" } else { "sets" }
    );
    for (part, count) in &summary.by_body_part {
        println!("  {}: {}", part.label(), count);
    }

    for exercise in builder.exercises() {
        println!();
        println!("  {} ({})", exercise.name, exercise.body_part.label());
        for (n, set) in exercise.sets.iter().enumerate() {
            match set.rating {
                Some(rpe) => println!("    {}. {} x {} kg  RPE {}", n + 1, set.reps, set.weight, rpe),
                None => println!("    {}. {} x {} kg", n + 1, set.reps, set.weight),
            }
        }
    }
}

fn cmd_history(data_dir: &Path, person: PersonId, limit: Option<usize>) -> Result<()> {
    let entries: Vec<LoggedSet> = read_set_log(&set_log_path(data_dir))?
        .into_iter()
        .filter(|e| e.record.person_id == person)
        .collect();

    if entries.is_empty() {
        println!("No sets logged yet.");
        return Ok(());
    }

    let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
    for entry in entries.iter().skip(skip) {
        let r = &entry.record;
        let rpe = r
            .rating
            .map(|rpe| format!("  RPE {}", rpe))
            .unwrap_or_default();
        println!(
            "{}  {} #{}: {} x {} kg{}",
            entry.logged_at.format("%Y-%m-%d %H:%M"),
            r.exercise_name,
            r.set_number,
            r.reps,
            r.weight,
            rpe
        );
    }
    Ok(())
}

struct TodayInput {
    sleep: f64,
    energy: u8,
    time: u32,
    targets: Vec<String>,
    notes: Option<String>,
}

async fn cmd_checkin(stores: &Stores, person: PersonId, today: TodayInput) -> Result<()> {
    let mut checkin = CheckIn::new();
    checkin.set_sleep_hours(today.sleep)?;
    checkin.set_energy_level(today.energy)?;
    checkin.set_available_time(today.time);
    for raw in &today.targets {
        let part: BodyPart = raw.parse()?;
        if !checkin.form().targets.contains(&part) {
            checkin.toggle_target(part);
        }
    }
    if let Some(notes) = today.notes {
        checkin.set_notes(notes);
    }

    let record = checkin.submit(person, stores.checkins.as_ref()).await?;

    let targets = match &record.target_workout {
        Some(parts) => parts.iter().map(|p| p.label()).collect::<Vec<_>>().join(", "),
        None => "anything".to_string(),
    };
    println!("✓ Today's condition saved");
    println!(
        "  Sleep {} h • Energy {}/10 • {} min • Target: {}",
        checkin.form().sleep_hours,
        checkin.form().energy_level,
        checkin.form().available_time,
        targets
    );
    Ok(())
}

async fn cmd_profile_show(stores: &Stores, person: PersonId) -> Result<()> {
    let mut editor = ProfileEditor::new();
    if !editor.load(person, stores.profiles.as_ref()).await? {
        println!("No profile yet. Create one with `smartfit profile set`.");
        return Ok(());
    }

    let form = editor.form();
    let system = form.unit_system;
    println!("Profile for {}", person);
    println!("  Units:      {}", system);
    println!("  Height:     {} {}", tidy(&form.height), system.height_unit());
    println!("  Weight:     {} {}", tidy(&form.weight), system.weight_unit());
    if let Some(sex) = form.sex {
        println!("  Sex:        {:?}", sex);
    }
    if !form.age.is_empty() {
        println!("  Age:        {}", form.age);
    }
    if let Some(level) = form.experience_level {
        println!("  Experience: {:?}", level);
    }
    if let Some(goal) = form.primary_goal {
        println!("  Goal:       {:?}", goal);
    }
    println!("  Frequency:  {} days/week", form.weekly_frequency);
    Ok(())
}

/// Round converted values to one decimal for display
fn tidy(value: &str) -> String {
    match value.parse::<f64>() {
        Ok(v) => format!("{}", (v * 10.0).round() / 10.0),
        Err(_) => value.to_string(),
    }
}

struct ProfileChanges {
    units: Option<String>,
    height: Option<String>,
    weight: Option<String>,
    sex: Option<String>,
    age: Option<String>,
    experience: Option<String>,
    goal: Option<String>,
    frequency: Option<u8>,
}

async fn cmd_profile_set(stores: &Stores, person: PersonId, changes: ProfileChanges) -> Result<()> {
    let mut editor = ProfileEditor::new();
    editor.load(person, stores.profiles.as_ref()).await?;

    if let Some(units) = changes.units {
        editor.set_unit_system(units.parse()?);
    }
    if let Some(height) = changes.height {
        editor.set_field(FieldValue::Height(height));
    }
    if let Some(weight) = changes.weight {
        editor.set_field(FieldValue::Weight(weight));
    }
    if let Some(sex) = changes.sex {
        editor.set_field(FieldValue::Sex(Some(sex.parse()?)));
    }
    if let Some(age) = changes.age {
        editor.set_field(FieldValue::Age(age));
    }
    if let Some(level) = changes.experience {
        editor.set_field(FieldValue::ExperienceLevel(Some(level.parse()?)));
    }
    if let Some(goal) = changes.goal {
        editor.set_field(FieldValue::PrimaryGoal(Some(goal.parse()?)));
    }
    if let Some(frequency) = changes.frequency {
        editor.set_field(FieldValue::WeeklyFrequency(frequency));
    }

    if !editor.has_changes() {
        println!("No changes to save.");
        return Ok(());
    }

    match editor.save(person, stores.profiles.as_ref()).await? {
        SaveOutcome::Invalid => {
            for message in editor.errors().values() {
                eprintln!("  - {}", message);
            }
            Err(Error::InvalidChoice(format!(
                "profile not saved ({} invalid fields)",
                editor.errors().len()
            )))
        }
        SaveOutcome::Created => {
            println!("✓ Profile created");
            Ok(())
        }
        SaveOutcome::Updated => {
            println!("✓ Profile saved");
            Ok(())
        }
    }
}
