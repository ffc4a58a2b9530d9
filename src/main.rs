use analyzer::{Analyzer, HeadToHead};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, ConfigArgs, init_tracing};
use core_types::{Championship, Driver, QualifyingFormat, RankingEntry, RoundNumber, SessionType};
use database::{DbRepository, connect, run_migrations};
use engine::{RoundCompletion, SeasonEngine};
use rust_decimal::Decimal;
use standings::PointsTable;
use std::collections::HashMap;

/// The main entry point for the gridstats championship tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; everything has a default.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = cli.config.load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging).context("Failed to initialise logging")?;

    // Initialize the database connection and run migrations
    let db_pool = connect(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    let db_repo = DbRepository::new(db_pool);

    // Execute the appropriate command
    match cli.command {
        Commands::Init => handle_init(&config, &db_repo).await,
        Commands::ImportDrivers => {
            let summary = importer::import_drivers(&db_repo, &config.data.drivers_file).await?;
            println!("Drivers: {} added, {} already known.", summary.added, summary.skipped);
            Ok(())
        }
        Commands::ImportConstructors => {
            let summary =
                importer::import_constructors(&db_repo, &config.data.constructors_file).await?;
            println!("Constructors: {} added, {} already known.", summary.added, summary.skipped);
            Ok(())
        }
        Commands::ImportRounds => {
            let summary = importer::import_rounds(&db_repo, &config.data.rounds_file).await?;
            println!("Rounds: {} added, {} already known.", summary.added, summary.skipped);
            Ok(())
        }
        Commands::AddDriver(args) => handle_add_driver(args, &config, &db_repo).await,
        Commands::AddResults(args) => handle_add_results(args, &config, &db_repo).await,
        Commands::CompleteRound(args) => {
            let engine = SeasonEngine::new(db_repo, &config.contention);
            handle_complete_round(args.round, &engine).await
        }
        Commands::Rounds => {
            let engine = SeasonEngine::new(db_repo, &config.contention);
            handle_rounds(&engine).await
        }
        Commands::Standings(args) => {
            let engine = SeasonEngine::new(db_repo, &config.contention);
            handle_standings(args, &engine).await
        }
        Commands::HeadToHead(args) => handle_head_to_head(args, &db_repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks a racing championship: results, standings and head-to-heads.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and import drivers, constructors and rounds.
    Init,
    /// Import the drivers file.
    ImportDrivers,
    /// Import the constructors file.
    ImportConstructors,
    /// Import the rounds file.
    ImportRounds,
    /// Add a single driver to the roster and the drivers file.
    AddDriver(AddDriverArgs),
    /// Store one session's result sheet.
    AddResults(AddResultsArgs),
    /// Mark a round as completed and compute both championship tables.
    CompleteRound(RoundArgs),
    /// List the calendar with the state of every round.
    Rounds,
    /// Show a championship table after a completed round.
    Standings(StandingsArgs),
    /// Compare two drivers over the qualifying segments they both contested.
    HeadToHead(HeadToHeadArgs),
}

#[derive(Args)]
struct AddDriverArgs {
    /// Full name, e.g. "Lando Norris".
    #[arg(long)]
    name: String,

    /// Three upper-case letters, e.g. "NOR".
    #[arg(long)]
    trigramme: String,

    /// Between 1 and 99.
    #[arg(long)]
    car_number: u32,

    #[arg(long)]
    nationality: String,
}

#[derive(Args)]
struct AddResultsArgs {
    #[arg(long)]
    round: RoundNumber,

    /// Q1, Q2, Q3, SQ1, SQ2, SQ3, Sprint or Race.
    #[arg(long)]
    session: SessionType,

    /// The sheet's file name inside the results folder.
    #[arg(long)]
    file: String,
}

#[derive(Args)]
struct RoundArgs {
    #[arg(long)]
    round: RoundNumber,
}

#[derive(Args)]
struct StandingsArgs {
    #[arg(long)]
    round: RoundNumber,

    /// Show the constructors' table instead of the drivers'.
    #[arg(long)]
    constructors: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HeadToHeadArgs {
    #[arg(long)]
    driver1: String,

    #[arg(long)]
    driver2: String,

    /// Compare sprint qualifying (SQ1-SQ3) instead of Q1-Q3.
    #[arg(long)]
    sprint: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_init(config: &Config, db_repo: &DbRepository) -> anyhow::Result<()> {
    let drivers = importer::import_drivers(db_repo, &config.data.drivers_file)
        .await
        .context("Failed to import drivers")?;
    let constructors = importer::import_constructors(db_repo, &config.data.constructors_file)
        .await
        .context("Failed to import constructors")?;
    let rounds = importer::import_rounds(db_repo, &config.data.rounds_file)
        .await
        .context("Failed to import rounds")?;

    println!("Database ready at {}", config.database.url);
    println!(
        "Imported {} drivers, {} constructors and {} rounds.",
        drivers.added, constructors.added, rounds.added
    );
    Ok(())
}

async fn handle_add_driver(
    args: AddDriverArgs,
    config: &Config,
    db_repo: &DbRepository,
) -> anyhow::Result<()> {
    let driver = Driver {
        name: args.name,
        trigramme: args.trigramme,
        car_number: args.car_number,
        nationality: args.nationality,
    };
    importer::add_driver(db_repo, &config.data.drivers_file, &driver).await?;
    println!("Added #{} {} ({}).", driver.car_number, driver.name, driver.trigramme);
    Ok(())
}

async fn handle_add_results(
    args: AddResultsArgs,
    config: &Config,
    db_repo: &DbRepository,
) -> anyhow::Result<()> {
    let path = config.data.results_folder.join(&args.file);
    let points_table = PointsTable::from_settings(&config.scoring);

    let stored = importer::ingest_session(db_repo, &points_table, args.round, args.session, &path)
        .await
        .with_context(|| {
            format!("Failed to add {} results for round {}", args.session, args.round)
        })?;

    println!("Stored {stored} {} results for round {}.", args.session, args.round);
    Ok(())
}

async fn handle_complete_round(round: RoundNumber, engine: &SeasonEngine) -> anyhow::Result<()> {
    let RoundCompletion {
        round_number,
        remaining,
        drivers,
        constructors,
    } = engine
        .complete_round(round)
        .await
        .with_context(|| format!("Failed to complete round {round}"))?;

    println!(
        "Round {round_number} completed. {} races and {} sprints remain.",
        remaining.races, remaining.sprints
    );
    let names = EntrantNames::load(engine.repository()).await?;
    println!("{}", ranking_table(&drivers, names.of(Championship::Drivers)));
    println!("{}", ranking_table(&constructors, names.of(Championship::Constructors)));
    Ok(())
}

async fn handle_rounds(engine: &SeasonEngine) -> anyhow::Result<()> {
    let statuses = engine.season_status().await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Round", "Name", "Date", "Type", "State", "Results"]);
    for status in statuses {
        table.add_row(vec![
            status.round.round_number.to_string(),
            status.round.round_name,
            status.round.round_date.to_string(),
            status.round.round_type.to_string(),
            format!("{:?}", status.state),
            status.stored_results.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_standings(args: StandingsArgs, engine: &SeasonEngine) -> anyhow::Result<()> {
    let championship = if args.constructors {
        Championship::Constructors
    } else {
        Championship::Drivers
    };
    let entries = engine
        .standings(championship, args.round)
        .await
        .with_context(|| format!("Failed to load the {championship} standings"))?;
    let names = EntrantNames::load(engine.repository()).await?;
    let names = names.of(championship);

    if args.json {
        let rows: Vec<_> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "position": entry.position,
                    "entrant": entry.entrant_key,
                    "name": names.get(&entry.entrant_key),
                    "points": entry.points,
                    "title_contention": entry.title_contention,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", ranking_table(&entries, names));
    }
    Ok(())
}

async fn handle_head_to_head(args: HeadToHeadArgs, db_repo: &DbRepository) -> anyhow::Result<()> {
    let format = if args.sprint {
        QualifyingFormat::SprintShootout
    } else {
        QualifyingFormat::GrandPrix
    };
    let h2h = Analyzer::new(format)
        .run(db_repo, &args.driver1, &args.driver2)
        .await
        .context("Failed to compare drivers")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&h2h)?);
    } else {
        println!("{}", head_to_head_table(&h2h));
    }
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

/// Display names, keyed by car number and by paddock number.
struct EntrantNames {
    drivers: HashMap<u32, String>,
    constructors: HashMap<u32, String>,
}

impl EntrantNames {
    async fn load(db_repo: &DbRepository) -> anyhow::Result<Self> {
        let drivers = db_repo
            .get_all_drivers()
            .await?
            .into_iter()
            .map(|d| (d.car_number, format!("{} ({})", d.name, d.trigramme)))
            .collect();
        let constructors = db_repo
            .get_all_constructors()
            .await?
            .into_iter()
            .map(|c| (c.paddock_number, c.short_name))
            .collect();
        Ok(Self {
            drivers,
            constructors,
        })
    }

    fn of(&self, championship: Championship) -> &HashMap<u32, String> {
        match championship {
            Championship::Drivers => &self.drivers,
            Championship::Constructors => &self.constructors,
        }
    }
}

fn ranking_table(entries: &[RankingEntry], names: &HashMap<u32, String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Pos", "No", "Name", "Points", "Title"]);
    for entry in entries {
        table.add_row(vec![
            entry.position.to_string(),
            entry.entrant_key.to_string(),
            names.get(&entry.entrant_key).cloned().unwrap_or_default(),
            entry.points.to_string(),
            if entry.title_contention { "yes" } else { "no" }.to_string(),
        ]);
    }
    table
}

fn head_to_head_table(h2h: &HeadToHead) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Segment".to_string(),
        h2h.driver1.trigramme.clone(),
        h2h.driver2.trigramme.clone(),
        "Compared".to_string(),
        format!("Mean gap {} to {} (s)", h2h.driver1.trigramme, h2h.driver2.trigramme),
    ]);
    for segment in &h2h.segments {
        table.add_row(vec![
            segment.session.to_string(),
            segment.driver1_ahead.to_string(),
            segment.driver2_ahead.to_string(),
            segment.compared.to_string(),
            format_delta(segment.mean_delta),
        ]);
    }
    table
}

fn format_delta(delta: Option<Decimal>) -> String {
    match delta {
        Some(delta) => format!("{:+}", delta.round_dp(3)),
        None => "-".to_string(),
    }
}
