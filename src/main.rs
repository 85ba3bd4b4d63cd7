use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use classroom_assigner::config::AppConfig;
use classroom_assigner::display::{print_result, write_result_to_file};
use classroom_assigner::history::{AssignerKind, AssignerRecord, HistoryStore, JsonFileHistoryStore, SeatZone};
use classroom_assigner::orchestrator::Orchestrator;
use classroom_assigner::roster::CsvRosterProvider;
use classroom_assigner::web;

#[derive(Parser, Debug)]
#[command(name = "classroom-assigner")]
#[command(version)]
#[command(about = "Fair rotation of classroom duties and seats")]
struct Args {
    /// Directory holding one JSON record per assigner
    #[arg(long, env = "ASSIGNER_DATA_DIR", default_value = "data/assigners")]
    data_dir: PathBuf,

    /// Directory holding one roster CSV per class
    #[arg(long, env = "ASSIGNER_ROSTER_DIR", default_value = "data/rosters")]
    roster_dir: PathBuf,

    /// Fixed random seed for reproducible runs
    #[arg(long, env = "ASSIGNER_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long, env = "ASSIGNER_PORT", default_value = "8080")]
        port: u16,
    },

    /// Create a new assigner
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// random, rotation or seat
        #[arg(long, value_parser = parse_kind)]
        kind: AssignerKind,
        /// Comma-separated items; repeat a job to need two students for it
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,
        /// Seat zone as "Name:1,2,3" (repeatable)
        #[arg(long = "zone", value_parser = parse_zone)]
        zones: Vec<SeatZone>,
    },

    /// Run an assigner for a class
    Run {
        #[arg(long)]
        user: String,
        #[arg(long = "class")]
        class_id: String,
        #[arg(long = "assigner")]
        assigner_id: String,
        /// Comma-separated group ids
        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,
        /// Also write the result to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_kind(s: &str) -> Result<AssignerKind, String> {
    AssignerKind::parse(s).ok_or_else(|| format!("unknown assigner kind: {}", s))
}

fn parse_zone(s: &str) -> Result<SeatZone, String> {
    let (name, seats) = s
        .split_once(':')
        .ok_or_else(|| format!("zone must look like Name:1,2,3, got {}", s))?;
    let seats: Vec<String> = seats
        .split(',')
        .map(|seat| seat.trim().to_string())
        .filter(|seat| !seat.is_empty())
        .collect();
    if name.trim().is_empty() || seats.is_empty() {
        return Err(format!("zone needs a name and seats, got {}", s));
    }
    Ok(SeatZone {
        name: name.trim().to_string(),
        seats,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig {
        data_dir: args.data_dir,
        roster_dir: args.roster_dir,
        seed: args.seed,
        ..Default::default()
    };

    let store: Arc<dyn HistoryStore> = Arc::new(JsonFileHistoryStore::new(&config.data_dir));
    let roster = Arc::new(CsvRosterProvider::new(&config.roster_dir));

    match args.command {
        Commands::Serve { port } => {
            config.port = port;
            let orchestrator = Orchestrator::new(roster, store, config.rng());
            println!("Access the API at http://localhost:{}", config.port);
            web::start_server(config.port, orchestrator).await?;
        }
        Commands::Create {
            user,
            id,
            name,
            kind,
            items,
            zones,
        } => {
            let items: Vec<String> = items.into_iter().filter(|i| !i.trim().is_empty()).collect();
            if items.is_empty() {
                return Err("an assigner needs at least one item".into());
            }
            let record = AssignerRecord::new(&id, &user, &name, kind, items).with_zones(zones);
            store.create(record).await?;
            println!("Created {} assigner \"{}\" ({})", kind, name, id);
        }
        Commands::Run {
            user,
            class_id,
            assigner_id,
            groups,
            out,
        } => {
            let orchestrator = Orchestrator::new(roster, store, config.rng());
            let response = orchestrator
                .run_assigner(&user, &class_id, &assigner_id, &groups)
                .await;

            match response.data {
                Some(data) => {
                    print_result(&data.name, &data.assigned_data);
                    if let Some(path) = out {
                        write_result_to_file(&data.name, &data.assigned_data, &path)?;
                        println!("Result saved to {}", path.display());
                    }
                }
                None => {
                    let message = response.message.unwrap_or_default();
                    return Err(message.into());
                }
            }
        }
    }

    Ok(())
}
