//! stationdesk - admin console for a music-streaming station catalog

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};

use stationdesk::api::{ApiClient, HttpTransport};
use stationdesk::config::{ClientConfig, Paths};
use stationdesk::models::{SongDraft, TagDraft, UserRole};
use stationdesk::session::{AuthSession, FileTokenStore};
use stationdesk::stores::{SongScope, SongStore, StationStore, TagStore, UserStore};

/// stationdesk - manage users, stations, songs and tags
#[derive(Parser, Debug)]
#[command(name = "stationdesk")]
#[command(version)]
#[command(about = "Admin console for a music-streaming station catalog")]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the catalog service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "free")]
        role: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List users
    Users,
    /// Manage tags
    #[command(subcommand)]
    Tags(TagCommand),
    /// Manage stations
    #[command(subcommand)]
    Stations(StationCommand),
    /// Manage songs
    #[command(subcommand)]
    Songs(SongCommand),
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    List,
    Add { name: String },
    Rename { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum StationCommand {
    List,
    Add {
        name: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Update {
        id: i64,
        name: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum SongCommand {
    List {
        /// Only songs of this station
        #[arg(long)]
        station: Option<i64>,
    },
    Add(SongFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: SongFields,
    },
    Delete { id: i64 },
}

#[derive(ClapArgs, Debug)]
struct SongFields {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    artist: String,
    #[arg(long, default_value = "")]
    genre: String,
    #[arg(long)]
    suno_id: String,
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl From<SongFields> for SongDraft {
    fn from(f: SongFields) -> Self {
        SongDraft {
            title: f.title,
            artist: f.artist,
            genre: f.genre,
            suno_id: f.suno_id,
            tags: f.tags,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},hyper=warn,reqwest=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let paths = Paths::init(args.config)?;
    debug!("Config directory: {:?}", paths.config_dir());

    let mut config = ClientConfig::load()?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    info!("Catalog service at {}", config.base_url);

    let transport = HttpTransport::new(&config.base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let api = ApiClient::new(Arc::new(transport));
    let tokens = Arc::new(FileTokenStore::new(
        paths.credentials_path(),
        config.token_key.clone(),
    ));
    let session = Arc::new(AuthSession::new(api.clone(), tokens));
    session.initialize().await;

    run(args.command, api, session).await
}

async fn run(command: Command, api: ApiClient, session: Arc<AuthSession>) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let user = session
                .sign_in(&username, &password)
                .await
                .context("Sign in failed")?;
            println!("Signed in as {} ({})", user.username, user.role);
        }
        Command::Register {
            username,
            email,
            role,
            password,
        } => {
            let role = UserRole::from_str(&role)
                .with_context(|| format!("Unknown role '{}'", role))?;
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let user = session
                .sign_up(&username, &password, &email, role)
                .await
                .context("Registration failed")?;
            println!("Registered and signed in as {}", user.username);
        }
        Command::Logout => {
            session.sign_out();
            println!("Signed out");
        }
        Command::Whoami => match session.current_user() {
            Some(user) => println!("{} <{}> [{}] id={}", user.username, user.email, user.role, user.id),
            None => println!("Not signed in"),
        },
        Command::Users => {
            let store = UserStore::new(api);
            store.fetch_all(&session.request_context()).await;
            for user in store.items() {
                println!("{:>5}  {:<20} {:<30} {}", user.id, user.username, user.email, user.role);
            }
            check(store.error())?;
        }
        Command::Tags(cmd) => run_tags(cmd, api, &session).await?,
        Command::Stations(cmd) => run_stations(cmd, api, &session).await?,
        Command::Songs(cmd) => run_songs(cmd, api, &session).await?,
    }

    Ok(())
}

async fn run_tags(cmd: TagCommand, api: ApiClient, session: &AuthSession) -> Result<()> {
    let ctx = session.request_context();
    let store = TagStore::new(api);

    match cmd {
        TagCommand::List => {
            store.fetch_all(&ctx).await;
            for tag in store.items() {
                println!("{:>5}  {}", tag.id, tag.name);
            }
        }
        TagCommand::Add { name } => {
            if let Some(tag) = store.create(&ctx, &TagDraft::new(name)).await {
                println!("Added tag {} ({})", tag.name, tag.id);
            }
        }
        TagCommand::Rename { id, name } => {
            store.fetch_all(&ctx).await;
            if let Some(tag) = store.update(&ctx, id, &TagDraft::new(name)).await {
                println!("Renamed tag {} to {}", tag.id, tag.name);
            }
        }
        TagCommand::Delete { id } => {
            if store.remove(&ctx, id).await {
                println!("Deleted tag {}", id);
            }
        }
    }

    check(store.error())
}

async fn run_stations(cmd: StationCommand, api: ApiClient, session: &AuthSession) -> Result<()> {
    let ctx = session.request_context();
    let store = StationStore::new(api);

    match cmd {
        StationCommand::List => {
            store.load(&ctx).await;
            for station in store.stations() {
                println!("{:>5}  {:<30} {}", station.id, station.name, station.tags.join(", "));
            }
        }
        StationCommand::Add { name, tags } => {
            if let Some(station) = store.create(&ctx, &name, tags).await {
                println!("Added station {} ({})", station.name, station.id);
            }
        }
        StationCommand::Update { id, name, tags } => {
            store.load(&ctx).await;
            if let Some(station) = store.update(&ctx, id, &name, tags).await {
                println!("Updated station {} ({})", station.name, station.id);
            }
        }
        StationCommand::Delete { id } => {
            if store.remove(&ctx, id).await {
                println!("Deleted station {}", id);
            }
        }
    }

    check(store.error())
}

async fn run_songs(cmd: SongCommand, api: ApiClient, session: &AuthSession) -> Result<()> {
    let ctx = session.request_context();
    let state = session.state();
    let store = SongStore::new(api);

    match cmd {
        SongCommand::List { station } => {
            let scope = station.map_or(SongScope::All, SongScope::Station);
            if matches!(scope, SongScope::Station(_)) && state.user().is_none() {
                bail!("Listing station songs requires a signed-in user");
            }
            store.sync(scope, &state, &ctx).await;
            for song in store.songs() {
                println!(
                    "{:>5}  {:<30} {:<20} {:<12} {}",
                    song.id,
                    song.title,
                    song.artist,
                    song.genre,
                    song.tag_names().join(", ")
                );
            }
        }
        SongCommand::Add(fields) => {
            if let Some(song) = store.create(&ctx, &fields.into()).await {
                println!("Added song {} ({})", song.title, song.id);
            }
        }
        SongCommand::Update { id, fields } => {
            store.sync(SongScope::All, &state, &ctx).await;
            if let Some(song) = store.update(&ctx, id, &fields.into()).await {
                println!("Updated song {} ({})", song.title, song.id);
            }
        }
        SongCommand::Delete { id } => {
            if store.remove(&ctx, id).await {
                println!("Deleted song {}", id);
            }
        }
    }

    check(store.error())
}

/// Turn a store's error slot into a process error
fn check(error: Option<String>) -> Result<()> {
    match error {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
