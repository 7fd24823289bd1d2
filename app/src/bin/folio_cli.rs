use api_client::{ApiClient, ImageFile, PhotoStatus, RecordStore};
use auth::{default_store, AuthClient, USE_FILE_STORE_ENV};
use clap::{Args, Parser, Subcommand};
use gallery::{
    render, AdminController, Anchor, Direction, Effect, FilterValue, Gallery, GalleryCard,
    GalleryEvent, ImageSource, Key, Notice, PhotoForm, ViewerEvent,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[path = "../config.rs"]
#[allow(dead_code)]
mod config;
#[path = "../logging.rs"]
mod logging;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "folio_cli", author, version, about = "Folio portfolio admin CLI")]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Base URL of the backend service
    #[arg(long)]
    store_url: Option<String>,
    /// Public (anon) API key of the backend service
    #[arg(long)]
    anon_key: Option<String>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Keep the login session in ~/.folio/session.json instead of the system keyring
    #[arg(long)]
    use_file_store: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct PhotoFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Date taken, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    /// Comma separated tags
    #[arg(long)]
    tags: Option<String>,
    #[arg(long)]
    status: Option<PhotoStatus>,
    /// Use an external image URL
    #[arg(long, conflicts_with = "file")]
    image_url: Option<String>,
    /// Upload a local image file
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List photos, newest first
    List {
        /// Only photos with this status
        #[arg(long)]
        status: Option<PhotoStatus>,
        /// Only photos carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show one photo as JSON
    Show { id: String },
    /// Search titles and descriptions
    Search { query: String },
    /// Add a photo
    Create(PhotoFields),
    /// Change fields of an existing photo
    Update {
        id: String,
        #[command(flatten)]
        fields: PhotoFields,
    },
    /// Copy a photo under a new id
    Duplicate { id: String },
    /// Delete a photo after confirmation
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Sign in as an administrator
    Login {
        #[arg(long)]
        email: String,
        /// Falls back to FOLIO_PASSWORD, then a prompt
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in administrator
    Whoami,
    /// Walk through the gallery in the terminal
    Browse {
        /// Start with this tag filter selected
        #[arg(long)]
        tag: Option<String>,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let overrides = config::FolioConfigOverrides {
        log_level: cli.log_level.clone(),
        store_url: cli.store_url.clone(),
        anon_key: cli.anon_key.clone(),
        debug_console: cli.debug_console,
        use_file_store: cli.use_file_store,
        ..Default::default()
    };
    let cfg = config::FolioConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    let _guard = logging::init(&cfg.cache_path, "folio_cli.log", &cfg.log_level, cfg.debug_console);
    if cfg.missing_span_support() {
        tracing::warn!("trace_spans is set but this build lacks the `trace-spans` feature");
    }
    if cfg.use_file_store {
        std::env::set_var(USE_FILE_STORE_ENV, "1");
    }
    cfg.require_store()?;

    let auth = AuthClient::new(cfg.store_url.clone(), cfg.anon_key.clone(), default_store());
    let public = ApiClient::new(cfg.store_url.clone(), cfg.anon_key.clone());

    match cli.command {
        Commands::List { status, tag } => {
            let mut admin = AdminController::new(public.clone(), public);
            admin.filter_by_status(status).await?;
            let filter = tag.as_deref().map_or(FilterValue::All, FilterValue::parse);
            let cards: Vec<GalleryCard> = admin
                .cards()
                .into_iter()
                .filter(|c| filter.matches(&c.tags))
                .collect();
            print_cards(&cards);
        }
        Commands::Show { id } => match public.get(&id).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("Photo not found: {}", id),
        },
        Commands::Search { query } => {
            let mut admin = AdminController::new(public.clone(), public);
            admin.load().await?;
            admin.search(&query).await?;
            print_cards(&admin.cards());
        }
        Commands::Create(fields) => {
            let client = authorized(&auth, public).await?;
            let mut admin = AdminController::new(client.clone(), client);
            admin.open_create();
            fill_form(&mut admin, fields).await?;
            let record = admin.submit().await?;
            report(&admin);
            println!("{} | {}", record.id, record.title);
        }
        Commands::Update { id, fields } => {
            let client = authorized(&auth, public).await?;
            let mut admin = AdminController::new(client.clone(), client);
            admin.load().await?;
            admin.edit(&id)?;
            fill_form(&mut admin, fields).await?;
            let record = admin.submit().await?;
            report(&admin);
            println!("{} | {}", record.id, record.title);
        }
        Commands::Duplicate { id } => {
            let client = authorized(&auth, public).await?;
            let mut admin = AdminController::new(client.clone(), client);
            admin.load().await?;
            admin.duplicate(&id)?;
            let record = admin.submit().await?;
            report(&admin);
            println!("{} | {}", record.id, record.title);
        }
        Commands::Delete { id, yes } => {
            let client = authorized(&auth, public).await?;
            let mut admin = AdminController::new(client.clone(), client);
            admin.load().await?;
            let message = admin.request_delete(&id)?.message.clone();
            println!("{}", message);
            if yes || confirm("Type 'yes' to confirm: ")? {
                admin.confirm_delete().await?;
                report(&admin);
            } else {
                admin.cancel_delete();
                println!("Cancelled");
            }
        }
        Commands::Login { email, password } => {
            let password = match password.or_else(|| std::env::var("FOLIO_PASSWORD").ok()) {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let session = auth.sign_in(&email, &password).await?;
            println!("Signed in as {}", session.user.display_name());
        }
        Commands::Logout => {
            auth.sign_out().await?;
            println!("Signed out");
        }
        Commands::Whoami => match auth.get_session().await? {
            Some(session) => println!(
                "{} <{}>",
                session.user.display_name(),
                session.user.email.as_deref().unwrap_or("no email")
            ),
            None => println!("Not signed in"),
        },
        Commands::Browse { tag } => {
            let records = public.list(None).await?;
            browse(records, tag).await?;
        }
    }

    Ok(())
}

async fn authorized(auth: &AuthClient, client: ApiClient) -> CliResult<ApiClient> {
    let session = auth
        .get_session()
        .await?
        .ok_or("Not signed in. Run `folio_cli login` first.")?;
    Ok(client.with_access_token(session.access_token))
}

async fn fill_form(admin: &mut AdminController<ApiClient, ApiClient>, fields: PhotoFields) -> CliResult<()> {
    apply_fields(admin.form_mut(), &fields);
    if let Some(path) = &fields.file {
        let file = ImageFile::from_path(path).await?;
        admin.set_image_source(ImageSource::Upload);
        admin.select_file(file)?;
    }
    Ok(())
}

fn apply_fields(form: &mut PhotoForm, fields: &PhotoFields) {
    let set = |target: &mut String, value: &Option<String>| {
        if let Some(v) = value {
            *target = v.clone();
        }
    };
    set(&mut form.title, &fields.title);
    set(&mut form.description, &fields.description);
    set(&mut form.price, &fields.price);
    set(&mut form.location, &fields.location);
    set(&mut form.date, &fields.date);
    set(&mut form.tags, &fields.tags);
    if let Some(status) = fields.status {
        form.status = status;
    }
    if let Some(url) = &fields.image_url {
        form.image_source = ImageSource::Url;
        form.image_url = url.clone();
    }
}

fn report<S, F>(admin: &AdminController<S, F>)
where
    S: RecordStore,
    F: api_client::FileStorage,
{
    match admin.notice() {
        Some(Notice::Success(msg)) => println!("{}", msg),
        Some(Notice::Error(msg)) => eprintln!("{}", msg),
        None => {}
    }
}

fn print_cards(cards: &[GalleryCard]) {
    if cards.is_empty() {
        println!("No photos found");
        return;
    }
    for card in cards {
        let sold = if card.sold { " | sold" } else { "" };
        println!(
            "{} | {} | {} | {}{}",
            card.id,
            card.title,
            card.price_label,
            card.tags.join(", "),
            sold
        );
    }
}

fn prompt(label: &str) -> CliResult<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(label: &str) -> CliResult<bool> {
    let answer = prompt(label)?;
    Ok(answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("y"))
}

const BROWSE_HELP: &str = "commands: filter <tag|all>, open <id>, details <id>, large, next, prev, close, backdrop, esc, list, help, quit";

fn browse_event(line: &str) -> Option<GalleryEvent> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;
    let arg = parts.next().map(str::to_string);
    let viewer = |event| Some(GalleryEvent::Viewer(event));
    match (command, arg) {
        ("filter", Some(value)) => Some(GalleryEvent::Filter(FilterValue::parse(&value))),
        ("open", Some(id)) => viewer(ViewerEvent::Select { id }),
        ("details", Some(id)) => viewer(ViewerEvent::ShowDetails { id }),
        ("large", _) => viewer(ViewerEvent::ViewLarge),
        ("next", _) => viewer(ViewerEvent::Navigate(Direction::Next)),
        ("prev", _) => viewer(ViewerEvent::Navigate(Direction::Prev)),
        ("right", _) => viewer(ViewerEvent::Key(Key::ArrowRight)),
        ("left", _) => viewer(ViewerEvent::Key(Key::ArrowLeft)),
        ("esc", _) => viewer(ViewerEvent::Key(Key::Escape)),
        ("close", _) => viewer(ViewerEvent::CloseControl),
        ("backdrop", _) => viewer(ViewerEvent::BackdropClick),
        _ => None,
    }
}

fn describe(gallery: &Gallery) -> String {
    let view = render(gallery);
    if let Some(full) = &view.fullscreen {
        let mut line = format!(
            "[fullscreen {}/{}] {}",
            full.position.0, full.position.1, full.alt
        );
        if full.show_prev {
            line.push_str(" <prev");
        }
        if full.show_next {
            line.push_str(" next>");
        }
        if let Some(info) = &full.info {
            for field in [&info.description, &info.price, &info.location]
                .into_iter()
                .flatten()
            {
                line.push_str(&format!("\n  {}", field));
            }
        }
        if !full.classes.is_empty() {
            line.push_str(&format!(" {:?}", full.classes));
        }
        return line;
    }
    if let Some(detail) = &view.detail {
        return format!(
            "[detail] {} | {} | {} | {}",
            detail.title.as_deref().unwrap_or(""),
            detail.price,
            detail.location,
            detail.tags.join(", ")
        );
    }
    let visible: Vec<&str> = view
        .cards
        .iter()
        .filter(|c| c.visible)
        .map(|c| c.card.id.as_str())
        .collect();
    format!(
        "[grid] filter={} visible={}",
        gallery.filters().active(),
        visible.join(",")
    )
}

fn schedule(effects: Vec<Effect>, tx: &mpsc::UnboundedSender<GalleryEvent>) {
    for effect in effects {
        if let Effect::Schedule {
            timer,
            epoch,
            after,
        } = effect
        {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = tx.send(GalleryEvent::timer(timer, epoch));
            });
        }
    }
}

async fn browse(records: Vec<api_client::PhotoRecord>, tag: Option<String>) -> CliResult<()> {
    let mut gallery = Gallery::setup(records, Anchor::ALL);
    for effect in gallery.start() {
        if let Effect::Schedule { timer, epoch, after } = effect {
            tokio::time::sleep(after).await;
            gallery.handle(GalleryEvent::timer(timer, epoch));
        }
    }
    if let Some(tag) = tag {
        gallery.handle(GalleryEvent::Filter(FilterValue::parse(&tag)));
    }
    println!("{}", BROWSE_HELP);
    println!("{}", describe(&gallery));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                match line {
                    "" => continue,
                    "quit" | "q" => break,
                    "help" => println!("{}", BROWSE_HELP),
                    "list" => print_cards(gallery.cards()),
                    _ => match browse_event(line) {
                        Some(event) => {
                            let effects = gallery.handle(event);
                            schedule(effects, &tx);
                            println!("{}", describe(&gallery));
                        }
                        None => println!("Unknown command: {}", line),
                    },
                }
            }
            Some(event) = rx.recv() => {
                gallery.handle(event);
                println!("{}", describe(&gallery));
            }
        }
    }
    Ok(())
}
