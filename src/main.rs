use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use socio::api::{ApiClient, NotificationApi};
use socio::campus::{should_prompt, CampusResolver, ResolverCallbacks, ResolverState};
use socio::config::{self, Config};
use socio::cooldown::CooldownGate;
use socio::geo::CampusDirectory;
use socio::identity::Identity;
use socio::models::notification::NotificationFeedState;
use socio::notification::{spawn_feed, DesktopAlerts, NotificationStore, PermissionPrompt};
use socio::platform::{
    Clock, FileStore, FixedLocation, KeyValueStore, LocationProvider, MemoryStore, NoLocation,
    SystemClock, TerminalNotifier,
};

mod cli;

/// Everything a command needs, built once from config and flags.
struct App {
    cfg: Config,
    api: ApiClient,
    identity: Identity,
    durable: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl App {
    fn require_signed_in(&self) -> anyhow::Result<()> {
        if !self.identity.is_signed_in() {
            anyhow::bail!("not signed in: pass --email or set SOCIO_EMAIL");
        }
        Ok(())
    }

    fn campus_gate(&self) -> CooldownGate {
        CooldownGate::campus(self.durable.clone(), self.clock.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "socio=info".into()),
    );
    let json = std::env::var("SOCIO_LOG_FORMAT").map_or(false, |v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let app = App {
        api: ApiClient::new(cfg.api_url.clone(), cfg.http_timeout)?,
        identity: Identity::new(args.auth.email.unwrap_or_default(), args.auth.token),
        durable: Arc::new(FileStore::open(&cfg.state_file)),
        clock: Arc::new(SystemClock),
        cfg,
    };

    let result = match args.command {
        cli::Commands::Campus { command } => handle_campus_command(command, &app).await,
        cli::Commands::Notifications { command } => {
            handle_notification_command(command, &app).await
        }
        cli::Commands::Registrations => handle_registrations(&app).await,
        cli::Commands::Profile => handle_profile(&app).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

type StdinLines = Lines<BufReader<Stdin>>;

fn stdin_lines() -> StdinLines {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn ask(lines: &mut StdinLines, prompt: &str) -> anyhow::Result<Option<String>> {
    println!("{}", prompt);
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn handle_campus_command(cmd: cli::CampusCommands, app: &App) -> anyhow::Result<()> {
    match cmd {
        cli::CampusCommands::Detect { lat, lng, force } => {
            app.require_signed_in()?;
            let gate = app.campus_gate();

            match app.api.fetch_profile(&app.identity).await {
                Ok(profile) => {
                    if let Some(campus) = profile.campus.as_deref().filter(|c| !c.is_empty()) {
                        println!("Campus already set: {}", campus);
                        return Ok(());
                    }
                    if !force && !should_prompt(Some(&profile), &gate) {
                        println!("Campus detection is not needed right now (use --force to run anyway).");
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not load profile, continuing");
                    if !force && gate.is_dismissed_recently() {
                        println!("Campus detection was dismissed recently (use --force to run anyway).");
                        return Ok(());
                    }
                }
            }

            let location: Arc<dyn LocationProvider> = match (lat, lng) {
                (Some(lat), Some(lng)) => Arc::new(FixedLocation::at(lat, lng)),
                _ => Arc::new(NoLocation),
            };
            run_campus_flow(app, gate, location).await
        }
        cli::CampusCommands::Status => {
            let gate = app.campus_gate();
            if app.identity.is_signed_in() {
                let profile = app
                    .api
                    .fetch_profile(&app.identity)
                    .await
                    .context("failed to load profile")?;
                println!("Campus: {}", profile.campus.as_deref().unwrap_or("(not set)"));
                println!("Needs campus: {}", profile.needs_campus());
            }
            match gate.suppressed_until() {
                Some(until) => {
                    let until = chrono::DateTime::from_timestamp_millis(until)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| until.to_string());
                    println!("Prompt suppressed until {}", until);
                }
                _ => println!("Prompt not suppressed"),
            }
            Ok(())
        }
        cli::CampusCommands::List => {
            let directory = CampusDirectory::with_threshold(app.cfg.max_campus_distance_km);
            for campus in directory.campuses() {
                println!("{:<28} {:>9.4} {:>9.4}", campus.name, campus.lat, campus.lng);
            }
            println!("Detection radius: {} km", directory.max_distance_km());
            Ok(())
        }
    }
}

async fn run_campus_flow(
    app: &App,
    gate: CooldownGate,
    location: Arc<dyn LocationProvider>,
) -> anyhow::Result<()> {
    let callbacks = ResolverCallbacks::new(
        |campus| println!("Campus saved: {}", campus),
        || println!("Campus detection dismissed. We'll ask again later."),
    );
    let mut resolver = CampusResolver::new(
        app.identity.clone(),
        CampusDirectory::with_threshold(app.cfg.max_campus_distance_km),
        location,
        Arc::new(app.api.clone()),
        gate,
        callbacks,
    )
    .with_success_delay(app.cfg.success_delay);

    let mut lines = stdin_lines();
    println!("Detecting campus...");
    resolver.detect().await?;

    loop {
        let state = resolver.state().clone();
        match &state {
            ResolverState::Detecting => {
                resolver.detect().await?;
            }
            ResolverState::Confirm { resolution } => {
                let prompt = format!(
                    "Detected {} ({} km away). Is this your campus? [y]es / [n]o / [r]etry",
                    resolution.campus.name,
                    resolution.display_distance()
                );
                match ask(&mut lines, &prompt).await?.as_deref() {
                    Some("y") | Some("yes") => {
                        resolver.accept()?;
                    }
                    Some("r") | Some("retry") => {
                        resolver.detect().await?;
                    }
                    Some("n") | Some("no") | None => {
                        resolver.reject()?;
                    }
                    Some(_) => {}
                }
            }
            ResolverState::FinalConfirm { resolution, .. } => {
                let prompt = format!(
                    "Your campus can't be changed once saved. Type YES to save {}, or 'back'.",
                    resolution.campus.name
                );
                match ask(&mut lines, &prompt).await? {
                    None => return Ok(()),
                    Some(line) if line.eq_ignore_ascii_case("back") => {
                        resolver.back()?;
                    }
                    Some(line) => {
                        if resolver.type_confirmation(&line)? {
                            println!("Saving...");
                            resolver.save().await?;
                        } else {
                            println!("Type YES exactly to continue.");
                        }
                    }
                }
            }
            ResolverState::NotOnCampus { .. } => {
                print_outcome(&state);
                ask(&mut lines, "Press Enter to close.").await?;
                resolver.acknowledge()?;
            }
            ResolverState::Error { .. } => {
                print_outcome(&state);
                match ask(&mut lines, "[r]etry / try [l]ater").await?.as_deref() {
                    Some("r") | Some("retry") => {
                        resolver.detect().await?;
                    }
                    Some("l") | Some("later") | None => {
                        resolver.try_later()?;
                    }
                    Some(_) => {}
                }
            }
            ResolverState::Saving { .. } | ResolverState::Success { .. } | ResolverState::Dismissed => {
                return Ok(());
            }
        }
    }
}

fn print_outcome(state: &ResolverState) {
    if let Some(title) = state.title() {
        println!("{}", title);
    }
    if let Some(message) = state.message() {
        println!("  {}", message);
    }
}

async fn handle_notification_command(
    cmd: cli::NotificationCommands,
    app: &App,
) -> anyhow::Result<()> {
    app.require_signed_in()?;

    match cmd {
        cli::NotificationCommands::List { page, limit } => {
            let limit = limit.unwrap_or(app.cfg.notification_limit);
            let mut store =
                NotificationStore::new(app.identity.clone(), Arc::new(app.api.clone()))
                    .with_page(page, limit);
            store
                .try_refresh()
                .await
                .context("failed to load notifications")?;
            print_feed(store.state());
        }
        // One-shot commands wait for the backend; only the long-lived feed
        // in `watch` applies changes optimistically.
        cli::NotificationCommands::Read { id } => {
            app.api.mark_one_read(&app.identity, &id).await?;
            println!("Marked {} read", id);
        }
        cli::NotificationCommands::ReadAll => {
            app.api.mark_all_read(&app.identity).await?;
            println!("Marked all notifications read");
        }
        cli::NotificationCommands::Dismiss { id } => {
            app.api.delete_one(&app.identity, &id).await?;
            println!("Dismissed {}", id);
        }
        cli::NotificationCommands::DismissAll => {
            app.api.delete_all(&app.identity).await?;
            println!("Dismissed all notifications");
        }
        cli::NotificationCommands::Watch => watch_feed(app).await?,
    }
    Ok(())
}

async fn watch_feed(app: &App) -> anyhow::Result<()> {
    let notifier = Arc::new(TerminalNotifier);

    let prompt = PermissionPrompt::new(notifier.clone(), app.durable.clone(), app.clock.clone());
    if prompt.should_show() {
        println!("Enabling desktop notifications...");
        prompt.enable().await;
    }

    let alerts = DesktopAlerts::new(notifier, Arc::new(MemoryStore::new()));
    let store = NotificationStore::new(app.identity.clone(), Arc::new(app.api.clone()))
        .with_page(1, app.cfg.notification_limit)
        .with_alerts(alerts);
    let handle = spawn_feed(store, app.cfg.poll_interval);
    let mut updates = handle.subscribe();
    let mut lines = stdin_lines();

    println!("Commands: r <id> | ra | d <id> | da | f (refresh) | q");
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_feed(&state);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let mut parts = line.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some("r"), Some(id)) => handle.mark_read(id),
                    (Some("ra"), _) => handle.mark_all_read(),
                    (Some("d"), Some(id)) => handle.dismiss(id),
                    (Some("da"), _) => handle.dismiss_all(),
                    (Some("f"), _) => handle.refresh(),
                    (Some("q"), _) => break,
                    (None, _) => {}
                    _ => println!("unknown command: {}", line),
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn print_feed(state: &NotificationFeedState) {
    if state.is_loading && state.items.is_empty() {
        println!("Loading notifications...");
        return;
    }
    match state.badge() {
        Some(badge) => println!("{} unread", badge),
        None => println!("All caught up"),
    }
    if state.items.is_empty() {
        println!("  No notifications");
    }
    for n in &state.items {
        println!(
            "{} [{}] {}: {} ({})",
            if n.read { " " } else { "•" },
            n.id,
            n.title,
            n.message,
            n.created_at.format("%b %e, %H:%M")
        );
    }
}

async fn handle_registrations(app: &App) -> anyhow::Result<()> {
    app.require_signed_in()?;
    let registrations = app
        .api
        .fetch_registrations(&app.identity)
        .await
        .context("failed to load registrations")?;

    if registrations.is_empty() {
        println!("No registrations yet");
    }
    for r in &registrations {
        let title = r
            .event
            .as_ref()
            .and_then(|e| e.title.as_deref())
            .unwrap_or("(untitled event)");
        println!("{:<24} {}", r.event_id, title);
    }
    Ok(())
}

async fn handle_profile(app: &App) -> anyhow::Result<()> {
    app.require_signed_in()?;
    let profile = app
        .api
        .fetch_profile(&app.identity)
        .await
        .context("failed to load profile")?;

    let rows = [
        ("Name", profile.name.as_deref()),
        ("Email", Some(profile.email.as_str())),
        ("Register No.", profile.register_number.as_deref()),
        ("Course", profile.course.as_deref()),
        ("Department", profile.department.as_deref()),
        ("Campus", profile.campus.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("{:<14} {}", label, value);
        }
    }
    Ok(())
}
