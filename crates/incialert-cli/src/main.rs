//! Inci-Alert CLI: live alerts, incident reports and account management from the terminal.
//!
//! Reads INCIALERT_API_URL, INCIALERT_TOKEN_PATH, INCIALERT_HTTP_TIMEOUT_SECS and
//! INCIALERT_POLL_INTERVAL_SECS (a `.env` file is honoured).

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use incialert_api_client::{ApiClient, IncidentSource, MediaUpload};
use incialert_cli::controllers::account::{self, ProfileView};
use incialert_cli::controllers::live_alerts::{load_alerts_once, LiveAlertsPoller};
use incialert_cli::controllers::report::{report_notification, submit_report};
use incialert_cli::controllers::statistics::{StatisticsDashboard, StatsRequest};
use incialert_cli::controllers::{FormError, Notification};
use incialert_cli::{init_tracing, render};
use incialert_core::models::{IncidentQuery, IncidentUpdate, ProfileUpdate, TimelinePeriod};
use incialert_core::validation::{RegisterForm, ReportForm, ResetPasswordForm};
use incialert_core::{AlertFilter, ClientConfig, TypeFilter};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "incialert", about = "Inci-Alert incident reporting CLI")]
struct Cli {
    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show live alerts (add --watch to keep polling)
    Alerts {
        /// Keep refreshing on the poll interval until Ctrl-C
        #[arg(long)]
        watch: bool,
        /// all, critical, warning, info or success
        #[arg(long, default_value = "all")]
        r#type: TypeFilter,
        /// Case-insensitive match on title, location or description
        #[arg(long, default_value = "")]
        search: String,
        /// Server-side source filter (user, news, ...)
        #[arg(long)]
        source: Option<String>,
        /// Server-side category filter
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Incident operations
    Incident {
        #[command(subcommand)]
        sub: IncidentCommands,
    },
    /// Report an incident, optionally with photos or videos
    Report {
        #[command(flatten)]
        fields: ReportArgs,
        /// Image or video to attach (repeatable)
        #[arg(long = "media")]
        media: Vec<PathBuf>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign in and store the session token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        sub: Option<ProfileCommands>,
    },
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password using a reset token
    ResetPassword {
        token: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Incident statistics
    Stats {
        #[command(subcommand)]
        sub: Option<StatsCommands>,
    },
    /// Show the signed-in user, if any
    Whoami,
}

#[derive(clap::Args)]
struct ReportArgs {
    #[arg(long)]
    title: String,
    /// fire, medical, accident, crime, natural, infrastructure, hazmat or other
    #[arg(long)]
    category: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    description: String,
    #[arg(long, requires = "lng")]
    lat: Option<f64>,
    #[arg(long, requires = "lat")]
    lng: Option<f64>,
}

impl ReportArgs {
    fn into_form(self) -> ReportForm {
        ReportForm {
            title: self.title,
            category: self.category,
            location: self.location,
            description: self.description,
            coordinates: self.lat.zip(self.lng),
        }
    }
}

#[derive(Subcommand)]
enum IncidentCommands {
    /// List raw incidents with server-side filters
    List {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Free-text search
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Get a single incident by ID
    Get { id: i64 },
    /// Create an incident without attachments
    Create {
        #[command(flatten)]
        fields: ReportArgs,
    },
    /// Update fields of an incident you own
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lng: Option<f64>,
    },
    /// Delete an incident by ID
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand)]
enum StatsCommands {
    /// All panels at once
    Overview,
    Category {
        /// Look-back window in days (server default 30)
        #[arg(long)]
        days: Option<u32>,
    },
    Location,
    Timeline {
        /// week, month or year
        #[arg(long, default_value = "week")]
        period: TimelinePeriod,
        #[arg(long)]
        category: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn incident_deleted(id: i64) -> Notification {
    Notification::success("Incident deleted", format!("Incident {} deleted", id))
}

fn print_notification(note: &Notification) {
    eprintln!("{}", render::notification(note));
}

/// Surface a form failure as a notification and a non-zero exit.
fn fail(title: &str, err: FormError) -> anyhow::Result<()> {
    print_notification(&Notification::error(title, err.to_string()));
    Err(err.into())
}

fn password_or_stdin(password: Option<String>) -> anyhow::Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn watch_alerts(
    client: &ApiClient,
    query: IncidentQuery,
    filter: AlertFilter,
    interval: std::time::Duration,
) -> anyhow::Result<()> {
    let source: Arc<dyn IncidentSource> = Arc::new(client.clone());
    let mut handle = LiveAlertsPoller::new(source, interval)
        .with_query(query)
        .spawn();
    let mut feed_rx = handle.subscribe();
    let mut notes = handle
        .take_notifications()
        .context("Notification channel already taken")?;

    loop {
        tokio::select! {
            changed = feed_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let feed = feed_rx.borrow_and_update().clone();
                let visible = feed.visible(&filter);
                print!("\x1b[2J\x1b[H");
                println!(
                    "{}",
                    render::live_alerts_screen(&feed, &visible, filter.type_filter, Utc::now())
                );
            }
            Some(note) = notes.recv() => print_notification(&note),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Parse before reading the environment.
    let cli = Cli::parse();
    let json = cli.json;

    let config = ClientConfig::from_env().context("Invalid INCIALERT_* configuration")?;
    let client = ApiClient::from_config(&config).context("Failed to create API client")?;

    match cli.command {
        Commands::Alerts {
            watch,
            r#type,
            search,
            source,
            category,
            limit,
            offset,
        } => {
            let query = IncidentQuery {
                source,
                category,
                q: None,
                limit,
                offset,
            };
            let filter = AlertFilter::new(r#type, search);

            if watch {
                watch_alerts(&client, query, filter, config.poll_interval()).await?;
            } else {
                let (feed, note) = load_alerts_once(&client, &query).await;
                if let Some(note) = &note {
                    print_notification(note);
                }
                let visible = feed.visible(&filter);
                if json {
                    print_json(&visible)?;
                } else {
                    println!(
                        "{}",
                        render::live_alerts_screen(&feed, &visible, filter.type_filter, Utc::now())
                    );
                }
            }
        }
        Commands::Incident { sub } => match sub {
            IncidentCommands::List {
                source,
                category,
                q,
                limit,
                offset,
            } => {
                let query = IncidentQuery {
                    source,
                    category,
                    q,
                    limit,
                    offset,
                };
                let incidents = client.get_incidents(&query).await?;
                if json {
                    print_json(&incidents)?;
                } else {
                    println!("{}", render::incident_table(&incidents));
                }
            }
            IncidentCommands::Get { id } => {
                let incident = client.get_incident(id).await?;
                if json {
                    print_json(&incident)?;
                } else {
                    println!("{}", render::incident_detail(&incident));
                }
            }
            IncidentCommands::Create { fields } => {
                let form = fields.into_form();
                if let Err(errors) = form.validate() {
                    return fail("Please fix the highlighted fields", errors.into());
                }
                let incident = client.create_incident(&form.to_new_incident()).await?;
                if json {
                    print_json(&incident)?;
                } else {
                    println!("{}", render::incident_detail(&incident));
                }
            }
            IncidentCommands::Update {
                id,
                title,
                description,
                category,
                location,
                lat,
                lng,
            } => {
                let update = IncidentUpdate {
                    title,
                    description,
                    category,
                    location,
                    latitude: lat,
                    longitude: lng,
                };
                if update.is_empty() {
                    bail!("Nothing to update: pass at least one field");
                }
                let incident = client.update_incident(id, &update).await?;
                if json {
                    print_json(&incident)?;
                } else {
                    println!("{}", render::incident_detail(&incident));
                }
            }
            IncidentCommands::Delete { id } => {
                client.delete_incident(id).await?;
                if json {
                    print_json(
                        &serde_json::json!({ "success": true, "message": format!("Incident {} deleted", id) }),
                    )?;
                } else {
                    print_notification(&incident_deleted(id));
                }
            }
        },
        Commands::Report { fields, media } => {
            let mut uploads = Vec::with_capacity(media.len());
            for path in &media {
                uploads.push(
                    MediaUpload::from_path(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                );
            }
            let result = submit_report(&client, &fields.into_form(), uploads).await;
            print_notification(&report_notification(&result));
            let incident = result?;
            if json {
                print_json(&incident)?;
            } else {
                println!("{}", render::incident_detail(&incident));
            }
        }
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
            phone,
        } => {
            let password = password_or_stdin(password)?;
            let form = RegisterForm {
                username,
                email,
                confirm_password: password.clone(),
                password,
                first_name: first_name.unwrap_or_default(),
                last_name: last_name.unwrap_or_default(),
                phone: phone.unwrap_or_default(),
            };
            match account::register(&client, &form).await {
                Ok(response) => print_notification(&account::welcome_notification(&response)),
                Err(e) => return fail("Registration failed", e),
            }
        }
        Commands::Login { username, password } => {
            let password = password_or_stdin(password)?;
            match account::login(&client, &username, &password).await {
                Ok(response) => print_notification(&account::welcome_notification(&response)),
                Err(e) => return fail("Login failed", e),
            }
        }
        Commands::Logout => {
            print_notification(&account::logout(&client).await);
        }
        Commands::Profile { sub } => match sub.unwrap_or(ProfileCommands::Show) {
            ProfileCommands::Show => {
                let (view, note) = account::load_profile(&client).await;
                if let Some(note) = note {
                    print_notification(&note);
                }
                match view {
                    ProfileView::SignedIn(user) if json => print_json(&user)?,
                    ProfileView::SignedIn(user) => println!("{}", render::user_profile(&user)),
                    ProfileView::SignedOut => bail!("Not logged in. Run `incialert login` first."),
                }
            }
            ProfileCommands::Update {
                first_name,
                last_name,
                phone,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    phone,
                };
                match account::update_profile(&client, &update).await {
                    Ok(user) if json => print_json(&user)?,
                    Ok(user) => {
                        print_notification(&Notification::success(
                            "Profile updated",
                            "Your changes have been saved.",
                        ));
                        println!("{}", render::user_profile(&user));
                    }
                    Err(e) => return fail("Profile update failed", e),
                }
            }
        },
        Commands::ForgotPassword { email } => match account::forgot_password(&client, &email).await {
            Ok(response) => print_notification(&Notification::info("Check your email", response.message)),
            Err(e) => return fail("Password reset request failed", e),
        },
        Commands::ResetPassword { token, password } => {
            let password = password_or_stdin(password)?;
            let form = ResetPasswordForm {
                token,
                confirm_password: password.clone(),
                password,
            };
            match account::reset_password(&client, &form).await {
                Ok(response) => {
                    print_notification(&Notification::success("Password reset", response.message))
                }
                Err(e) => return fail("Password reset failed", e),
            }
        }
        Commands::Stats { sub } => match sub.unwrap_or(StatsCommands::Overview) {
            StatsCommands::Overview => {
                let dashboard = StatisticsDashboard::load(&client, &StatsRequest::default()).await;
                for note in &dashboard.notifications {
                    print_notification(note);
                }
                if dashboard.is_empty() {
                    bail!("No statistics could be loaded");
                }
                if json {
                    print_json(&serde_json::json!({
                        "overview": dashboard.overview,
                        "categories": dashboard.categories,
                        "locations": dashboard.locations,
                        "timeline": dashboard.timeline,
                    }))?;
                } else {
                    if let Some(s) = &dashboard.overview {
                        println!("{}", render::overview_panel(s));
                    }
                    if let Some(s) = &dashboard.categories {
                        println!("{}", render::category_panel(s));
                    }
                    if let Some(s) = &dashboard.locations {
                        println!("{}", render::location_panel(s));
                    }
                    if let Some(s) = &dashboard.timeline {
                        println!("{}", render::timeline_panel(s));
                    }
                }
            }
            StatsCommands::Category { days } => {
                let stats = client.get_category_stats(days).await?;
                if json {
                    print_json(&stats)?;
                } else {
                    println!("{}", render::category_panel(&stats));
                }
            }
            StatsCommands::Location => {
                let stats = client.get_location_stats().await?;
                if json {
                    print_json(&stats)?;
                } else {
                    println!("{}", render::location_panel(&stats));
                }
            }
            StatsCommands::Timeline { period, category } => {
                let stats = client
                    .get_timeline_stats(period, category.as_deref())
                    .await?;
                if json {
                    print_json(&stats)?;
                } else {
                    println!("{}", render::timeline_panel(&stats));
                }
            }
        },
        Commands::Whoami => match client.current_user().await {
            Some(user) if json => print_json(&user)?,
            Some(user) => println!("{} ({})", user.username, user.email),
            None => println!("Not logged in"),
        },
    }

    Ok(())
}
