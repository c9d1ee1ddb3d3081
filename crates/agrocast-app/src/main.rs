//! # AgroCast CLI (`agrocast`)
//!
//! Terminal frontend for the weather dashboard, the farm plan and the
//! assistant chat.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `agrocast weather [city]` | Current conditions, optionally hourly and 7-day |
//! | `agrocast cities [query]` | Search the city catalogue |
//! | `agrocast plan show` | Current plan and its 7-day schedule |
//! | `agrocast plan save` | Create or update the current plan |
//! | `agrocast plan task <day> <text>` | Set the task for one day |
//! | `agrocast plan generate` | Replace the schedule with a generated one |
//! | `agrocast chat send <text>` | Ask the assistant |
//! | `agrocast chat history` | Print the saved conversation |
//! | `agrocast chat clear` | Delete the saved conversation |
//! | `agrocast assistant ping` | Check the assistant backend |

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agrocast_app::models::{ChatModel, DashboardModel, PlanModel};
use agrocast_app::AppServices;
use agrocast_core::{AppError, AssistantError, Config};
use agrocast_services::{ChatContext, PlanFields, Sender};
use agrocast_weather::search_cities;

#[derive(Parser)]
#[command(
    name = "agrocast",
    version,
    about = "Weather forecasts and farm planning from the terminal"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    ///
    /// Defaults to `<config dir>/agrocast/config.toml`, created on first run.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the forecast for a city.
    Weather {
        /// City name; defaults to `dashboard.default_city`
        city: Option<String>,

        /// Also print the next 24 hours
        #[arg(long)]
        hourly: bool,

        /// Also print the 7-day outlook
        #[arg(long)]
        week: bool,
    },

    /// Search the selectable cities.
    Cities {
        /// Case-insensitive substring; lists every city when omitted
        query: Option<String>,
    },

    /// Manage the farm plan and its schedule.
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Talk to the farming assistant.
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Assistant backend utilities.
    Assistant {
        #[command(subcommand)]
        action: AssistantAction,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Print the current plan and the next seven days.
    Show,

    /// Create the plan, or update the current one.
    Save {
        #[arg(long)]
        crop: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        goal: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Set the task for a day (0 = today, 6 = six days from now).
    Task {
        day: u8,

        description: String,

        #[arg(long)]
        details: Option<String>,
    },

    /// Replace the schedule with one generated by the assistant.
    Generate {
        /// City used for the forecast; defaults to `dashboard.default_city`
        #[arg(long)]
        city: Option<String>,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Send a message with the current weather and plan as context.
    Send {
        text: String,

        /// City whose forecast is included; defaults to `dashboard.default_city`
        #[arg(long)]
        city: Option<String>,
    },

    /// Print the saved conversation.
    History,

    /// Delete the saved conversation.
    Clear,
}

#[derive(Subcommand)]
enum AssistantAction {
    /// Check that the assistant backend answers.
    Ping,
}

fn main() -> ExitCode {
    if let Err(e) = agrocast_core::init() {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{}", app.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let (config, _validation) = match &cli.config {
        Some(path) => Config::load_validated_from(path)?,
        None => Config::load_validated()?,
    };
    let services = AppServices::new(config)?;

    let code = match cli.command {
        Commands::Weather { city, hourly, week } => weather(&services, city, hourly, week)?,
        Commands::Cities { query } => {
            for city in search_cities(query.as_deref().unwrap_or("")) {
                println!("{}", city);
            }
            ExitCode::SUCCESS
        }
        Commands::Plan { action } => plan(&services, action)?,
        Commands::Chat { action } => chat(&services, action)?,
        Commands::Assistant {
            action: AssistantAction::Ping,
        } => {
            let status = services
                .runtime()
                .block_on(services.assistant().test_connection());
            if !status.is_ok() {
                return Err(AppError::from(AssistantError::Unavailable(status.message)).into());
            }
            println!("{}: {}", status.status, status.message);
            ExitCode::SUCCESS
        }
    };

    services.shutdown();
    Ok(code)
}

/// Upper bound for one dashboard load, retries included.
fn load_timeout(config: &Config) -> Duration {
    let attempts = u64::from(config.retry.max_retries) + 1;
    Duration::from_secs(config.api.timeout_secs.saturating_mul(attempts) + 5)
}

fn load_dashboard(services: &Arc<AppServices>, city: Option<String>) -> DashboardModel {
    let mut dashboard = DashboardModel::new(Arc::clone(services));
    let city = city.unwrap_or_else(|| services.config().dashboard.default_city.clone());
    dashboard.select_city(&city);
    dashboard.wait_until_idle(load_timeout(services.config()));
    dashboard
}

fn weather(
    services: &Arc<AppServices>,
    city: Option<String>,
    hourly: bool,
    week: bool,
) -> Result<ExitCode> {
    let dashboard = load_dashboard(services, city);

    if let Some(message) = dashboard.error_message() {
        eprintln!("{}", message);
    }
    let Some(current) = dashboard.current_conditions() else {
        return Ok(ExitCode::FAILURE);
    };

    println!("{} ({})", current.city, current.date);
    if let Some(c) = dashboard.coordinates() {
        println!("  Location:      {:.4}, {:.4}", c.lat, c.lon);
    }
    println!("  Conditions:    {} [{}]", current.description, current.icon);
    println!("  Temperature:   {} (feels like {})", current.temperature, current.feels_like);
    println!("  Humidity:      {}", current.humidity);
    println!("  Precipitation: {}", current.precipitation);
    println!("  Wind:          {}", current.wind);
    println!("  Pressure:      {}", current.pressure);

    if hourly {
        println!("\nNext 24 hours");
        for row in dashboard.hourly_rows() {
            println!(
                "  {:<17} {:<14} {:>8} {:>9}  {}",
                row.time, row.icon, row.temperature, row.precipitation, row.wind
            );
        }
    }

    if week {
        println!("\n7-day outlook");
        for card in dashboard.forecast_cards() {
            println!(
                "  {:<10} {:<24} {:>8} / {:<8} {:>9}",
                card.label, card.description, card.high, card.low, card.precipitation
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn plan(services: &Arc<AppServices>, action: PlanAction) -> Result<ExitCode> {
    let mut model = PlanModel::new(services).map_err(AppError::from)?;
    model.load().map_err(AppError::from)?;

    match action {
        PlanAction::Show => {}
        PlanAction::Save {
            crop,
            location,
            goal,
            notes,
        } => {
            model
                .save(PlanFields {
                    crop_name: crop,
                    farm_location: location,
                    season_goal: goal,
                    notes,
                })
                .map_err(AppError::from)?;
            println!("Plan saved.");
        }
        PlanAction::Task {
            day,
            description,
            details,
        } => {
            model
                .upsert_task(day, &description, details)
                .map_err(AppError::from)?;
            println!("Task saved.");
        }
        PlanAction::Generate { city } => {
            let city = city.unwrap_or_else(|| services.config().dashboard.default_city.clone());
            let count = model.generate_schedule(&city).map_err(AppError::from)?;
            println!("Generated {} tasks for {}.", count, city);
        }
    }

    print_plan(&model);
    Ok(ExitCode::SUCCESS)
}

fn print_plan(model: &PlanModel) {
    let Some(plan) = model.store().plan() else {
        println!("No saved plan.");
        return;
    };

    println!("{} at {}", plan.crop_name, plan.farm_location);
    println!("  Goal:  {}", plan.season_goal);
    if let Some(notes) = plan.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("  Notes: {}", notes);
    }

    let today = chrono::Local::now().date_naive();
    for row in model.day_rows(today) {
        match (&row.description, &row.details) {
            (Some(description), Some(details)) => {
                println!("  {:<12} {} ({})", row.label, description, details)
            }
            (Some(description), None) => println!("  {:<12} {}", row.label, description),
            (None, _) => println!("  {:<12} -", row.label),
        }
    }
}

fn chat(services: &Arc<AppServices>, action: ChatAction) -> Result<ExitCode> {
    let mut model = ChatModel::new(services).map_err(AppError::from)?;

    match action {
        ChatAction::Send { text, city } => {
            let mut plan = PlanModel::new(services).map_err(AppError::from)?;
            if let Err(e) = plan.load() {
                tracing::warn!("Sending chat without plan context: {}", e);
            }
            let dashboard = load_dashboard(services, city);
            let context = ChatContext::gather(dashboard.snapshot(), plan.store());

            model.load().map_err(AppError::from)?;
            let reply = model.send(&text, context).map_err(AppError::from)?;
            println!("{}", reply.text);
        }
        ChatAction::History => {
            model.load().map_err(AppError::from)?;
            for message in model.messages() {
                let who = match message.sender {
                    Sender::User => "you",
                    Sender::Bot => "assistant",
                };
                let at = message.created_at.format("%Y-%m-%d %H:%M");
                println!("[{}] {}: {}", at, who, message.text);
            }
        }
        ChatAction::Clear => {
            model.clear().map_err(AppError::from)?;
            println!("Chat cleared.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
