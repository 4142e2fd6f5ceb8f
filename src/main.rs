use std::process::ExitCode;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::errors::AppError;
use salonbook::models::{
    datetime, Appointment, AppointmentStatus, BlockedSlotInput, ClientInput, ProfessionalInput,
    ServiceInput, WorkingHours,
};
use salonbook::services::calendar::generate_ics;
use salonbook::services::daily_schedule::DailySchedule;
use salonbook::services::kanban::KanbanBoard;
use salonbook::services::scheduling::{
    available_starts, occupied_intervals, validate_appointment, SchedulingError, SlotQuery,
    SlotRequest,
};
use salonbook::state::AppState;
use salonbook::stores::{AuthStore, ServicesCart, ViewMode, WizardState, WizardStep};

#[derive(Parser, Debug)]
#[command(name = "salonbook", about = "Salon schedule, kanban and checkout from the terminal")]
struct Cli {
    #[arg(long, env = "SALONBOOK_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "SALONBOOK_TENANT_ID")]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SALONBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    /// Daily schedule grid (or list) for all professionals.
    Schedule {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// grid or list; remembered for next time
        #[arg(long)]
        view: Option<ViewMode>,
    },
    Kanban {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Move an appointment's card (and its whole group) to another column.
    Move {
        appointment_id: String,
        status: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Checkout {
        appointment_id: String,
        #[arg(long, default_value = "dinheiro")]
        payment: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Free start times for a professional.
    Slots {
        #[arg(long)]
        professional: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        duration: i32,
        #[arg(long, default_value_t = 30)]
        step: u32,
    },
    /// Book one or more services for a client at one start time. Choices
    /// are kept between runs until the booking goes through, so a rejected
    /// attempt can be retried by passing only what changes.
    Book {
        #[arg(long)]
        professional: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long = "service")]
        services: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Discard any stored draft first
        #[arg(long)]
        restart: bool,
    },
    Block {
        #[arg(long)]
        professional: String,
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_datetime)]
        end: NaiveDateTime,
        #[arg(long)]
        reason: Option<String>,
    },
    Services {
        #[arg(long)]
        category: Option<String>,
    },
    /// Create or update a service (manager only).
    ServiceSave {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        duration: i32,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        inactive: bool,
    },
    Categories,
    Professionals,
    /// Create or update a professional (manager only).
    ProfessionalSave {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialty: Option<String>,
        /// JSON array of {"day","start","end"} windows
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
    Clients,
    ClientAdd {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Blocked periods of one professional on a day.
    Blocks {
        #[arg(long)]
        professional: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Print an iCalendar event for an appointment's group.
    Ics {
        appointment_id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM-DD, got {s}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| format!("expected HH:MM, got {s}"))
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    datetime::parse(s).ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM, got {s}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }
    if cli.tenant.is_some() {
        config.tenant_id = cli.tenant.clone();
    }

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Falha ao iniciar: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&state, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_err) => {
                    if app_err.is_unauthorized() {
                        // 401 anywhere ends the session
                        let mut auth = AuthStore::default();
                        if let Err(clear_err) = auth.logout(state.api.as_ref(), &state.db()) {
                            tracing::error!(error = %clear_err, "failed to clear session");
                        }
                    }
                    tracing::debug!(error = %app_err, "command failed");
                    eprintln!("{}", app_err.user_message());
                }
                None => eprintln!("Erro: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    let mut auth = AuthStore::restore(&state.db(), Utc::now())?;
    auth.attach(state.api.as_ref(), state.config.tenant_id.as_deref());
    let today = Local::now().date_naive();

    match command {
        Command::Login { email, password } => {
            let session = auth.login(state.api.as_ref(), &email, &password).await?.clone();
            auth.attach(state.api.as_ref(), state.config.tenant_id.as_deref());
            auth.refresh_profile(state.api.as_ref()).await?;
            auth.persist(&state.db())?;
            println!(
                "Bem-vindo, {} ({})",
                session.name.as_deref().unwrap_or(&session.email),
                auth.role().unwrap_or(&session.role)
            );
        }
        Command::Logout => {
            auth.logout(state.api.as_ref(), &state.db())?;
            println!("Sessão encerrada.");
        }
        Command::Whoami => {
            require_login(&auth)?;
            auth.refresh_profile(state.api.as_ref()).await?;
            auth.persist(&state.db())?;
            if let Some(session) = auth.session() {
                println!("{} <{}>", session.name.as_deref().unwrap_or("-"), session.email);
                println!("perfil: {}", session.role);
                let tenant_id = state
                    .config
                    .tenant_id
                    .clone()
                    .or_else(|| session.tenant_id.clone());
                if let Some(tenant_id) = tenant_id {
                    // Name lookup is cosmetic; fall back to the raw id
                    match state.api.tenant(&tenant_id).await {
                        Ok(tenant) => println!("salão: {} ({})", tenant.name, tenant.id),
                        Err(e) => {
                            tracing::warn!(error = %e, %tenant_id, "tenant lookup failed");
                            println!("salão: {tenant_id}");
                        }
                    }
                }
                if let Some(exp) = session.expires_at {
                    println!("expira: {}", exp.with_timezone(&Local).format("%d/%m/%Y %H:%M"));
                }
            }
        }
        Command::Schedule { date, view } => {
            require_login(&auth)?;
            let date = date.unwrap_or(today);
            let mode = match view {
                Some(mode) => {
                    mode.save(&state.db())?;
                    mode
                }
                None => ViewMode::load(&state.db())?,
            };

            let data = state.api.daily_schedule(date).await?;
            let professionals = if data.professionals.is_empty() {
                state.api.professionals().await?
            } else {
                data.professionals
            };
            let schedule = DailySchedule::build(
                date,
                &professionals,
                &data.appointments,
                &data.blocked_slots,
                state.config.grid(),
            );

            println!("Agenda de {}", date.format("%d/%m/%Y"));
            match mode {
                ViewMode::Grid => print!("{}", schedule.render_grid()),
                ViewMode::List => print!("{}", schedule.render_list()),
            }
            for (professional_id, ratio) in schedule.occupancy() {
                println!("ocupação {professional_id}: {:.0}%", ratio * 100.0);
            }
            for conflict in schedule.conflicts() {
                println!(
                    "⚠ conflito ({}): {}-{} x {}-{}",
                    conflict.professional_id,
                    conflict.first.start.format("%H:%M"),
                    conflict.first.end.format("%H:%M"),
                    conflict.second.start.format("%H:%M"),
                    conflict.second.end.format("%H:%M"),
                );
            }
        }
        Command::Kanban { date } => {
            require_login(&auth)?;
            let board = KanbanBoard::load(state.api.as_ref(), date.unwrap_or(today)).await?;
            for column in board.columns() {
                println!("── {} ({})", column.status.label(), column.groups.len());
                for group in column.groups {
                    println!(
                        "   {} {} · {} · R$ {:.2} [{}]",
                        group.start_time.format("%H:%M"),
                        group.client_name,
                        group.service_names().join(" + "),
                        group.price,
                        group.ids().join(","),
                    );
                }
            }
            let hidden = board.hidden_count();
            if hidden > 0 {
                println!("({hidden} cancelados ou ausentes)");
            }
        }
        Command::Move {
            appointment_id,
            status,
            date,
        } => {
            require_staff(&auth)?;
            let to = AppointmentStatus::try_parse(&status)
                .ok_or_else(|| AppError::Validation(format!("Status desconhecido: {status}")))?;
            let mut board = KanbanBoard::load(state.api.as_ref(), date.unwrap_or(today)).await?;
            let group = board.move_group(state.api.as_ref(), &appointment_id, to).await?;
            println!("{} → {}", group.client_name, to.label());
        }
        Command::Checkout {
            appointment_id,
            payment,
            date,
        } => {
            require_staff(&auth)?;
            let mut board = KanbanBoard::load(state.api.as_ref(), date.unwrap_or(today)).await?;
            let receipt = board
                .checkout(state.api.as_ref(), &appointment_id, &payment)
                .await?;
            println!("Recibo - {}", receipt.client_name);
            for (name, price) in &receipt.items {
                println!("  {name:<30} R$ {price:>8.2}");
            }
            println!(
                "  {:<30} R$ {:>8.2}  ({} min, {})",
                "Total", receipt.total_price, receipt.total_duration, receipt.payment_method
            );
        }
        Command::Slots {
            professional,
            date,
            duration,
            step,
        } => {
            require_login(&auth)?;
            let date = date.unwrap_or(today);
            let data = state.api.daily_schedule(date).await?;
            let hours = find_working_hours(state, &professional).await;
            let query = SlotQuery {
                professional_id: professional,
                date,
                duration_minutes: duration,
                step_minutes: step,
                not_before: Some(Local::now().naive_local()),
            };
            let starts = available_starts(
                &query,
                hours.as_ref(),
                (state.config.open, state.config.close),
                &data.appointments,
                &data.blocked_slots,
            );
            if starts.is_empty() {
                println!("Nenhum horário disponível.");
            }
            for start in starts {
                println!("{}", start.format("%H:%M"));
            }
        }
        Command::Book {
            professional,
            date,
            time,
            client,
            services,
            notes,
            restart,
        } => {
            require_login(&auth)?;

            let (mut cart, mut wizard) = {
                let conn = state.db();
                if restart {
                    ServicesCart::default().save(&conn)?;
                    WizardState::default().reset(&conn)?;
                }
                (ServicesCart::load(&conn)?, WizardState::load(&conn)?)
            };

            if !services.is_empty() {
                let catalog = state.api.services().await?;
                for id in &services {
                    let service = catalog
                        .iter()
                        .find(|s| s.id == *id && s.active)
                        .ok_or_else(|| AppError::NotFound(format!("serviço {id}")))?;
                    cart.add(service);
                }
            }
            if let Some(date) = date {
                wizard.select_date(date);
            }
            if let Some(professional) = professional.as_deref() {
                wizard.select_professional(professional);
            }
            if let Some(time) = time {
                wizard.select_slot(time);
            }
            if let Some(client) = client.as_deref() {
                wizard.set_client(client, None);
            }
            if notes.is_some() {
                wizard.notes = notes;
            }
            {
                let conn = state.db();
                cart.save(&conn)?;
                wizard.save(&conn)?;
            }

            wizard.step = WizardStep::Date;
            while wizard.step != WizardStep::Confirm {
                wizard.next()?;
            }
            let requests = wizard.to_requests(&cart)?;
            let (Some(professional), Some(start)) =
                (wizard.professional_id.clone(), wizard.start_time())
            else {
                return Err(AppError::Validation("Selecione um horário.".to_string()).into());
            };

            let data = state.api.daily_schedule(start.date()).await?;
            let hours = find_working_hours(state, &professional).await;
            // Services already booked for this client at this start join the
            // same group, so the group's whole span is checked
            let joined: Vec<&Appointment> = data
                .appointments
                .iter()
                .filter(|a| {
                    a.professional_id == professional
                        && a.start_time == start
                        && a.is_occupying()
                        && wizard.client_name.as_deref() == Some(a.client_name.as_str())
                })
                .collect();
            let joined_minutes: i32 = joined.iter().map(|a| a.duration).sum();
            let mut request =
                SlotRequest::new(&professional, start, cart.total_duration() + joined_minutes);
            request.ignore_ids = joined.iter().map(|a| a.id.clone()).collect();
            validate_appointment(&request, &data.appointments, &data.blocked_slots, hours.as_ref())
                .map_err(AppError::from)?;

            let (total_price, total_duration) = (cart.total_price(), cart.total_duration());
            for req in requests {
                let created = state.api.create_appointment(&req).await?;
                // A retry after a partial failure only books what is left
                cart.remove(&req.service_id);
                cart.save(&state.db())?;
                println!(
                    "Agendado: {} {} ({})",
                    created.start_time.format("%d/%m %H:%M"),
                    created.service_name.as_deref().unwrap_or(&created.service_id),
                    created.id
                );
            }
            println!("Total: R$ {total_price:.2}, {total_duration} min");

            wizard.reset(&state.db())?;
        }
        Command::Block {
            professional,
            start,
            end,
            reason,
        } => {
            require_manager(&auth)?;
            if end <= start {
                return Err(AppError::Validation("O fim deve ser depois do início.".to_string()).into());
            }
            let data = state.api.daily_schedule(start.date()).await?;
            let busy = occupied_intervals(&professional, &data.appointments, &data.blocked_slots, &[]);
            if let Some(hit) = busy.into_iter().find(|i| i.overlaps(start, end)) {
                return Err(AppError::from(SchedulingError::SlotOccupied {
                    occupant: hit.occupant,
                })
                .into());
            }
            let slot = state
                .api
                .create_blocked_slot(
                    &professional,
                    &BlockedSlotInput {
                        start_time: start,
                        end_time: end,
                        reason,
                    },
                )
                .await?;
            println!(
                "Bloqueado {}-{} ({})",
                slot.start_time.format("%d/%m %H:%M"),
                slot.end_time.format("%H:%M"),
                slot.id
            );
        }
        Command::Services { category } => {
            require_login(&auth)?;
            let services = match category {
                Some(id) => state.api.services_by_category(&id).await?,
                None => state.api.services().await?,
            };
            for s in services.iter().filter(|s| s.active) {
                println!("{:<10} {:<30} {:>4} min  R$ {:>8.2}", s.id, s.name, s.duration, s.price);
            }
        }
        Command::ServiceSave {
            id,
            name,
            category,
            duration,
            price,
            inactive,
        } => {
            require_manager(&auth)?;
            let input = ServiceInput {
                name,
                category_id: category,
                duration,
                price,
                active: !inactive,
            };
            input.validate().map_err(AppError::Validation)?;
            let saved = state.api.save_service(id.as_deref(), &input).await?;
            println!("Serviço salvo: {} ({})", saved.name, saved.id);
        }
        Command::Categories => {
            require_login(&auth)?;
            for c in state.api.categories().await? {
                println!("{:<10} {}", c.id, c.name);
            }
        }
        Command::Professionals => {
            require_login(&auth)?;
            for p in state.api.professionals().await? {
                let hours = p
                    .working_hours
                    .as_ref()
                    .map(|h| h.to_human_readable())
                    .unwrap_or_default();
                let flag = if p.active { "" } else { " (inativo)" };
                println!("{:<10} {}{flag} {hours}", p.id, p.name);
            }
        }
        Command::ProfessionalSave {
            id,
            name,
            specialty,
            hours,
            inactive,
        } => {
            require_manager(&auth)?;
            if name.trim().is_empty() {
                return Err(AppError::Validation("Nome do profissional é obrigatório.".to_string()).into());
            }
            let working_hours = match hours {
                Some(raw) => {
                    let parsed = WorkingHours::from_json(&raw)?;
                    parsed.validate()?;
                    Some(parsed)
                }
                None => None,
            };
            let input = ProfessionalInput {
                name,
                specialty,
                active: !inactive,
                working_hours,
            };
            let saved = state.api.save_professional(id.as_deref(), &input).await?;
            println!("Profissional salvo: {} ({})", saved.name, saved.id);
        }
        Command::ClientAdd { name, phone, email } => {
            require_staff(&auth)?;
            let input = ClientInput { name, phone, email };
            input.validate().map_err(AppError::Validation)?;
            let client = state.api.create_client(&input).await?;
            println!("Cliente cadastrado: {} ({})", client.name, client.id);
        }
        Command::Blocks { professional, date } => {
            require_login(&auth)?;
            let slots = state
                .api
                .blocked_slots(&professional, date.unwrap_or(today))
                .await?;
            if slots.is_empty() {
                println!("Nenhum bloqueio.");
            }
            for slot in slots {
                println!(
                    "{}-{} {} ({})",
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M"),
                    slot.reason.as_deref().unwrap_or("-"),
                    slot.id
                );
            }
        }
        Command::Clients => {
            require_staff(&auth)?;
            for c in state.api.clients().await? {
                println!(
                    "{:<10} {:<30} {}",
                    c.id,
                    c.name,
                    c.phone.as_deref().unwrap_or("")
                );
            }
        }
        Command::Ics {
            appointment_id,
            date,
        } => {
            require_login(&auth)?;
            let board = KanbanBoard::load(state.api.as_ref(), date.unwrap_or(today)).await?;
            let group = board
                .group_of(&appointment_id)
                .ok_or_else(|| AppError::NotFound(format!("agendamento {appointment_id}")))?;
            print!("{}", generate_ics(&group, &state.config.salon_name));
        }
    }

    Ok(())
}

fn require_login(auth: &AuthStore) -> Result<(), AppError> {
    if auth.is_authenticated(Utc::now()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn require_staff(auth: &AuthStore) -> Result<(), AppError> {
    require_login(auth)?;
    match auth.role() {
        Some(role) if role.is_staff() => Ok(()),
        _ => Err(AppError::Validation(
            "Acesso restrito à equipe do salão.".to_string(),
        )),
    }
}

fn require_manager(auth: &AuthStore) -> Result<(), AppError> {
    require_login(auth)?;
    match auth.role() {
        Some(role) if role.can_manage() => Ok(()),
        _ => Err(AppError::Validation(
            "Apenas o gestor pode alterar o cadastro.".to_string(),
        )),
    }
}

/// Working hours are optional; a failed lookup only means no hours check.
async fn find_working_hours(
    state: &AppState,
    professional_id: &str,
) -> Option<WorkingHours> {
    match state.api.professionals().await {
        Ok(list) => list
            .into_iter()
            .find(|p| p.id == professional_id)
            .and_then(|p| p.working_hours),
        Err(e) => {
            tracing::warn!(error = %e, "could not load professionals for working hours");
            None
        }
    }
}
