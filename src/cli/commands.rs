use clap::{Args, Parser, Subcommand};
use chrono::Local;
use anyhow::{Context, Result};
use crate::config::Settings;
use crate::kanban::{
    ConvertError, FollowUpFilter, IgnoreReason, KanbanController, KanbanFilter, MoveOutcome, Notification,
    NotificationLevel, Notifier,
};
use crate::models::{resolve_stage, Lead, LeadDraft, LeadId, LeadPatch, Stage, StageDraft, StageId, StageOrder};
use crate::service::{HttpLeadService, LeadService};
use crate::cli::error::{user_error, validate_color, validate_lead_id, validate_non_empty, validate_phone};
use crate::cli::output::{
    format_board, format_lead_summary, format_lead_table, format_stage_table, format_statistics,
    get_terminal_width, is_tty, BoardView,
};
use crate::cli::parser::{parse_key_values, parse_lead_args, ParsedLeadArgs};
use crate::utils::parse_date_expr;

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(about = "Leadboard - Move sales leads through the pipeline from the command line")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Lead service base URL (overrides the rc file and LEADBOARD_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the kanban board
    Board {
        #[command(flatten)]
        filter: BoardFilterArgs,
        /// Only show leads from this source form in the forms column
        #[arg(long, value_name = "FORM_ID")]
        form: Option<i64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show lead statistics
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Move a lead to another stage
    Move {
        /// Lead ID
        lead: String,
        /// Target stage (ID or name)
        stage: String,
    },
    /// Convert a lead into a client
    Convert {
        /// Lead ID
        lead: String,
        /// Conversion data as key=value pairs
        #[arg(trailing_var_arg = true)]
        data: Vec<String>,
    },
    /// Lead management commands
    Lead {
        #[command(subcommand)]
        subcommand: LeadCommands,
    },
    /// Stage management commands
    Stages {
        #[command(subcommand)]
        subcommand: StageCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct BoardFilterArgs {
    /// Free-text search (name, phone)
    #[arg(long)]
    pub search: Option<String>,
    /// Created on or after (YYYY-MM-DD, today, yesterday)
    #[arg(long)]
    pub from: Option<String>,
    /// Created on or before (YYYY-MM-DD, today, yesterday)
    #[arg(long)]
    pub to: Option<String>,
    /// Operator ID
    #[arg(long)]
    pub operator: Option<i64>,
    /// Follow-up bucket: all, today, overdue, soon, planned, none
    #[arg(long, value_name = "BUCKET")]
    pub follow_up: Option<String>,
}

#[derive(Subcommand)]
pub enum LeadCommands {
    /// Add a new lead
    Add {
        /// Client name and fields (e.g., "Aziz Karimov phone=+998901234567 stage=New follow_up=+2d")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List leads
    List {
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show lead details
    Show {
        /// Lead ID
        lead: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Modify a lead
    Edit {
        /// Lead ID
        lead: String,
        /// Send a full update instead of only the changed fields
        #[arg(long)]
        replace: bool,
        /// Fields to change (e.g., "phone=+998901234567 call_status=answered follow_up=")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Delete a lead
    Delete {
        /// Lead ID
        lead: String,
        /// Confirm deletion
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// List stages
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Add a new stage
    Add {
        /// Stage name
        name: String,
        /// Hex colour (e.g., #3b82f6)
        #[arg(long)]
        color: Option<String>,
        /// Position on the board
        #[arg(long)]
        order: Option<i64>,
    },
    /// Modify a stage
    Edit {
        /// Stage ID or name
        stage: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New hex colour
        #[arg(long)]
        color: Option<String>,
        /// New position
        #[arg(long)]
        order: Option<i64>,
    },
    /// Delete a stage
    Delete {
        /// Stage ID or name
        stage: String,
        /// Confirm deletion
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Reorder stages; stages not listed keep their relative order after the listed ones
    Reorder {
        /// Stage IDs or names in the new order
        #[arg(required = true)]
        stages: Vec<String>,
    },
}

/// Prints notifications: successes to stdout, failures to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("{}", notification.message),
            NotificationLevel::Error => eprintln!("{}", notification.message),
        }
    }
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    };

    let settings = Settings::load(cli.api_url.as_deref())?;
    let service = HttpLeadService::from_settings(&settings);
    log::debug!("Using lead service at {}", service.base_url());

    handle_command(&service, cli.command)
}

pub fn handle_command(service: &dyn LeadService, command: Commands) -> Result<()> {
    match command {
        Commands::Board { filter, form, json } => handle_board(service, build_filter(filter), form, json),
        Commands::Stats { json } => handle_stats(service, json),
        Commands::Move { lead, stage } => handle_move(service, &lead, &stage),
        Commands::Convert { lead, data } => handle_convert(service, &lead, &data),
        Commands::Lead { subcommand } => handle_lead(service, subcommand),
        Commands::Stages { subcommand } => handle_stages(service, subcommand),
    }
}

/// Validate board filter flags before any request is made
fn build_filter(args: BoardFilterArgs) -> KanbanFilter {
    let parse_date = |expr: &Option<String>| {
        expr.as_deref().map(|e| parse_date_expr(e).unwrap_or_else(|err| user_error(&err.to_string())))
    };
    let date_from = parse_date(&args.from);
    let date_to = parse_date(&args.to);
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            user_error(&format!("--from ({}) is after --to ({})", from, to));
        }
    }

    let follow_up = match args.follow_up.as_deref() {
        None => FollowUpFilter::All,
        Some(bucket) => FollowUpFilter::from_str(bucket).unwrap_or_else(|| {
            user_error(&format!(
                "Invalid follow-up filter '{}'. Use all, today, overdue, soon, planned or none.",
                bucket
            ))
        }),
    };

    KanbanFilter {
        search: args.search.filter(|s| !s.trim().is_empty()),
        date_from,
        date_to,
        operator: args.operator,
        follow_up,
    }
}

fn parse_lead_id_arg(input: &str) -> LeadId {
    validate_lead_id(input).unwrap_or_else(|e| user_error(&e))
}

fn resolve_stage_arg(stages: &[Stage], input: &str) -> StageId {
    resolve_stage(stages, input).unwrap_or_else(|e| user_error(&e.to_string()))
}

fn stage_label(stages: &[Stage], id: StageId) -> String {
    stages.iter()
        .find(|s| s.id == id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn fetch_lead(service: &dyn LeadService, id: LeadId) -> Result<Lead> {
    match service.get_lead(id) {
        Ok(lead) => Ok(lead),
        Err(err) if err.is_not_found() => user_error(&format!("Lead {} not found", id)),
        Err(err) => Err(anyhow::Error::new(err).context(format!("Failed to load lead {}", id))),
    }
}

fn fetch_stages(service: &dyn LeadService) -> Result<Vec<Stage>> {
    let mut stages = service.list_stages().context("Failed to load stages")?;
    stages.sort_by_key(|s| s.order);
    Ok(stages)
}

fn handle_board(service: &dyn LeadService, filter: KanbanFilter, form: Option<i64>, json: bool) -> Result<()> {
    let mut controller = KanbanController::new(service, ConsoleNotifier, filter);
    controller.load().context("Failed to load the kanban board")?;
    let store = controller.store();
    let now = Local::now();

    if json {
        let output = serde_json::json!({
            "columns": store.board(),
            "statistics": store.statistics(),
            "alerts": store.board().follow_up_alerts(&now),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let view = BoardView {
            now: &now,
            form_filter: form,
            width: get_terminal_width(),
            is_tty: is_tty(),
        };
        println!("{}", format_board(store.board(), &store.statistics(), &view));
    }
    Ok(())
}

fn handle_stats(service: &dyn LeadService, json: bool) -> Result<()> {
    let stats = service.statistics().context("Failed to load lead statistics")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", format_statistics(&stats, is_tty()));
    }
    Ok(())
}

fn handle_move(service: &dyn LeadService, lead: &str, stage: &str) -> Result<()> {
    let lead_id = parse_lead_id_arg(lead);

    let mut controller = KanbanController::new(service, ConsoleNotifier, KanbanFilter::default());
    controller.load().context("Failed to load the kanban board")?;
    let target = controller.store().board()
        .resolve_stage(stage)
        .unwrap_or_else(|e| user_error(&e.to_string()));
    let target_name = controller.store().board()
        .column(target)
        .map(|col| col.stage.name.clone())
        .unwrap_or_else(|| target.to_string());

    match controller.move_lead(lead_id, target) {
        MoveOutcome::Committed(lead) => {
            println!("Moved lead {} ({}) to '{}'", lead.id, lead.display_name(), target_name);
            Ok(())
        }
        MoveOutcome::Ignored(IgnoreReason::SameStage) => {
            println!("Lead {} is already in '{}'", lead_id, target_name);
            Ok(())
        }
        MoveOutcome::Ignored(IgnoreReason::UnknownLead) => {
            user_error(&format!("Lead {} not found on the board", lead_id))
        }
        MoveOutcome::Ignored(reason) => user_error(&format!("Cannot move lead {}: {}", lead_id, reason)),
        MoveOutcome::RolledBack(err) => {
            Err(anyhow::Error::new(err).context(format!("Failed to move lead {} to '{}'", lead_id, target_name)))
        }
    }
}

fn handle_convert(service: &dyn LeadService, lead: &str, data: &[String]) -> Result<()> {
    let lead_id = parse_lead_id_arg(lead);
    let data = parse_key_values(data).unwrap_or_else(|e| user_error(&e.to_string()));

    let mut controller = KanbanController::new(service, ConsoleNotifier, KanbanFilter::default());
    controller.load().context("Failed to load the kanban board")?;

    match controller.convert(lead_id, &data) {
        Ok(result) => {
            if !result.is_null() {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Ok(())
        }
        Err(ConvertError::AlreadyConverted(id)) => {
            user_error(&format!("Lead {} has already been converted", id))
        }
        Err(ConvertError::Service(err)) if err.is_not_found() => {
            user_error(&format!("Lead {} not found", lead_id))
        }
        Err(ConvertError::Service(err)) => {
            Err(anyhow::Error::new(err).context(format!("Failed to convert lead {}", lead_id)))
        }
    }
}

fn parse_lead_args_or_exit(args: Vec<String>) -> ParsedLeadArgs {
    parse_lead_args(args).unwrap_or_else(|e| user_error(&e.to_string()))
}

fn handle_lead(service: &dyn LeadService, cmd: LeadCommands) -> Result<()> {
    match cmd {
        LeadCommands::Add { args } => {
            let parsed = parse_lead_args_or_exit(args);
            let client_name = parsed.client_name()
                .unwrap_or_else(|| user_error("Client name is required. Usage: leadboard lead add <name> phone=<number>"));
            if let Err(e) = validate_non_empty(&client_name, "Client name") {
                user_error(&e);
            }
            let phone_number = parsed.phone.clone()
                .unwrap_or_else(|| user_error("Phone number is required (phone=<number>)"));
            if let Err(e) = validate_phone(&phone_number) {
                user_error(&e);
            }

            let stage = match parsed.stage.as_deref() {
                Some(input) => Some(resolve_stage_arg(&fetch_stages(service)?, input)),
                None => None,
            };
            let draft = LeadDraft {
                client_name,
                phone_number,
                stage,
                follow_up_date: parsed.follow_up.flatten(),
                call_status: parsed.call_status.flatten(),
                is_considering: parsed.considering,
            };

            let lead = service.create_lead(&draft).context("Failed to create lead")?;
            log::info!("Created lead {}", lead.id);
            println!("Created lead {} ({})", lead.id, lead.display_name());
            Ok(())
        }
        LeadCommands::List { search, json } => {
            let leads = service.list_leads(search.as_deref()).context("Failed to list leads")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&leads)?);
            } else {
                let stages = fetch_stages(service)?;
                println!("{}", format_lead_table(&leads, &stages, is_tty()));
            }
            Ok(())
        }
        LeadCommands::Show { lead, json } => {
            let lead = fetch_lead(service, parse_lead_id_arg(&lead))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lead)?);
            } else {
                let stages = fetch_stages(service)?;
                println!("{}", format_lead_summary(&lead, &stages, &Local::now(), is_tty()));
            }
            Ok(())
        }
        LeadCommands::Edit { lead, replace, args } => {
            let lead_id = parse_lead_id_arg(&lead);
            let parsed = parse_lead_args_or_exit(args);
            if parsed.stage.is_some() {
                user_error("Field 'stage' cannot be modified with edit.\n  Use 'leadboard move <lead> <stage>' to change a lead's stage.");
            }
            if let Some(phone) = parsed.phone.as_deref() {
                if let Err(e) = validate_phone(phone) {
                    user_error(&e);
                }
            }
            let client_name = parsed.client_name();
            if let Some(name) = client_name.as_deref() {
                if let Err(e) = validate_non_empty(name, "Client name") {
                    user_error(&e);
                }
            }

            let updated = if replace {
                let current = fetch_lead(service, lead_id)?;
                if current.is_converted {
                    user_error(&format!("Lead {} has been converted and cannot be replaced", lead_id));
                }
                let draft = LeadDraft {
                    client_name: client_name.unwrap_or_else(|| current.display_name().to_string()),
                    phone_number: parsed.phone.clone()
                        .or_else(|| current.phone_number.clone())
                        .unwrap_or_default(),
                    stage: Some(current.stage),
                    follow_up_date: parsed.follow_up.unwrap_or(current.follow_up_date),
                    call_status: parsed.call_status.unwrap_or(current.call_status),
                    is_considering: Some(parsed.considering.unwrap_or(current.is_considering)),
                };
                service.update_lead(lead_id, &draft)
            } else {
                let patch = LeadPatch {
                    client_name,
                    phone_number: parsed.phone.clone(),
                    stage: None,
                    follow_up_date: parsed.follow_up,
                    call_status: parsed.call_status,
                    is_considering: parsed.considering,
                };
                if patch.is_empty() {
                    user_error("Nothing to change. Usage: leadboard lead edit <id> field=value ...");
                }
                service.patch_lead(lead_id, &patch)
            };

            match updated {
                Ok(lead) => {
                    println!("Modified lead {} ({})", lead.id, lead.display_name());
                    Ok(())
                }
                Err(err) if err.is_not_found() => user_error(&format!("Lead {} not found", lead_id)),
                Err(err) => Err(anyhow::Error::new(err).context(format!("Failed to modify lead {}", lead_id))),
            }
        }
        LeadCommands::Delete { lead, yes } => {
            let lead_id = parse_lead_id_arg(&lead);
            if !yes {
                user_error(&format!("Refusing to delete lead {} without --yes", lead_id));
            }
            match service.delete_lead(lead_id) {
                Ok(()) => {
                    log::info!("Deleted lead {}", lead_id);
                    println!("Deleted lead {}", lead_id);
                    Ok(())
                }
                Err(err) if err.is_not_found() => user_error(&format!("Lead {} not found", lead_id)),
                Err(err) => Err(anyhow::Error::new(err).context(format!("Failed to delete lead {}", lead_id))),
            }
        }
    }
}

fn handle_stages(service: &dyn LeadService, cmd: StageCommands) -> Result<()> {
    match cmd {
        StageCommands::List { json } => {
            let stages = fetch_stages(service)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stages)?);
            } else {
                println!("{}", format_stage_table(&stages, is_tty()));
            }
            Ok(())
        }
        StageCommands::Add { name, color, order } => {
            if let Err(e) = validate_non_empty(&name, "Stage name") {
                user_error(&e);
            }
            if let Some(color) = color.as_deref() {
                if let Err(e) = validate_color(color) {
                    user_error(&e);
                }
            }
            let draft = StageDraft { name: name.trim().to_string(), color, order };
            let stage = service.create_stage(&draft).context("Failed to create stage")?;
            println!("Created stage '{}' (id: {})", stage.name, stage.id);
            Ok(())
        }
        StageCommands::Edit { stage, name, color, order } => {
            if let Some(name) = name.as_deref() {
                if let Err(e) = validate_non_empty(name, "Stage name") {
                    user_error(&e);
                }
            }
            if let Some(color) = color.as_deref() {
                if let Err(e) = validate_color(color) {
                    user_error(&e);
                }
            }
            if name.is_none() && color.is_none() && order.is_none() {
                user_error("Nothing to change. Use --name, --color or --order.");
            }

            let stages = fetch_stages(service)?;
            let id = resolve_stage_arg(&stages, &stage);
            let current = stages.iter()
                .find(|s| s.id == id)
                .context("Resolved stage missing from stage list")?;
            let draft = StageDraft {
                name: name.map(|n| n.trim().to_string()).unwrap_or_else(|| current.name.clone()),
                color: color.or_else(|| current.color.clone()),
                order: Some(order.unwrap_or(current.order)),
            };
            let updated = service.update_stage(id, &draft)
                .with_context(|| format!("Failed to modify stage '{}'", current.name))?;
            println!("Modified stage '{}' (id: {})", updated.name, updated.id);
            Ok(())
        }
        StageCommands::Delete { stage, yes } => {
            let stages = fetch_stages(service)?;
            let id = resolve_stage_arg(&stages, &stage);
            let name = stage_label(&stages, id);
            if !yes {
                user_error(&format!("Refusing to delete stage '{}' without --yes", name));
            }
            service.delete_stage(id)
                .with_context(|| format!("Failed to delete stage '{}'", name))?;
            println!("Deleted stage '{}'", name);
            Ok(())
        }
        StageCommands::Reorder { stages: inputs } => {
            let stages = fetch_stages(service)?;
            let mut ordered: Vec<StageId> = Vec::with_capacity(stages.len());
            for input in &inputs {
                let id = resolve_stage_arg(&stages, input);
                if ordered.contains(&id) {
                    user_error(&format!("Stage '{}' is listed more than once", stage_label(&stages, id)));
                }
                ordered.push(id);
            }
            for stage in &stages {
                if !ordered.contains(&stage.id) {
                    ordered.push(stage.id);
                }
            }

            service.reorder_stages(&StageOrder::sequence(&ordered))
                .context("Failed to reorder stages")?;
            let names: Vec<String> = ordered.iter().map(|id| stage_label(&stages, *id)).collect();
            println!("Stage order: {}", names.join(", "));
            Ok(())
        }
    }
}
