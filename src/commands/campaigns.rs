//! Campaign command handlers
//!
//! `campaigns new` runs the three-step wizard either interactively (one
//! prompt per field, `/back` and `/cancel` available at every prompt) or
//! from flags, so both paths go through the same step validation.

use crate::auth::Route;
use crate::campaigns::CampaignService;
use crate::cli::{CampaignCommand, NewCampaignArgs};
use crate::commands::open_dashboard;
use crate::config::Config;
use crate::error::{MarketaError, Result};
use crate::store::{Campaign, CampaignStatus, Channel, Objective};
use crate::wizard::{CampaignWizard, WizardStep};
use colored::Colorize;
use prettytable::{format, Table};
use rustyline::DefaultEditor;

/// Dispatch a campaigns subcommand
pub async fn handle_campaigns(config: &Config, command: CampaignCommand) -> Result<()> {
    let route = match &command {
        CampaignCommand::Show { id } => Route::CampaignDetail(*id),
        _ => Route::Campaigns,
    };
    let (session, store) = open_dashboard(config, route)?;
    let campaigns = CampaignService::new(store, session.user.id);

    match command {
        CampaignCommand::List => list(&campaigns).await,
        CampaignCommand::Show { id } => show(&campaigns, id).await,
        CampaignCommand::New(args) => {
            let id = if args.name.is_some() {
                create_from_args(&campaigns, args).await?
            } else {
                match run_wizard(&campaigns).await? {
                    Some(id) => id,
                    None => {
                        println!("{}", "Campaign creation cancelled.".yellow());
                        return Ok(());
                    }
                }
            };
            println!(
                "{} Open it at {}",
                "Campaign created successfully!".green().bold(),
                Route::CampaignDetail(id).to_string().cyan()
            );
            Ok(())
        }
        CampaignCommand::SetStatus { id, status } => {
            let status = CampaignStatus::parse_str(&status).map_err(MarketaError::Validation)?;
            let campaign = campaigns.set_status(id, status).await?;
            println!("Campaign {} is now {}", campaign.name.bold(), campaign.status);
            Ok(())
        }
        CampaignCommand::Delete { id } => {
            campaigns.delete(id).await?;
            println!("{}", format!("Deleted campaign {}", id).green());
            Ok(())
        }
    }
}

fn format_budget(budget: Option<f64>) -> String {
    match budget {
        Some(b) => format!("${:.2}", b),
        None => "-".to_string(),
    }
}

fn format_channels(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "-".to_string();
    }
    channels
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn colored_status(status: CampaignStatus) -> colored::ColoredString {
    match status {
        CampaignStatus::Draft => status.to_string().yellow(),
        CampaignStatus::Active => status.to_string().green(),
        CampaignStatus::Paused => status.to_string().red(),
    }
}

async fn list(campaigns: &CampaignService) -> Result<()> {
    let items = campaigns.list().await?;
    if items.is_empty() {
        println!("{}", "No campaigns yet.".yellow());
        println!("Use {} to create one.", "marketa campaigns new".cyan());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Objective".bold(),
        "Status".bold(),
        "Budget".bold(),
        "Channels".bold(),
        "Created".bold()
    ]);

    for campaign in items {
        let name = if campaign.name.chars().count() > 32 {
            format!("{}...", campaign.name.chars().take(29).collect::<String>())
        } else {
            campaign.name.clone()
        };
        table.add_row(prettytable::row![
            campaign.id.to_string().cyan(),
            name,
            campaign.objective.label(),
            colored_status(campaign.status),
            format_budget(campaign.budget_total),
            format_channels(&campaign.channels),
            campaign.created_at.format("%Y-%m-%d")
        ]);
    }

    println!("\nCampaigns:");
    table.printstd();
    println!();
    Ok(())
}

fn print_campaign(campaign: &Campaign) {
    println!("\n{}", campaign.name.bold());
    println!("  ID:        {}", campaign.id);
    println!("  Objective: {}", campaign.objective.label());
    println!("  Status:    {}", colored_status(campaign.status));
    println!("  Budget:    {}", format_budget(campaign.budget_total));
    println!("  Channels:  {}", format_channels(&campaign.channels));
    println!(
        "  Created:   {}",
        campaign.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(notes) = &campaign.strategy_prompt {
        println!("\n  Strategy notes:\n  {}", notes);
    }
    println!();
}

async fn show(campaigns: &CampaignService, id: i64) -> Result<()> {
    match campaigns.get(id).await? {
        Some(campaign) => {
            print_campaign(&campaign);
            Ok(())
        }
        None => Err(MarketaError::Store(format!("Campaign {} not found", id)).into()),
    }
}

/// Fill the wizard from flags and submit it
async fn create_from_args(campaigns: &CampaignService, args: NewCampaignArgs) -> Result<i64> {
    let mut wizard = CampaignWizard::new();
    wizard.open();

    wizard.set_name(args.name.unwrap_or_default());
    if let Some(objective) = args.objective {
        wizard.set_objective(Objective::parse_str(&objective).map_err(MarketaError::Validation)?);
    }
    if let Some(status) = args.status {
        wizard.set_status(CampaignStatus::parse_str(&status).map_err(MarketaError::Validation)?);
    }
    wizard.next()?;

    for channel in &args.channels {
        let channel = Channel::parse_str(channel).map_err(MarketaError::Validation)?;
        if !wizard.draft().channels.contains(&channel) {
            wizard.toggle_channel(channel);
        }
    }
    wizard.next()?;

    if let Some(budget) = args.budget {
        wizard.set_budget(&budget)?;
    }
    if let Some(notes) = args.notes {
        wizard.set_notes(notes);
    }

    wizard.submit(campaigns).await
}

enum Answer {
    Value(String),
    Keep,
    Back,
    Cancel,
}

fn ask(rl: &mut DefaultEditor, label: &str, current: &str) -> Result<Answer> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let line = rl
        .readline(&prompt)
        .map_err(|e| MarketaError::Validation(format!("Input aborted: {}", e)))?;

    Ok(match line.trim() {
        "" => Answer::Keep,
        "/back" => Answer::Back,
        "/cancel" => Answer::Cancel,
        value => Answer::Value(value.to_string()),
    })
}

/// Run the wizard interactively; `None` means the user cancelled
async fn run_wizard(campaigns: &CampaignService) -> Result<Option<i64>> {
    let mut rl = DefaultEditor::new()?;
    let mut wizard = CampaignWizard::new();
    wizard.open();

    println!("\n{}", "Create New Campaign".bold());
    println!("Type /back for the previous step, /cancel to discard.\n");

    loop {
        let step = wizard.step();
        println!("{}", step.to_string().cyan());

        let answer = match step {
            WizardStep::Basics => basics_step(&mut rl, &mut wizard)?,
            WizardStep::Channels => channels_step(&mut rl, &mut wizard)?,
            WizardStep::Details => details_step(&mut rl, &mut wizard)?,
        };

        match answer {
            Answer::Cancel => {
                wizard.close();
                return Ok(None);
            }
            Answer::Back => {
                wizard.back();
                continue;
            }
            Answer::Keep | Answer::Value(_) => {}
        }

        if step == WizardStep::Details {
            match wizard.submit(campaigns).await {
                Ok(id) => return Ok(Some(id)),
                Err(e) => {
                    eprintln!("{}", format!("Error: {}", e).red());
                    println!("Fix the details and try again, or /cancel.");
                }
            }
        } else if let Err(e) = wizard.next() {
            eprintln!("{}", e.to_string().red());
        }
    }
}

fn basics_step(rl: &mut DefaultEditor, wizard: &mut CampaignWizard) -> Result<Answer> {
    let name = wizard.draft().name.clone();
    match ask(rl, "Campaign name", &name)? {
        Answer::Value(name) => wizard.set_name(name),
        Answer::Keep => {}
        other => return Ok(other),
    }

    let options: Vec<String> = Objective::ALL.iter().map(|o| o.to_string()).collect();
    let current = wizard.draft().objective.to_string();
    loop {
        match ask(rl, &format!("Objective ({})", options.join("/")), &current)? {
            Answer::Value(value) => match Objective::parse_str(&value) {
                Ok(objective) => {
                    wizard.set_objective(objective);
                    break;
                }
                Err(e) => eprintln!("{}", e.red()),
            },
            Answer::Keep => break,
            other => return Ok(other),
        }
    }

    let current = wizard.draft().status.to_string();
    loop {
        match ask(rl, "Status (draft/active/paused)", &current)? {
            Answer::Value(value) => match CampaignStatus::parse_str(&value) {
                Ok(status) => {
                    wizard.set_status(status);
                    break;
                }
                Err(e) => eprintln!("{}", e.red()),
            },
            Answer::Keep => break,
            other => return Ok(other),
        }
    }

    Ok(Answer::Keep)
}

fn channels_step(rl: &mut DefaultEditor, wizard: &mut CampaignWizard) -> Result<Answer> {
    loop {
        for channel in Channel::ALL {
            let mark = if wizard.draft().channels.contains(&channel) {
                "[x]".green()
            } else {
                "[ ]".normal()
            };
            println!("  {} {}", mark, channel);
        }

        match ask(rl, "Toggle channels (comma separated, empty to continue)", "")? {
            Answer::Value(value) => {
                for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match Channel::parse_str(name) {
                        Ok(channel) => {
                            wizard.toggle_channel(channel);
                        }
                        Err(e) => eprintln!("{}", e.red()),
                    }
                }
            }
            other => return Ok(other),
        }
    }
}

fn details_step(rl: &mut DefaultEditor, wizard: &mut CampaignWizard) -> Result<Answer> {
    loop {
        let current = wizard
            .draft()
            .budget
            .map(|b| b.to_string())
            .unwrap_or_default();
        match ask(rl, "Total budget (optional)", &current)? {
            Answer::Value(value) => match wizard.set_budget(&value) {
                Ok(()) => break,
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            Answer::Keep => break,
            other => return Ok(other),
        }
    }

    let notes = wizard.draft().notes.clone();
    match ask(rl, "Strategy notes (optional)", &notes)? {
        Answer::Value(value) => wizard.set_notes(value),
        Answer::Keep => {}
        other => return Ok(other),
    }

    Ok(Answer::Keep)
}
