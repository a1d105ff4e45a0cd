use crate::auth::Route;
use crate::commands::open_dashboard;
use crate::config::Config;
use crate::error::Result;
use crate::store::{ConversationRecord, RecordStore};
use colored::Colorize;
use prettytable::{format, Table};

fn excerpt(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max {
        format!(
            "{}...",
            single_line.chars().take(max.saturating_sub(3)).collect::<String>()
        )
    } else {
        single_line
    }
}

fn response_cell(record: &ConversationRecord) -> String {
    match &record.response {
        Some(response) if !response.is_empty() => excerpt(response, 50),
        _ => "(pending)".to_string(),
    }
}

/// Handle `marketa history`
pub async fn handle_history(config: &Config, campaign: Option<i64>) -> Result<()> {
    let (session, store) = open_dashboard(config, Route::Assistant)?;
    let records = store.list_conversations(&session.user.id, campaign).await?;

    if records.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Campaign".bold(),
        "Prompt".bold(),
        "Response".bold(),
        "Created".bold()
    ]);

    for record in &records {
        let campaign = record
            .campaign_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(prettytable::row![
            record.id.to_string().cyan(),
            campaign,
            excerpt(&record.prompt, 40),
            response_cell(record),
            record.created_at.format("%Y-%m-%d %H:%M")
        ]);
    }

    println!("\nConversation History:");
    table.printstd();
    println!();
    println!(
        "Use {} to continue the conversation.",
        "marketa assistant".cyan()
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("line\nbreak", 20), "line break");
        assert_eq!(excerpt("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_pending_response_cell() {
        let mut record = ConversationRecord {
            id: 1,
            prompt: "hi".to_string(),
            response: None,
            user_id: None,
            campaign_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(response_cell(&record), "(pending)");
        record.response = Some("hello".to_string());
        assert_eq!(response_cell(&record), "hello");
    }
}
