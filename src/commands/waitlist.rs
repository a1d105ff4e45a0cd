use crate::config::Config;
use crate::error::Result;
use crate::store::RestStore;
use crate::waitlist::join_waitlist;
use colored::Colorize;

/// Handle `marketa waitlist <email>`
pub async fn handle_waitlist(config: &Config, email: &str) -> Result<()> {
    let store = RestStore::new(&config.backend)?;
    match join_waitlist(&store, email).await {
        Ok(notice) => {
            println!("{}", notice.title.green().bold());
            if let Some(description) = notice.description {
                println!("{}", description);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            Err(e)
        }
    }
}
