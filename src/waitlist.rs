//! Waitlist capture

use crate::error::{MarketaError, Result};
use crate::notice::Notice;
use crate::store::RecordStore;

/// Add an email to the waitlist
///
/// The address is trimmed. An empty address is rejected without touching
/// the store; anything else is written once as-is. Duplicates and
/// malformed addresses are the table's concern.
///
/// # Examples
///
/// ```
/// use marketa::store::MemoryStore;
/// use marketa::waitlist::join_waitlist;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let notice = join_waitlist(&store, "  ada@example.com ").await.unwrap();
/// assert_eq!(notice.title, "Welcome to the waitlist!");
/// assert_eq!(store.waitlist(), vec!["ada@example.com".to_string()]);
/// # });
/// ```
pub async fn join_waitlist(store: &dyn RecordStore, email: &str) -> Result<Notice> {
    let email = email.trim();
    if email.is_empty() {
        return Err(MarketaError::Validation("Please enter your email".to_string()).into());
    }

    store.insert_waitlist_email(email).await?;
    tracing::info!("Waitlist entry added");

    Ok(Notice::info(
        "Welcome to the waitlist!",
        Some("We'll notify you when Marketa AI launches.".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_empty_email_is_rejected_without_write() {
        let store = MemoryStore::new();
        let err = join_waitlist(&store, "   ").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MarketaError>(),
            Some(MarketaError::Validation(_))
        ));
        assert!(store.waitlist().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_written_again() {
        let store = MemoryStore::new();
        join_waitlist(&store, "a@b.c").await.unwrap();
        join_waitlist(&store, "a@b.c").await.unwrap();
        assert_eq!(store.waitlist().len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::new();
        store.fail_inserts(true);
        assert!(join_waitlist(&store, "a@b.c").await.is_err());
    }
}
