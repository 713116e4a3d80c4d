use tracing::{info, warn};

use crate::shortcode::ShortCode;
use crate::storage::{LinkStore, StorageResult};

/// Resolves `code` to its original URL and counts the visit.
///
/// Malformed and unknown codes both come back as `Ok(None)`; a malformed
/// code never reaches storage.
pub async fn resolve(store: &dyn LinkStore, code: &str) -> StorageResult<Option<String>> {
    let code = match ShortCode::parse(code) {
        Ok(code) => code,
        Err(_) => {
            warn!(short_code = code, "invalid short code format");
            return Ok(None);
        }
    };

    let Some(record) = store.find_by_code(code.as_str()).await? else {
        warn!(short_code = %code, "short code not found");
        return Ok(None);
    };

    if !store.record_click(code.as_str()).await? {
        warn!(short_code = %code, "short code vanished before click was recorded");
        return Ok(None);
    }

    info!(short_code = %code, url = %record.original_url, "redirect");
    Ok(Some(record.original_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> Arc<dyn LinkStore> {
        let store = SqliteStore::new("sqlite::memory:", 5, Duration::from_secs(3))
            .await
            .unwrap();
        store.init().await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_resolve_counts_each_hit() {
        let store = setup().await;
        store.create("https://example.com/page", "aB3xZ9").await.unwrap();

        let mut stamps = vec![];
        for _ in 0..3 {
            let url = resolve(store.as_ref(), "aB3xZ9").await.unwrap();
            assert_eq!(url.as_deref(), Some("https://example.com/page"));
            stamps.push(store.find_by_code("aB3xZ9").await.unwrap().unwrap().last_clicked.unwrap());
        }

        let record = store.find_by_code("aB3xZ9").await.unwrap().unwrap();
        assert_eq!(record.clicks, 3);
        assert_eq!(record.last_clicked, Some(stamps[2]));
        assert!(stamps[0] <= stamps[1] && stamps[1] <= stamps[2]);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_leaves_state_alone() {
        let store = setup().await;
        store.create("https://example.com", "known1").await.unwrap();

        assert_eq!(resolve(store.as_ref(), "nope00").await.unwrap(), None);

        let record = store.find_by_code("known1").await.unwrap().unwrap();
        assert_eq!(record.clicks, 0);
        assert!(record.last_clicked.is_none());
    }

    #[tokio::test]
    async fn test_resolve_malformed_code() {
        let store = setup().await;
        for code in ["", "short", "toolong1", "bad-cd", "favicon.ico"] {
            assert_eq!(resolve(store.as_ref(), code).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_concurrent_resolves_lose_no_clicks() {
        let store = setup().await;
        store.create("https://example.com/hot", "hot123").await.unwrap();
        store.record_click("hot123").await.unwrap();

        let mut handles = vec![];
        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                resolve(store.as_ref(), "hot123").await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let record = store.find_by_code("hot123").await.unwrap().unwrap();
        assert_eq!(record.clicks, 101);
    }
}
