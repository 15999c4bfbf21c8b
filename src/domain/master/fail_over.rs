use crate::domain::coordination::coordination_store::CoordinationStore;
use crate::domain::coordination::znode_paths::{GUAGUA_INIT_STEP, master_base_node, parse_iteration};
use crate::domain::utils::id::ApplicationId;
use crate::error::{Result, StoreError};

/// Highest iteration with a persisted master result, or [`GUAGUA_INIT_STEP`] for a fresh job.
///
/// A master node only appears once its iteration's post-iteration step completed, so a
/// restarted master continues with the iteration after the returned one.
pub async fn last_persisted_iteration(store: &dyn CoordinationStore, app_id: &ApplicationId) -> Result<u32> {
    let base = master_base_node(app_id);
    let children = match store.get_children(&base).await {
        Ok(children) => children,
        Err(StoreError::NoNode(_)) => return Ok(GUAGUA_INIT_STEP),
        Err(e) => return Err(e.into()),
    };

    let last = children.iter().filter_map(|child| parse_iteration(child)).max().unwrap_or(GUAGUA_INIT_STEP);
    if last != GUAGUA_INIT_STEP {
        log::info!("Fail-over: application {} resumes after iteration {}.", app_id, last);
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordination::coordination_store::CreateMode;
    use crate::domain::coordination::memory_store::InMemoryCoordinationStore;

    #[tokio::test]
    async fn fresh_application_starts_at_init_step() {
        let store = InMemoryCoordinationStore::new();
        assert_eq!(last_persisted_iteration(&store, &ApplicationId::new("app")).await.unwrap(), GUAGUA_INIT_STEP);
    }

    #[tokio::test]
    async fn picks_highest_numeric_child() {
        let store = InMemoryCoordinationStore::new();
        for path in ["/app", "/app/master", "/app/master/0", "/app/master/4", "/app/master/5", "/app/master/9-split"] {
            store.create_node(path, None, CreateMode::Persistent, false).await.unwrap();
        }

        assert_eq!(last_persisted_iteration(&store, &ApplicationId::new("app")).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = InMemoryCoordinationStore::new();
        store.close().await.unwrap();
        assert!(last_persisted_iteration(&store, &ApplicationId::new("app")).await.is_err());
    }
}
