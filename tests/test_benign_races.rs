mod support;

use std::sync::Arc;

use bsp_master_coordinator::domain::coordination::memory_store::InMemoryCoordinationStore;
use bsp_master_coordinator::domain::master::master_context::MasterContext;
use bsp_master_coordinator::domain::master::master_coordinator::MasterCoordinator;
use bsp_master_coordinator::domain::utils::id::ApplicationId;
use logtest::Logger;

// The logger is process global, so everything that asserts on log output lives in one test.
#[tokio::test]
async fn benign_store_races_are_logged_as_warnings() {
    let mut logger = Logger::start();

    let store = InMemoryCoordinationStore::new();
    let mut config = support::test_config();
    config.cleanup_enabled = false;

    let mut ctx: MasterContext<u64, u64> = MasterContext::new(ApplicationId::new("race-app"), 1, 1, &config, "u64");
    let mut master: MasterCoordinator<u64, u64> =
        MasterCoordinator::new(config.clone(), Arc::new(store.clone()), support::serializer::<u64>(), support::serializer::<u64>());

    master.pre_application(&mut ctx).await.unwrap();
    ctx.advance();
    support::submit(master.server_addr().unwrap().port(), "worker-0", 1, &5u64).await;
    master.pre_iteration(&mut ctx).await.unwrap();
    ctx.master_result = Some(5);
    master.post_iteration(&mut ctx).await.unwrap();

    // A second master publishing the same iteration hits the existing nodes.
    let mut other: MasterCoordinator<u64, u64> =
        MasterCoordinator::new(config, Arc::new(store.clone()), support::serializer::<u64>(), support::serializer::<u64>());
    let mut other_ctx: MasterContext<u64, u64> = MasterContext::new(ApplicationId::new("race-app"), 1, 1, &support::test_config(), "u64");
    other.pre_application(&mut other_ctx).await.unwrap();
    assert_eq!(other_ctx.current_iteration, 1);
    other_ctx.master_result = Some(5);
    other.post_iteration(&mut other_ctx).await.unwrap();

    other.post_application(&mut other_ctx).await.unwrap();
    master.post_application(&mut ctx).await.unwrap();

    let warnings: Vec<String> = std::iter::from_fn(|| logger.pop()).filter(|record| record.level() == log::Level::Warn).map(|record| record.args().to_string()).collect();

    assert!(warnings.iter().any(|w| w == "Node exists: /race-app/master/0"), "{:?}", warnings);
    assert!(warnings.iter().any(|w| w == "Has such node: /race-app/master/1"), "{:?}", warnings);
}
