pub mod fail_over;
pub mod master_config;
pub mod master_context;
pub mod master_coordinator;
pub mod master_result_store;
