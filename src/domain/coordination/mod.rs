pub mod coordination_store;
pub mod memory_store;
pub mod znode_paths;
