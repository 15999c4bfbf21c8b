use crate::domain::utils::id::ApplicationId;

/// Iteration number of the initialization step. Its master node holds the ingestion server
/// address instead of a master result.
pub const GUAGUA_INIT_STEP: u32 = 0;

pub const MASTER_NODE_NAME: &str = "master";
pub const SPLIT_SUFFIX: &str = "-split";

/// `/A`
pub fn app_node(app_id: &ApplicationId) -> String {
    format!("/{}", app_id)
}

/// `/A/master`
pub fn master_base_node(app_id: &ApplicationId) -> String {
    format!("{}/{}", app_node(app_id), MASTER_NODE_NAME)
}

/// `/A/master/<iteration>`
pub fn master_node(app_id: &ApplicationId, iteration: u32) -> String {
    format!("{}/{}", master_base_node(app_id), iteration)
}

/// `/A/master/<iteration>-split`, parent of the chunk nodes of an oversized master result.
pub fn master_split_node(app_id: &ApplicationId, iteration: u32) -> String {
    format!("{}{}", master_node(app_id, iteration), SPLIT_SUFFIX)
}

/// `/A/master/<iteration>-split/<chunk>`
pub fn master_split_chunk_node(app_id: &ApplicationId, iteration: u32, chunk: usize) -> String {
    format!("{}/{}", master_split_node(app_id, iteration), chunk)
}

/// Parses a child name of the master base node into an iteration; split companions and other
/// names yield `None`.
pub fn parse_iteration(child: &str) -> Option<u32> {
    if child.is_empty() || !child.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    child.parse().ok()
}
