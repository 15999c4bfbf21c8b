pub mod barrier;
pub mod coordination;
pub mod ingestion;
pub mod master;
pub mod results;
pub mod utils;
