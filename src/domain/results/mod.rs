pub mod iteration_result_set;
pub mod result_serializer;
pub mod worker_results;
