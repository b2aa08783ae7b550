pub mod admission_consensus;
pub mod chunked_sync;
pub mod contract_execution;
