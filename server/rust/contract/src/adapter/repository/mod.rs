pub mod contract_in_memory;
pub mod contract_postgres;
pub mod dispatch_log_in_memory;
pub mod dispatch_log_postgres;
pub mod party_in_memory;
pub mod party_postgres;
pub mod template_in_memory;
pub mod template_postgres;
