pub mod contract_repository;
pub mod dispatch_log_repository;
pub mod party_repository;
pub mod template_repository;

pub use contract_repository::ContractRepository;
pub use dispatch_log_repository::DispatchLogRepository;
pub use party_repository::PartyRepository;
pub use template_repository::TemplateRepository;
