pub mod contract;
pub mod contract_template;
pub mod dispatch_log;
pub mod dispatch_result;
pub mod party;

pub use contract::{Contract, ContractStep, TransitionPolicy};
pub use contract_template::ContractTemplate;
pub use dispatch_log::DispatchLogEntry;
pub use dispatch_result::{DispatchPolicy, DispatchResult, RecipientOutcome};
pub use party::Party;
