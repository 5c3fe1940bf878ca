pub mod activate_template;
pub mod contract_lifecycle;
pub mod create_template;
pub mod dispatch_document;
pub mod generate_document;
pub mod get_active_template;
pub mod list_dispatch_logs;
pub mod list_templates;
pub mod render_and_dispatch;
pub mod render_document;
pub mod resend_document;

pub use activate_template::ActivateTemplateUseCase;
pub use contract_lifecycle::ContractLifecycleUseCase;
pub use create_template::{CreateTemplateInput, CreateTemplateUseCase};
pub use dispatch_document::{DispatchDocumentUseCase, DispatchSettings};
pub use generate_document::{DocumentProfile, GenerateDocumentUseCase, GeneratedDocument};
pub use get_active_template::GetActiveTemplateUseCase;
pub use list_dispatch_logs::{ListDispatchLogsInput, ListDispatchLogsUseCase};
pub use list_templates::ListTemplatesUseCase;
pub use render_and_dispatch::RenderAndDispatchUseCase;
pub use render_document::{RenderDocumentUseCase, RenderedContract};
pub use resend_document::ResendDocumentUseCase;
