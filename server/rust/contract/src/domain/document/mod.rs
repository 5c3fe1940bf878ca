pub mod font_metrics;
pub mod layout;
pub mod paginator;
pub mod pdf;
pub mod renderer;
pub mod substitution;

pub use layout::{LayoutOptions, PageGeometry, PaginatedDocument, Signatory, SignatureBlock, Watermark};
pub use paginator::paginate;
pub use renderer::{PdfRenderer, RenderedArtifact, PDF_CONTENT_TYPE};
pub use substitution::{substitute, SubstitutionContext};
