pub mod blob_store;
pub mod image_fetcher;
pub mod notifier;

pub use blob_store::{BlobStore, SignedLink};
pub use image_fetcher::{ImageFetchError, ImageFetcher};
pub use notifier::{Attachment, Notifier, NotifierError, OutgoingMessage};
