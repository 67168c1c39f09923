// Application layer - use cases and validation on top of the repository.
// Both the HTTP API and the CLI go through `SubscriptionService`.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
