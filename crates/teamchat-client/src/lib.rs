pub mod backend;
pub mod error;
pub mod http;
pub mod render;
pub mod session;

pub use backend::{ChatBackend, Subscription};
pub use error::ClientError;
pub use http::HttpBackend;
pub use session::{ChatSession, SendOutcome};
