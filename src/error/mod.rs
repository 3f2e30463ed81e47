pub mod retry;
pub mod types;

pub use retry::{retry_with_backoff, RetryConfig};
pub use types::AppError;
