//! Kernel module - platform access and remote-call plumbing.

pub mod confluence;
pub mod dry_run;
pub mod retry;
pub mod test_dependencies;
pub mod traits;

pub use confluence::{ConfluenceDestination, ConfluenceSource, ListLimits};
pub use dry_run::DryRunDestination;
pub use retry::{CallClass, RetryConfig, RetryPolicy};
pub use test_dependencies::{
    CreatedComment, CreatedPage, MockDestinationPlatform, MockSourcePlatform, SourceCall,
    UploadedAttachment,
};
pub use traits::*;
