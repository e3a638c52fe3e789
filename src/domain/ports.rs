use crate::domain::model::{CommandOutput, FilterPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Runs one external process to completion.
///
/// Implementations must terminate the process when `timeout` elapses and report
/// that as [`crate::DiscoveryError::Timeout`]. A non-zero exit is *not* an error at
/// this level; the invoker interprets the captured output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput>;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_host(&self) -> &str;
    fn bind_port(&self) -> u16;
    fn static_dir(&self) -> &Path;
    fn command(&self) -> &[String];
    fn timeout(&self) -> Duration;
    fn serialize_invocations(&self) -> bool;
    fn scheme(&self) -> &str;
    fn filter_policy(&self) -> FilterPolicy;
}
