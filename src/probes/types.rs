use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::{ShareRecord, TargetHost};

/// Produces the hosts to probe. Failure or an empty result is fatal to the
/// run; everything downstream tolerates partial failure, this does not.
#[async_trait]
pub trait TargetEnumerator: Send + Sync {
    fn name(&self) -> &'static str;
    async fn enumerate(&self) -> Result<Vec<TargetHost>>;
}

/// Enumerates the shares one host exposes. Per-host failures are caught at
/// the work-item boundary and never abort the run.
#[async_trait]
pub trait ShareDiscoverer: Send + Sync {
    fn name(&self) -> &'static str;
    async fn discover(&self, host: &TargetHost) -> Result<Vec<ShareRecord>>;
}

/// Inspects one share's contents. The core only consumes success/failure;
/// what "inspect" means belongs to the configured probe command.
#[async_trait]
pub trait ShareScanner: Send + Sync {
    fn name(&self) -> &'static str;
    async fn scan(&self, share_path: &str) -> Result<()>;
}
