//! Registry client for ecosystems without a public version lookup

use async_trait::async_trait;

use super::{LatestVersionInfo, PackageRegistryClient, RegistryError};

/// Always reports the declared version as the latest one
#[derive(Debug, Default, Clone, Copy)]
pub struct StubRegistryClient;

#[async_trait]
impl PackageRegistryClient for StubRegistryClient {
    async fn latest_version(&self, _name: &str) -> Result<Option<LatestVersionInfo>, RegistryError> {
        Ok(None)
    }
}
