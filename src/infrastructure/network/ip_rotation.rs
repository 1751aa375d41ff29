// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use async_trait::async_trait;
use reqwest::Client;

/// Rotates the egress IP of a shared proxy between account steps.
#[async_trait]
pub trait ProxyRotator: Send + Sync {
    async fn rotate(&self);
}

/// Mobile-proxy rotation through the provider's "change IP" URL.
/// Failures are logged; the run continues on the current IP.
pub struct IpRotator {
    client: Client,
    change_ip_url: String,
}

impl IpRotator {
    pub fn new(client: Client, change_ip_url: impl Into<String>) -> Self {
        Self {
            client,
            change_ip_url: change_ip_url.into(),
        }
    }
}

#[async_trait]
impl ProxyRotator for IpRotator {
    async fn rotate(&self) {
        match self.client.get(&self.change_ip_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(target: "proxy", "Changed IP address");
            }
            Ok(resp) => {
                tracing::warn!(target: "proxy", status = %resp.status(), "Couldn't change IP address");
            }
            Err(e) => {
                tracing::warn!(target: "proxy", error = %e, "Couldn't change IP address");
            }
        }
    }
}

/// No rotation.
pub struct NoRotation;

#[async_trait]
impl ProxyRotator for NoRotation {
    async fn rotate(&self) {}
}
