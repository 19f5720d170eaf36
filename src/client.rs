use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::model::{DeviceInfo, DeviceResponse};

/// Seam between the reconciliation driver and the monitoring API, so the
/// driver can be exercised without a live endpoint.
pub trait DeviceLookup {
    /// Returns the device's live attributes, or `None` when the monitoring
    /// system does not know the device. Transport and protocol failures are
    /// reported to the operator and degrade to `None`; a single failed lookup
    /// must never abort the batch.
    fn lookup(&self, hostname: &str) -> Option<DeviceInfo>;
}

/// Client for the LibreNMS REST API, authenticated with a static token.
pub struct LibreNmsClient {
    base_url: String,
    token: String,
    http: reqwest::blocking::Client,
}

/// Bound on a single device query.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl LibreNmsClient {
    /// Builds a client for the given endpoint. TLS certificate validation is
    /// an explicit option rather than process-global state; it defaults to
    /// off at the CLI because the monitored appliances ship self-signed
    /// certificates.
    pub fn new(base_url: &str, token: &str, verify_tls: bool) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }
}

impl DeviceLookup for LibreNmsClient {
    fn lookup(&self, hostname: &str) -> Option<DeviceInfo> {
        let url = format!("{}/api/v0/devices/{hostname}", self.base_url);
        let response = match self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
        {
            Ok(response) => response,
            Err(error) if error.is_timeout() => {
                warn!(hostname, "API request timed out");
                return None;
            }
            Err(error) if error.is_connect() => {
                warn!(endpoint = %self.base_url, %error, "could not connect to API server");
                return None;
            }
            Err(error) => {
                warn!(hostname, %error, "API request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(hostname, status = status.as_u16(), "API returned an error status");
            match status.as_u16() {
                401 => warn!("authentication error, check the API token"),
                404 => warn!(hostname, "device not found in LibreNMS"),
                _ => {}
            }
            return None;
        }

        match response.json::<DeviceResponse>() {
            Ok(body) => {
                let device = first_device(body);
                if device.is_none() {
                    warn!(hostname, "API returned no device data");
                }
                device
            }
            Err(error) => {
                warn!(hostname, %error, "API returned a malformed body");
                None
            }
        }
    }
}

/// A successful lookup requires `status == "ok"` and a non-empty device list;
/// the first entry wins.
fn first_device(body: DeviceResponse) -> Option<DeviceInfo> {
    if body.status != "ok" {
        return None;
    }
    body.devices.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_body_yields_first_device() {
        let body: DeviceResponse = serde_json::from_str(
            r#"{
                "status": "ok",
                "devices": [
                    {"hostname": "sw01.example.com", "ip": "10.0.0.1", "location": "CA2.RDC.Core.Net"},
                    {"hostname": "sw02.example.com"}
                ]
            }"#,
        )
        .unwrap();

        let device = first_device(body).unwrap();
        assert_eq!(device.hostname.as_deref(), Some("sw01.example.com"));
        assert_eq!(device.location.as_deref(), Some("CA2.RDC.Core.Net"));
    }

    #[test]
    fn non_ok_status_yields_none() {
        let body: DeviceResponse = serde_json::from_str(
            r#"{"status": "error", "devices": [{"hostname": "sw01"}]}"#,
        )
        .unwrap();
        assert!(first_device(body).is_none());
    }

    #[test]
    fn empty_device_list_yields_none() {
        let body: DeviceResponse =
            serde_json::from_str(r#"{"status": "ok", "devices": []}"#).unwrap();
        assert!(first_device(body).is_none());
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let body: DeviceResponse =
            serde_json::from_str(r#"{"status": "ok", "devices": [{}]}"#).unwrap();
        let device = first_device(body).unwrap();
        assert!(device.hostname.is_none());
        assert!(device.sys_descr.is_none());
    }
}
