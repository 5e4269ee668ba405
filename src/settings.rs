// src/settings.rs

//! Client for the settings endpoint that publishes the device topology.

use crate::error::VisualizerError;
use crate::topology::DeviceEntry;
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;

/// The part of the settings document the visualizer reads.
/// Everything else the endpoint publishes is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SettingsResponse {
    pub device_config: Vec<DeviceEntry>,
}

/// Blocking `GET` of the settings endpoint.
///
/// Any status other than 200, a transport failure, or a body without a
/// well-formed `device_config` is a `ConfigFetchFailure`.
pub fn fetch_settings(url: &str, timeout: Duration) -> Result<SettingsResponse, VisualizerError> {
    info!("Fetching device configuration from {}", url);

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();

    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| VisualizerError::ConfigFetchFailure(format!("GET {}: {}", url, e)))?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(VisualizerError::ConfigFetchFailure(format!(
            "GET {} returned status {}",
            url, status
        )));
    }

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| VisualizerError::ConfigFetchFailure(format!("reading body: {}", e)))?;
    debug!("Settings body: {} bytes", body.len());

    parse_settings(&body)
}

pub fn parse_settings(body: &str) -> Result<SettingsResponse, VisualizerError> {
    serde_json::from_str(body)
        .map_err(|e| VisualizerError::ConfigFetchFailure(format!("malformed settings body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use test_log::test;

    /// Serves exactly one HTTP response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/rest/settings", addr)
    }

    #[test]
    fn it_should_parse_device_config_and_ignore_other_fields() -> Result<(), VisualizerError> {
        let settings = parse_settings(
            r#"{"bpm_base": 80.0, "device_config": [{"n_lights": 2, "n_leds": 3}], "colors": []}"#,
        )?;
        assert_eq!(settings.device_config, vec![DeviceEntry::new(2, 3)]);
        Ok(())
    }

    #[test]
    fn it_should_fail_when_device_config_is_missing() {
        assert!(matches!(
            parse_settings(r#"{"bpm_base": 80.0}"#),
            Err(VisualizerError::ConfigFetchFailure(_))
        ));
    }

    #[test]
    fn it_should_fail_on_a_malformed_body() {
        assert!(matches!(
            parse_settings("<html>"),
            Err(VisualizerError::ConfigFetchFailure(_))
        ));
    }

    #[test]
    fn it_should_fetch_settings_over_http() -> Result<(), VisualizerError> {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"device_config": [{"n_lights": 1, "n_leds": 144}]}"#,
        );
        let settings = fetch_settings(&url, Duration::from_secs(5))?;
        assert_eq!(settings.device_config, vec![DeviceEntry::new(1, 144)]);
        Ok(())
    }

    #[test]
    fn it_should_fail_on_a_non_200_status() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", "{}");
        assert!(matches!(
            fetch_settings(&url, Duration::from_secs(5)),
            Err(VisualizerError::ConfigFetchFailure(_))
        ));
    }

    #[test]
    fn it_should_fail_when_nothing_is_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{}/rest/settings", addr);
        assert!(matches!(
            fetch_settings(&url, Duration::from_secs(2)),
            Err(VisualizerError::ConfigFetchFailure(_))
        ));
    }
}
