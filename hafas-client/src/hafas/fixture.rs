//! Replays recorded responses instead of talking to an endpoint.
//!
//! Useful for development and testing without network access.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::profile::Profile;

use super::envelope::Envelope;
use super::error::TransportError;
use super::transport::Transport;

/// Transport that serves full response bodies from JSON files.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    /// Recorded responses, keyed by method name.
    responses: Arc<HashMap<String, Value>>,
}

impl FixtureTransport {
    /// Loads every `{Method}.json` file in a directory (e.g.
    /// `StationBoard.json`, `TripSearch.json`).
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, TransportError> {
        let data_dir = data_dir.as_ref();
        let mut responses = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| TransportError::Fixture {
            message: format!("Failed to read fixture directory {:?}: {}", data_dir, e),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| TransportError::Fixture {
                message: format!("Failed to read directory entry: {}", e),
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let method = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| TransportError::Fixture {
                    message: format!("Invalid filename: {:?}", path),
                })?
                .to_string();

            let json = std::fs::read_to_string(&path).map_err(|e| TransportError::Fixture {
                message: format!("Failed to read {:?}: {}", path, e),
            })?;
            let body: Value = serde_json::from_str(&json).map_err(|e| TransportError::Json {
                message: format!("{:?}: {}", path, e),
                body: None,
            })?;

            responses.insert(method, body);
        }

        if responses.is_empty() {
            return Err(TransportError::Fixture {
                message: format!("No fixture files found in {:?}", data_dir),
            });
        }

        Ok(Self {
            responses: Arc::new(responses),
        })
    }

    /// Methods with a recorded response, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.responses.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

impl Transport for FixtureTransport {
    async fn send(&self, _profile: &Profile, envelope: &Envelope) -> Result<Value, TransportError> {
        let method = envelope.method();
        debug!(method, "Serving recorded response");
        self.responses
            .get(method)
            .cloned()
            .ok_or_else(|| TransportError::Fixture {
                message: format!(
                    "No recorded response for {}. Available: {:?}",
                    method,
                    self.methods()
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hafas::envelope;
    use crate::profile::vbb;
    use std::fs;

    #[test]
    fn loads_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LocDetails.json"), r#"{"err": "OK"}"#).unwrap();
        fs::write(dir.path().join("StationBoard.json"), r#"{"svcResL": []}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let fixtures = FixtureTransport::new(dir.path()).unwrap();
        assert_eq!(fixtures.methods(), vec!["LocDetails", "StationBoard"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FixtureTransport::new(dir.path()),
            Err(TransportError::Fixture { .. })
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LocMatch.json"), "{not json").unwrap();
        assert!(matches!(
            FixtureTransport::new(dir.path()),
            Err(TransportError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn serves_by_method() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LocDetails.json"), r#"{"err": "OK", "n": 1}"#).unwrap();
        let fixtures = FixtureTransport::new(dir.path()).unwrap();
        let profile = vbb();

        let details = envelope::loc_details(&profile, "900000100003").unwrap();
        let body = fixtures.send(&profile, &details).await.unwrap();
        assert_eq!(body["n"], 1);

        let search = envelope::loc_match(&profile, "Alex", &Default::default()).unwrap();
        let err = fixtures.send(&profile, &search).await.unwrap_err();
        assert!(err.to_string().contains("No recorded response for LocMatch"));
    }
}
