//! JSON payloads sent by the sequencer.

use serde::{Deserialize, Serialize};

/// Body of the `POST url2` call. Serializes to `{"foo":"bar"}` by default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitPayload {
    pub foo: String,
}

impl Default for SubmitPayload {
    fn default() -> Self {
        Self {
            foo: "bar".to_string(),
        }
    }
}
