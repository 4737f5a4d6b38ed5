//! Replaying adapters that serve recorded interactions.

pub mod issues;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::TrackerError;
use crate::ports::issues::TrackerResult;

pub use issues::ReplayingIssueTracker;

fn replay_error(port: &str, method: &str, message: impl Into<String>) -> TrackerError {
    TrackerError::transport("replay", format!("{port}::{method}"), message)
}

/// Take the output of the next recorded call for `port::method`.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> TrackerResult<serde_json::Value> {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard
        .next_interaction(port, method)
        .map(|interaction| interaction.output.clone())
        .map_err(|message| replay_error(port, method, message))
}

/// Turn a recorded `{"Ok": v}` / `{"Err": e}` output back into a result.
///
/// Mirror of `recording::record_result`.
pub(crate) fn replay_result<T: DeserializeOwned>(
    port: &str,
    method: &str,
    output: serde_json::Value,
) -> TrackerResult<T> {
    let serde_json::Value::Object(mut map) = output else {
        return Err(replay_error(port, method, "recorded output is not an Ok/Err object"));
    };
    if let Some(ok) = map.remove("Ok") {
        return serde_json::from_value(ok)
            .map_err(|e| replay_error(port, method, format!("cannot decode recorded value: {e}")));
    }
    match map.remove("Err") {
        Some(err) => Err(serde_json::from_value::<TrackerError>(err.clone())
            .unwrap_or_else(|_| replay_error(port, method, err.to_string()))),
        None => Err(replay_error(port, method, "recorded output has neither Ok nor Err")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_values_decode_into_the_requested_type() {
        let value: Option<u64> = replay_result("issues", "x", json!({ "Ok": 5 })).unwrap();
        assert_eq!(value, Some(5));
    }

    #[test]
    fn err_values_keep_their_status() {
        let recorded = TrackerError::http("POST", "/repos/o/r/issues", 422, "Validation Failed");
        let output = json!({ "Err": recorded.clone() });
        let err = replay_result::<()>("issues", "create_issue", output).unwrap_err();
        assert_eq!(err, recorded);
    }

    #[test]
    fn plain_string_errors_become_replay_errors() {
        let err = replay_result::<()>("issues", "get_issue", json!({ "Err": "boom" })).unwrap_err();
        assert_eq!(err.endpoint, "issues::get_issue");
        assert!(err.message.contains("boom"));
    }
}
