//! Recording adapters that capture interactions to cassettes.

pub mod issues;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use issues::RecordingIssueTracker;

/// Record a `Result<T, E>` interaction using the Ok/Err JSON convention.
///
/// Mirror of `replaying::replay_result`:
/// - `Ok(v)` is serialized as `{"Ok": v}`
/// - `Err(e)` is serialized as `{"Err": e}`
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: Serialize,
    I: Serialize,
{
    let to_value = |value: serde_json::Result<serde_json::Value>| {
        value.unwrap_or_else(|e| serde_json::json!({ "unserializable": e.to_string() }))
    };
    let input_json = to_value(serde_json::to_value(input));
    let output_json = match result {
        Ok(v) => serde_json::json!({ "Ok": to_value(serde_json::to_value(v)) }),
        Err(e) => serde_json::json!({ "Err": to_value(serde_json::to_value(e)) }),
    };

    let mut guard = recorder.lock().expect("recorder lock poisoned");
    guard.record(port, method, input_json, output_json);
}
