//! JSON boundary shapes: point records, mutate requests/responses, traces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One discovered mutation point: an (instruction, rule) pairing addressed
/// by function name and 1-based ordinal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationPoint {
    pub rule: String,
    pub function: String,
    /// 1-based position in the function's block-order instruction stream
    pub instruction: usize,
    pub second_mutation: bool,
    /// Rendering of the pre-mutation value(s) the rule would touch
    pub origin_mutate: String,
    /// Source line, supplied by an external debug-info lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_line: Option<u32>,
}

/// Request to apply one rule at one point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutateRequest {
    pub rule: String,
    pub function: String,
    pub instruction: usize,
}

/// Outcome of a mutate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutateResponse {
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Value>,
    /// Source location details, supplied by an external debug-info lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Value>,
}

impl MutateResponse {
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            package: None,
            additional_information: None,
        }
    }

    pub fn changed(package: Value) -> Self {
        Self {
            changed: true,
            package: Some(package),
            additional_information: None,
        }
    }
}

/// One record of a replay trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub rule: String,
    pub function: String,
    pub instruction: usize,
    pub package: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_serialization_omits_missing_line() {
        let point = MutationPoint {
            rule: "branch-swap".to_string(),
            function: "f".to_string(),
            instruction: 3,
            second_mutation: false,
            origin_mutate: "b1/b2".to_string(),
            instruction_line: None,
        };

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"rule\":\"branch-swap\""));
        assert!(json.contains("\"instruction\":3"));
        assert!(!json.contains("instruction_line"));
    }

    #[test]
    fn test_trace_record_round_trip() {
        let record = TraceRecord {
            rule: "binop-int-replace".to_string(),
            function: "f".to_string(),
            instruction: 1,
            package: json!({"repl": "Sub", "swap": false}),
        };

        let text = serde_json::to_string(&record).unwrap();
        let back: TraceRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rule, record.rule);
        assert_eq!(back.package["repl"], "Sub");
    }

    #[test]
    fn test_unchanged_response_has_no_package() {
        let response = MutateResponse::unchanged();
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, "{\"changed\":false}");
    }
}
