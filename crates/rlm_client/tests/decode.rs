//! Decoder tests: the four event kinds plus every rejection path (syntax,
//! unknown kind, payload shape). The decoder must never coerce.

use rlm_client::protocol::{DecodeError, ServerEvent};

#[test]
fn decodes_status_frame() {
    let event =
        ServerEvent::decode(r#"{"type":"status","data":{"message":"Connecting..."}}"#).unwrap();
    assert_eq!(
        event,
        ServerEvent::Status {
            message: "Connecting...".into()
        }
    );
}

#[test]
fn decodes_iteration_frame() {
    let event = ServerEvent::decode(
        r#"{"type":"iteration","data":{"step":3,"reasoning":"scan the totals","code":"grep(doc)","output":"42"}}"#,
    )
    .unwrap();
    let ServerEvent::Iteration(iteration) = event else {
        panic!("expected an iteration event");
    };
    assert_eq!(iteration.step, 3);
    assert_eq!(iteration.reasoning, "scan the totals");
    assert_eq!(iteration.code, "grep(doc)");
    assert_eq!(iteration.output, "42");
}

#[test]
fn decodes_result_frame() {
    let event = ServerEvent::decode(
        r#"{"type":"result","data":{"answer":"42","metrics":{"tokens":120,"time_s":3.2,"iterations":2,"depth":1,"sub_llm_calls":1}}}"#,
    )
    .unwrap();
    let ServerEvent::Result(result) = event else {
        panic!("expected a result event");
    };
    assert_eq!(result.answer, "42");
    assert_eq!(result.metrics.tokens, 120);
    assert_eq!(result.metrics.time_s, 3.2);
    assert_eq!(result.metrics.iterations, 2);
    assert_eq!(result.metrics.depth, 1);
    assert_eq!(result.metrics.sub_llm_calls, 1);
}

#[test]
fn decodes_error_frame() {
    let event =
        ServerEvent::decode(r#"{"type":"error","data":{"message":"Document not found"}}"#).unwrap();
    assert_eq!(
        event,
        ServerEvent::Error {
            message: "Document not found".into()
        }
    );
}

#[test]
fn rejects_invalid_json_as_syntax_error() {
    let err = ServerEvent::decode("{not json").unwrap_err();
    assert!(matches!(err, DecodeError::Syntax(_)));
}

#[test]
fn rejects_unknown_kind() {
    let err = ServerEvent::decode(r#"{"type":"telemetry","data":{}}"#).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownKind(k) if k == "telemetry"));
}

#[test]
fn rejects_missing_type_tag() {
    let err = ServerEvent::decode(r#"{"data":{"message":"hi"}}"#).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownKind(_)));
}

#[test]
fn rejects_non_string_type_tag() {
    let err = ServerEvent::decode(r#"{"type":7,"data":{"message":"hi"}}"#).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownKind(_)));
}

#[test]
fn rejects_non_numeric_step() {
    let err = ServerEvent::decode(
        r#"{"type":"iteration","data":{"step":"one","reasoning":"","code":"","output":""}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::Payload { kind: "iteration", .. }));
}

#[test]
fn rejects_missing_required_field() {
    let err = ServerEvent::decode(
        r#"{"type":"iteration","data":{"step":1,"reasoning":"","code":""}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::Payload { kind: "iteration", .. }));
}

#[test]
fn rejects_missing_data_object() {
    let err = ServerEvent::decode(r#"{"type":"status"}"#).unwrap_err();
    assert!(matches!(err, DecodeError::Payload { kind: "status", .. }));
}

#[test]
fn rejects_float_where_integer_required() {
    let err = ServerEvent::decode(
        r#"{"type":"result","data":{"answer":"x","metrics":{"tokens":1.5,"time_s":0.1,"iterations":1,"depth":1,"sub_llm_calls":0}}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::Payload { kind: "result", .. }));
}

#[test]
fn rejects_missing_metrics_field() {
    let err = ServerEvent::decode(
        r#"{"type":"result","data":{"answer":"x","metrics":{"tokens":1,"time_s":0.1,"iterations":1,"depth":1}}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::Payload { kind: "result", .. }));
}

#[test]
fn encode_round_trips_through_decode() {
    let event = ServerEvent::Status {
        message: "RLM is exploring your document...".into(),
    };
    let frame = serde_json::to_string(&event).unwrap();
    assert_eq!(ServerEvent::decode(&frame).unwrap(), event);

    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "status");
    assert_eq!(value["data"]["message"], "RLM is exploring your document...");
}

#[test]
fn iteration_failure_marker_recognized() {
    let normal = ServerEvent::decode(
        r#"{"type":"iteration","data":{"step":1,"reasoning":"","code":"","output":"all good"}}"#,
    )
    .unwrap();
    let ServerEvent::Iteration(normal) = normal else {
        panic!("expected an iteration event");
    };
    assert!(!normal.signals_failure());

    let failed = ServerEvent::decode(
        r#"{"type":"iteration","data":{"step":2,"reasoning":"","code":"","output":"Traceback (most recent call last): ..."}}"#,
    )
    .unwrap();
    let ServerEvent::Iteration(failed) = failed else {
        panic!("expected an iteration event");
    };
    assert!(failed.signals_failure());
}
