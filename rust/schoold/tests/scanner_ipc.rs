mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn decoded_frame_ends_session_and_resolves_student() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "scanner.open", json!({}));
    assert_eq!(opened["facing"], "environment");
    assert!(opened["replacedSessionId"].is_null());
    let sid = opened["sessionId"].as_str().expect("session id").to_string();

    let status = request_ok(&mut stdin, &mut reader, "2", "scanner.status", json!({}));
    assert_eq!(status["active"], true);
    assert_eq!(status["sessionId"], sid.as_str());

    let miss = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "scanner.frame",
        json!({ "sessionId": sid, "data": null }),
    );
    assert_eq!(miss["decoded"], false);
    assert_eq!(miss["frames"], 1);
    assert_eq!(miss["releaseDevice"], false);

    let hit = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "scanner.frame",
        json!({ "sessionId": sid, "data": "{\"id\":\"78123456\",\"name\":\"Luis Fernández\",\"role\":\"Estudiante\"}" }),
    );
    assert_eq!(hit["decoded"], true);
    assert_eq!(hit["frames"], 2);
    assert_eq!(hit["releaseDevice"], true);
    assert_eq!(hit["lookup"]["ok"], true);
    assert_eq!(hit["lookup"]["resolution"]["student"]["id"], "78123456");
    assert_eq!(hit["lookup"]["resolution"]["status"], "absent");

    // Late frames from the same camera stream are rejected.
    let late = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "scanner.frame",
        json!({ "sessionId": sid, "data": "78945612" }),
    );
    assert_eq!(late["code"], "scan_session_closed");
    assert_eq!(late["details"]["reason"], "decoded");

    let status = request_ok(&mut stdin, &mut reader, "6", "scanner.status", json!({}));
    assert_eq!(status["active"], false);
}

#[test]
fn unreadable_code_is_reported_inside_frame_result() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "scanner.open",
        json!({ "facing": "user" }),
    );
    assert_eq!(opened["facing"], "user");
    let sid = opened["sessionId"].as_str().expect("session id").to_string();

    let hit = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "scanner.frame",
        json!({ "sessionId": sid, "data": "https://example.org" }),
    );
    assert_eq!(hit["decoded"], true);
    assert_eq!(hit["lookup"]["ok"], false);
    assert_eq!(hit["lookup"]["error"]["code"], "unrecognized_format");
}

#[test]
fn device_errors_and_replacement_release_the_camera() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let first = request_ok(&mut stdin, &mut reader, "1", "scanner.open", json!({}));
    let first_id = first["sessionId"].as_str().expect("session id").to_string();
    let second = request_ok(&mut stdin, &mut reader, "2", "scanner.open", json!({}));
    assert_eq!(second["replacedSessionId"], first_id.as_str());
    let second_id = second["sessionId"].as_str().expect("session id").to_string();

    let stale = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "scanner.close",
        json!({ "sessionId": first_id }),
    );
    assert_eq!(stale["code"], "scan_session_closed");
    assert_eq!(stale["details"]["reason"], "replaced");

    let denied = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "scanner.fail",
        json!({ "sessionId": second_id, "errorName": "NotAllowedError" }),
    );
    assert_eq!(denied["code"], "device_unavailable");
    assert_eq!(denied["details"]["reason"], "permissionDenied");
    assert_eq!(denied["details"]["releaseDevice"], true);

    let unknown = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "scanner.close",
        json!({ "sessionId": "nope" }),
    );
    assert_eq!(unknown["code"], "no_scan_session");

    let bad_facing = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "scanner.open",
        json!({ "facing": "sideways" }),
    );
    assert_eq!(bad_facing["code"], "bad_params");

    let third = request_ok(&mut stdin, &mut reader, "7", "scanner.open", json!({}));
    let third_id = third["sessionId"].as_str().expect("session id").to_string();
    let closed = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "scanner.close",
        json!({ "sessionId": third_id }),
    );
    assert_eq!(closed["releaseDevice"], true);
}
