use faculty_client::{
    ClientError, PUBLISH_COMPLETED_EVENT, PUBLISH_FAILED_EVENT, PublishOutcome, RenderingError,
    ServerSentEvent, TemplatePublishingError, await_publish_result, await_publish_result_stream,
};
use serde_json::json;

fn completed(project: &str) -> ServerSentEvent {
    ServerSentEvent::new(
        PUBLISH_COMPLETED_EVENT,
        json!({ "sourceProjectId": project }).to_string(),
    )
}

fn failed(payload: serde_json::Value) -> ServerSentEvent {
    ServerSentEvent::new(PUBLISH_FAILED_EVENT, payload.to_string())
}

fn failure_of(events: Vec<ServerSentEvent>, project_id: uuid::Uuid) -> TemplatePublishingError {
    match await_publish_result(events, project_id) {
        Some(PublishOutcome::Failed(err)) => err,
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn completed_event_for_project_succeeds() {
    let project_id = uuid::Uuid::new_v4();
    let outcome = await_publish_result(vec![completed(&project_id.to_string())], project_id);
    assert_eq!(outcome, Some(PublishOutcome::Completed));
}

#[test]
fn events_for_other_projects_never_terminate() {
    let project_id = uuid::Uuid::new_v4();
    let other = uuid::Uuid::new_v4().to_string();
    let events = vec![
        failed(json!({"sourceProjectId": &other, "errorCode": "name_conflict", "error": "x"})),
        completed(&other),
        failed(json!({"sourceProjectId": "other project ID"})),
        completed("other project ID"),
        ServerSentEvent::new("@SSE/PROJECT_UPDATED", "{}"),
    ];
    assert_eq!(await_publish_result(events, project_id), None);
}

#[test]
fn later_matching_completion_is_found_after_irrelevant_events() {
    let project_id = uuid::Uuid::new_v4();
    let events = vec![
        failed(json!({"sourceProjectId": "other project ID"})),
        completed("other project ID"),
        completed(&project_id.to_string()),
    ];
    assert_eq!(
        await_publish_result(events, project_id),
        Some(PublishOutcome::Completed)
    );
}

#[test]
fn name_conflict_carries_server_message() {
    let project_id = uuid::Uuid::new_v4();
    let err = failure_of(
        vec![failed(json!({
            "sourceProjectId": project_id.to_string(),
            "errorCode": "name_conflict",
            "error": "dummy error message",
        }))],
        project_id,
    );
    assert!(matches!(err, TemplatePublishingError::NameConflict { .. }));
    assert!(err.to_string().contains("dummy error message"));
}

#[test]
fn unrecognized_code_with_message_is_generic_error() {
    let project_id = uuid::Uuid::new_v4();
    let err = failure_of(
        vec![failed(json!({
            "sourceProjectId": project_id.to_string(),
            "errorCode": "unexpected_error",
            "error": "dummy error message",
        }))],
        project_id,
    );
    assert_eq!(
        err,
        TemplatePublishingError::GenericError {
            code: "unexpected_error".into(),
            message: "dummy error message".into(),
        }
    );
    assert_eq!(err.to_string(), "dummy error message");
}

#[test]
fn rendering_errors_render_one_indented_line_per_file() {
    let project_id = uuid::Uuid::new_v4();
    let err = failure_of(
        vec![failed(json!({
            "sourceProjectId": project_id.to_string(),
            "errorCode": "template_rendering_error",
            "errors": [
                {"error": "Unexpected key { abc }", "path": "a.py"},
                {"error": "Unexpected key { abc }", "path": "a/b.py"},
            ],
        }))],
        project_id,
    );
    assert_eq!(
        err.to_string(),
        "Failed to render the template with default parameters:\n\
         \tUnexpected key { abc } in file a.py\n\
         \tUnexpected key { abc } in file a/b.py"
    );
    assert!(matches!(
        err,
        TemplatePublishingError::TemplateRenderingError { ref errors }
            if errors[1] == RenderingError { error: "Unexpected key { abc }".into(), path: "a/b.py".into() }
    ));
}

#[test]
fn unknown_code_without_message_is_unexpected_error_code() {
    let project_id = uuid::Uuid::new_v4();
    let err = failure_of(
        vec![failed(json!({
            "sourceProjectId": project_id.to_string(),
            "errorCode": "unkown erorr code",
        }))],
        project_id,
    );
    assert_eq!(
        err,
        TemplatePublishingError::UnexpectedErrorCode {
            code: "unkown erorr code".into()
        }
    );
    assert!(err.to_string().contains("Unexpected error code received"));
}

#[test]
fn missing_error_code_is_unexpected_server_response() {
    let project_id = uuid::Uuid::new_v4();
    let err = failure_of(
        vec![failed(json!({"sourceProjectId": project_id.to_string()}))],
        project_id,
    );
    assert_eq!(err, TemplatePublishingError::UnexpectedServerResponse);
    assert!(err.to_string().contains("Unexpected server response"));
}

#[test]
fn first_matching_terminal_event_decides_regardless_of_irrelevant_order() {
    let project_id = uuid::Uuid::new_v4();
    let target = project_id.to_string();
    let irrelevant = vec![
        completed("other project ID"),
        failed(json!({"sourceProjectId": uuid::Uuid::new_v4().to_string(), "errorCode": "x"})),
        ServerSentEvent::new("@SSE/SERVER_STARTED", "{}"),
    ];
    let matching = vec![
        failed(json!({"sourceProjectId": &target, "errorCode": "name_conflict", "error": "taken"})),
        completed(&target),
    ];

    let mut forward = irrelevant.clone();
    forward.extend(matching.clone());
    let mut reversed: Vec<_> = irrelevant.iter().rev().cloned().collect();
    reversed.extend(matching.clone());
    let mut interleaved = vec![irrelevant[2].clone(), matching[0].clone(), irrelevant[0].clone()];
    interleaved.extend([irrelevant[1].clone(), matching[1].clone()]);

    let expected = Some(PublishOutcome::Failed(TemplatePublishingError::NameConflict {
        message: "taken".into(),
    }));
    assert_eq!(await_publish_result(forward, project_id), expected);
    assert_eq!(await_publish_result(reversed, project_id), expected);
    assert_eq!(await_publish_result(interleaved, project_id), expected);

    let swapped: Vec<_> = irrelevant.into_iter().chain(matching.into_iter().rev()).collect();
    assert_eq!(
        await_publish_result(swapped, project_id),
        Some(PublishOutcome::Completed)
    );
}

#[tokio::test]
async fn stream_variant_surfaces_failure_as_client_error() {
    let project_id = uuid::Uuid::new_v4();
    let events = futures::stream::iter(vec![
        Ok(completed("other project ID")),
        Ok(failed(json!({"sourceProjectId": project_id.to_string()}))),
    ]);
    let err = await_publish_result_stream(events, project_id)
        .await
        .expect_err("publish failed");
    assert!(matches!(
        err,
        ClientError::TemplatePublishing(TemplatePublishingError::UnexpectedServerResponse)
    ));
}
