//! Action catalogue and termination policies against an in-process stub.

mod common;

use asterisk_ami_tokio::{
    ActionRequest, AmiClient, AmiError, Originate, SessionState, Termination, Variables,
};
use common::{field, stub_server, text, Reply, SUCCESS};
use std::time::Duration;

fn cli_text(body: &str) -> String {
    format!("Response: Follows\r\nPrivilege: Command\r\n{body}\r\n--END COMMAND--\r\n\r\n")
}

fn cli_output(body: &str) -> Reply {
    Reply::Text(cli_text(body))
}

#[tokio::test]
async fn queue_add_sends_penalty_only_when_given() {
    let server = stub_server(|_| {
        text("Response: Success\r\nMessage: Added interface to queue\r\n\r\n")
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .queue_add("sales", "SIP/200", Some(0))
        .await
        .unwrap();
    assert!(response.is_success());
    assert_eq!(response.message(), Some("Added interface to queue"));

    client
        .queue_add("sales", "SIP/201", None)
        .await
        .unwrap();
    client
        .queue_remove("sales", "SIP/200")
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(
        requests[0],
        "Action: QueueAdd\r\nQueue: sales\r\nInterface: SIP/200\r\nPenalty: 0\r\n\r\n"
    );
    assert_eq!(
        requests[1],
        "Action: QueueAdd\r\nQueue: sales\r\nInterface: SIP/201\r\n\r\n"
    );
    assert_eq!(
        requests[2],
        "Action: QueueRemove\r\nQueue: sales\r\nInterface: SIP/200\r\n\r\n"
    );
}

#[tokio::test]
async fn idle_reply_ends_after_quiet_period() {
    let server = stub_server(|request| match field(request, "Action") {
        Some("Queues") => text(
            "sales has 0 calls (max unlimited) in 'ringall' strategy\r\n   Members: \r\n      SIP/200 (Not in use)\r\n\r\n",
        ),
        _ => Reply::Silent,
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .queues()
        .await
        .unwrap();
    assert!(response.contains("SIP/200 (Not in use)"));
    assert!(response
        .lines()
        .iter()
        .any(|l| l.starts_with("sales has 0 calls")));

    // Greeting and queue output were consumed; silence now is no response.
    let err = client
        .queue_add("sales", "SIP/300", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AmiError::NoResponse { timeout_ms: 200 }), "got {err:?}");
    assert!(err.is_timeout());
}

#[tokio::test]
async fn missing_marker_is_response_timeout() {
    let server = stub_server(|_| text("Response: Follows\r\nPrivilege: Command\r\npartial\r\n")).await;
    let client = server
        .client()
        .await;

    let err = client
        .command("core show channels")
        .await
        .unwrap_err();
    match err {
        AmiError::ResponseTimeout { lines, .. } => assert!(lines >= 3),
        other => panic!("expected ResponseTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn command_output_excludes_footer() {
    let server = stub_server(|request| match field(request, "Command") {
        Some("core show version") => cli_output("Asterisk 18.20.0 built by root"),
        _ => cli_output(
            "No such command 'bogus' (type 'core show help bogus' for other possible commands)",
        ),
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .command("core show version")
        .await
        .unwrap();
    assert!(response.contains("Asterisk 18.20.0"));
    assert!(!response.contains("--END COMMAND--"));
    assert_eq!(
        response
            .lines()
            .last()
            .map(String::as_str),
        Some("Asterisk 18.20.0 built by root")
    );

    let err = client
        .command("bogus")
        .await
        .unwrap_err();
    assert!(
        matches!(err, AmiError::UnknownCommand { ref command } if command == "bogus"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn ping_reports_pong() {
    let server = stub_server(|_| text("Response: Pong\r\n\r\n")).await;
    let client = server
        .client()
        .await;
    assert!(client
        .ping()
        .await
        .unwrap());
    assert!(client
        .ping()
        .await
        .unwrap());
    assert_eq!(server.requests()[0], "Action: Ping\r\n\r\n");
}

#[tokio::test]
async fn ping_without_pong_is_false() {
    let server = stub_server(|_| text("Response: Error\r\nMessage: Permission denied\r\n\r\n")).await;
    let client = server
        .client()
        .await;
    assert!(!client
        .ping()
        .await
        .unwrap());
}

#[tokio::test]
async fn parked_calls_include_complete_event() {
    let server = stub_server(|_| {
        text(concat!(
            "Response: Success\r\nMessage: Parked calls will follow\r\n\r\n",
            "Event: ParkedCall\r\nExten: 701\r\nChannel: SIP/100-00000001\r\n\r\n",
            "Event: ParkedCallsComplete\r\n\r\n",
        ))
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .parked_calls()
        .await
        .unwrap();
    assert_eq!(response.header("exten"), Some("701"));
    assert_eq!(
        response
            .lines()
            .last()
            .map(String::as_str),
        Some("Event: ParkedCallsComplete")
    );
    assert_eq!(field(&server.requests()[0], "Parameters"), Some("ActionID"));
}

#[tokio::test]
async fn sip_peers_stop_before_list_items() {
    let server = stub_server(|_| {
        text(concat!(
            "Response: Success\r\nEventList: start\r\nMessage: Peer status list will follow\r\n\r\n",
            "Event: PeerEntry\r\nObjectName: 200\r\nStatus: OK (5 ms)\r\n\r\n",
            "Event: PeerlistComplete\r\nEventList: Complete\r\nListItems: 1\r\n\r\n",
        ))
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .sip_peers()
        .await
        .unwrap();
    assert_eq!(response.header("ObjectName"), Some("200"));
    assert!(!response.contains("ListItems"));
    assert_eq!(
        response
            .lines()
            .last()
            .map(String::as_str),
        Some("EventList: Complete")
    );
}

#[tokio::test]
async fn iax_peers_stop_before_summary() {
    let server = stub_server(|_| {
        cli_output(concat!(
            "Name/Username    Host                 Mask             Port      Status\r\n",
            "trunk            203.0.113.7     (S)  255.255.255.255  4569      OK (12 ms)\r\n",
            "1 iax2 peers [1 online, 0 offline, 0 unmonitored]",
        ))
    })
    .await;
    let client = server
        .client()
        .await;

    let response = client
        .iax_peers()
        .await
        .unwrap();
    assert!(response.contains("trunk"));
    assert!(!response.contains("iax2 peers"));
}

#[tokio::test]
async fn monitor_success_and_failure() {
    let server = stub_server(|request| match field(request, "Channel") {
        Some("SIP/100-00000001") => {
            text("Response: Success\r\nMessage: Started monitoring channel\r\n\r\n")
        }
        _ => text("Response: Error\r\nMessage: No such channel\r\n\r\n"),
    })
    .await;
    let client = server
        .client()
        .await;

    client
        .start_monitor("SIP/100-00000001", "call-42", "wav", true)
        .await
        .unwrap();
    let err = client
        .start_monitor("SIP/999-00000009", "call-43", "wav", false)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AmiError::MonitorFailed { ref channel } if channel == "SIP/999-00000009"),
        "got {err:?}"
    );
    client
        .stop_monitor("SIP/100-00000001")
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(
        requests[0],
        "Action: Monitor\r\nChannel: SIP/100-00000001\r\nFile: call-42\r\nFormat: wav\r\nMix: 1\r\n\r\n"
    );
    assert_eq!(field(&requests[1], "Mix"), Some("0"));
    assert_eq!(
        requests[2],
        "Action: StopMonitor\r\nChannel: SIP/100-00000001\r\n\r\n"
    );
}

#[tokio::test]
async fn originate_request_fields() {
    let server = stub_server(|_| {
        text("Response: Success\r\nMessage: Originate successfully queued\r\n\r\n")
    })
    .await;
    let client = server
        .client()
        .await;

    let call = Originate::new("SIP/200", "from-internal", "100")
        .caller_id("Sales <200>")
        .variables(
            Variables::new()
                .set("campaign", "spring")
                .set("lead", "42"),
        );
    let response = client
        .originate(&call)
        .await
        .unwrap();
    assert!(response.is_success());

    let request = &server.requests()[0];
    assert_eq!(field(request, "Action"), Some("Originate"));
    assert_eq!(field(request, "Channel"), Some("SIP/200"));
    assert_eq!(field(request, "Context"), Some("from-internal"));
    assert_eq!(field(request, "Exten"), Some("100"));
    assert_eq!(field(request, "Priority"), Some("1"));
    assert_eq!(field(request, "Callerid"), Some("Sales <200>"));
    assert_eq!(field(request, "Timeout"), Some("30000"));
    assert_eq!(field(request, "Variable"), Some("campaign=spring|lead=42"));
}

#[tokio::test]
async fn channel_status_optional_channel() {
    let server = stub_server(|_| text(SUCCESS)).await;
    let client = server
        .client()
        .await;

    client
        .channel_status(None)
        .await
        .unwrap();
    client
        .channel_status(Some("SIP/100-00000001"))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests[0], "Action: Status\r\n\r\n");
    assert_eq!(
        requests[1],
        "Action: Status\r\nChannel: SIP/100-00000001\r\n\r\n"
    );
}

#[tokio::test]
async fn custom_action_with_explicit_policy() {
    let server = stub_server(|_| {
        text(concat!(
            "Response: Success\r\nEventList: start\r\n\r\n",
            "Event: CoreShowChannelsComplete\r\nListItems: 0\r\n\r\n",
        ))
    })
    .await;
    let client = server
        .client()
        .await;

    let request = ActionRequest::new("CoreShowChannels")
        .unwrap()
        .field("ActionID", "list-1")
        .unwrap();
    let response = client
        .send(&request, &Termination::marker_included("CoreShowChannelsComplete"))
        .await
        .unwrap();
    assert_eq!(
        response
            .lines()
            .last()
            .map(String::as_str),
        Some("Event: CoreShowChannelsComplete")
    );
    assert_eq!(
        server.requests()[0],
        "Action: CoreShowChannels\r\nActionID: list-1\r\n\r\n"
    );
}

#[tokio::test]
async fn deadline_bounds_a_single_call() {
    let server = stub_server(|_| Reply::Silent).await;
    let client = server
        .client()
        .await;

    let request = ActionRequest::new("Command")
        .unwrap()
        .field("Command", "core show channels")
        .unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(100);
    let err = client
        .send_with_deadline(&request, &Termination::marker_excluded("--END COMMAND--"), deadline)
        .await
        .unwrap_err();
    assert!(matches!(err, AmiError::ResponseTimeout { .. }), "got {err:?}");

    // A late reply must not be read by the next action.
    assert_eq!(client.state().await, SessionState::Disconnected);
    assert!(matches!(client.ping().await, Err(AmiError::NotConnected)));
}

/// Replies to `slow` after 400ms and to `core show version` after 300ms;
/// everything else answers at once.
fn delayed_cli_handler(request: &str) -> Reply {
    let command = field(request, "Command").unwrap_or_default();
    let body = cli_text(&format!("output of {command}"));
    match command {
        "slow" => Reply::Delayed(Duration::from_millis(400), body),
        "core show version" => Reply::Delayed(Duration::from_millis(300), body),
        _ => Reply::Text(body),
    }
}

#[tokio::test]
async fn queued_caller_gets_its_own_full_timeout() {
    let server = stub_server(delayed_cli_handler).await;
    let client = AmiClient::new(
        server
            .options()
            .with_read_timeout(Duration::from_millis(1000))
            .with_response_timeout(Duration::from_millis(600)),
    )
    .await
    .unwrap();
    client
        .connect()
        .await
        .unwrap();
    let other = client.clone();

    // `other` waits about 400ms for the session, then needs 300ms more:
    // longer than 600ms in total, but well inside its own timeout.
    let (first, second) = tokio::join!(
        client.command("slow"),
        other.command("core show version")
    );
    assert!(first
        .unwrap()
        .contains("output of slow"));
    let second = second.unwrap();
    assert!(second.contains("output of core show version"));

    let next = client
        .command("core show uptime")
        .await
        .unwrap();
    assert!(next.contains("output of core show uptime"));
    assert!(!next.contains("core show version"));
    assert_eq!(client.state().await, SessionState::Connected);
}

#[tokio::test]
async fn deadline_passed_while_queued_sends_nothing() {
    let server = stub_server(delayed_cli_handler).await;
    let client = AmiClient::new(
        server
            .options()
            .with_read_timeout(Duration::from_millis(1000)),
    )
    .await
    .unwrap();
    client
        .connect()
        .await
        .unwrap();
    let other = client.clone();

    let request = ActionRequest::new("Command")
        .unwrap()
        .field("Command", "core show uptime")
        .unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(50);
    let termination = Termination::marker_excluded("--END COMMAND--");
    let (first, second) = tokio::join!(
        client.command("slow"),
        other.send_with_deadline(&request, &termination, deadline)
    );
    first.unwrap();
    let err = second.unwrap_err();
    assert!(
        matches!(err, AmiError::ResponseTimeout { lines: 0, .. }),
        "got {err:?}"
    );

    // Nothing was written, so the connection is still in step.
    assert_eq!(client.state().await, SessionState::Connected);
    assert_eq!(server.requests().len(), 1);
    let next = client
        .command("core show channels")
        .await
        .unwrap();
    assert!(next.contains("output of core show channels"));
}

#[tokio::test]
async fn oversized_response_drops_connection() {
    let server = stub_server(|_| {
        let mut reply = String::from("Response: Success\r\nMessage: Channel status will follow\r\n\r\n");
        reply.push_str(&"Event: Noise\r\n".repeat(17 * 1024 * 1024 / 14));
        Reply::Text(reply)
    })
    .await;
    let client = server
        .client()
        .await;

    let err = client
        .channel_status(None)
        .await
        .unwrap_err();
    assert!(matches!(err, AmiError::ProtocolError { .. }), "got {err:?}");
    assert_eq!(client.state().await, SessionState::Disconnected);
}

#[tokio::test]
async fn concurrent_callers_are_serialized() {
    let server = stub_server(|request| {
        let command = field(request, "Command").unwrap_or_default();
        cli_output(&format!("output of {command}"))
    })
    .await;
    let client = server
        .client()
        .await;
    let other = client.clone();

    let (first, second) = tokio::join!(
        client.command("first"),
        other.command("second")
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.contains("output of first"));
    assert!(!first.contains("output of second"));
    assert!(second.contains("output of second"));
    assert!(!second.contains("output of first"));
    assert_eq!(server.requests().len(), 2);
}
