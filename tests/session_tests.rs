// Unit tests for the session state machine.
//
// Transitions are computed by the pure dispatch function, so every path is
// covered here without a microphone, speaker, or socket.

use cohost_linux_rs::audio::pcm_codec::{encode_pcm, wrap_chunk};
use cohost_linux_rs::audio::scheduler::PlaybackScheduler;
use cohost_linux_rs::protocol::ServerMessage;
use cohost_linux_rs::session::{
    Action, SessionError, SessionEvent, SessionState, classify_server_message, dispatch,
};
use cohost_linux_rs::session_log::SessionLog;

const ALL_STATES: [SessionState; 5] = [
    SessionState::Idle,
    SessionState::Connecting,
    SessionState::Open,
    SessionState::Closed,
    SessionState::Error,
];

fn server_message(msg_type: &str) -> ServerMessage {
    ServerMessage {
        msg_type: msg_type.to_string(),
        data: None,
        mime: None,
        text: None,
        reason: None,
        session_id: None,
    }
}

fn has_teardown(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::Teardown))
}

#[test]
fn test_stop_from_every_state_ends_closed() {
    for state in ALL_STATES {
        let (next, _) = dispatch(state, SessionEvent::StopRequested);
        assert_eq!(next, SessionState::Closed, "stop from {:?}", state);
    }
}

#[test]
fn test_stop_on_terminal_states_is_a_no_op() {
    for state in [SessionState::Closed, SessionState::Error] {
        let (_, actions) = dispatch(state, SessionEvent::StopRequested);
        assert!(actions.is_empty(), "stop from {:?} produced effects", state);
    }
}

#[test]
fn test_start_only_valid_from_idle() {
    let (next, actions) = dispatch(SessionState::Idle, SessionEvent::StartRequested);
    assert_eq!(next, SessionState::Connecting);
    assert!(actions.iter().any(|a| matches!(a, Action::StartSession)));

    for state in [
        SessionState::Connecting,
        SessionState::Open,
        SessionState::Closed,
        SessionState::Error,
    ] {
        let (next, actions) = dispatch(state, SessionEvent::StartRequested);
        assert_eq!(next, state, "start must not restart from {:?}", state);
        assert!(!actions.iter().any(|a| matches!(a, Action::StartSession)));
    }
}

#[test]
fn test_start_failure_reaches_error_with_teardown() {
    let (next, actions) = dispatch(
        SessionState::Connecting,
        SessionEvent::StartFailed(SessionError::Permission("denied".to_string())),
    );
    assert_eq!(next, SessionState::Error);
    assert!(has_teardown(&actions));
}

#[test]
fn test_transport_open_confirmation_opens_session() {
    let (next, _) = dispatch(
        SessionState::Connecting,
        SessionEvent::TransportOpened {
            session_id: Some("s-42".to_string()),
        },
    );
    assert_eq!(next, SessionState::Open);
}

#[test]
fn test_frames_before_open_are_discarded_not_buffered() {
    let (next, actions) = dispatch(
        SessionState::Connecting,
        SessionEvent::CaptureFrame(vec![1, 2, 3, 4]),
    );
    assert_eq!(next, SessionState::Connecting);
    assert!(actions.is_empty(), "pre-open frame must be dropped silently");
}

#[test]
fn test_frames_in_open_are_forwarded() {
    let wire = vec![0x00, 0x40, 0x00, 0xc0];
    let (next, actions) = dispatch(SessionState::Open, SessionEvent::CaptureFrame(wire.clone()));
    assert_eq!(next, SessionState::Open);
    match &actions[..] {
        [Action::SendAudio(sent)] => assert_eq!(sent, &wire),
        other => panic!("expected a single SendAudio, got {:?}", other),
    }
}

#[test]
fn test_inbound_audio_is_decoded_and_played() {
    let envelope = wrap_chunk(&encode_pcm(&[0.5, -0.5]), 24000);
    let (next, actions) = dispatch(
        SessionState::Open,
        SessionEvent::InboundAudio {
            data: envelope.data,
            mime: envelope.mime,
        },
    );
    assert_eq!(next, SessionState::Open);
    match &actions[..] {
        [Action::PlayAudio(chunk)] => {
            assert_eq!(chunk.sample_rate, 24000);
            assert_eq!(chunk.samples.len(), 2);
        }
        other => panic!("expected a single PlayAudio, got {:?}", other),
    }
}

#[test]
fn test_malformed_chunk_is_dropped_and_session_continues() {
    // Odd-length payload: decode fails, chunk is dropped, no state change.
    let bad = wrap_chunk(&[0x00, 0x40, 0x7f], 24000);
    let (next, actions) = dispatch(
        SessionState::Open,
        SessionEvent::InboundAudio {
            data: bad.data,
            mime: bad.mime,
        },
    );
    assert_eq!(next, SessionState::Open);
    assert!(!actions.iter().any(|a| matches!(a, Action::PlayAudio(_))));
    assert!(!has_teardown(&actions));

    // The next valid chunk still schedules from the untouched cursor.
    let mut scheduler = PlaybackScheduler::new();
    let good = wrap_chunk(&encode_pcm(&vec![0.0; 12000]), 24000);
    let (_, actions) = dispatch(
        next,
        SessionEvent::InboundAudio {
            data: good.data,
            mime: good.mime,
        },
    );
    match &actions[..] {
        [Action::PlayAudio(chunk)] => {
            let start = scheduler.schedule(0.0, chunk.duration_secs());
            assert_eq!(start, 0.0);
            assert_eq!(scheduler.next_start(), 0.5);
        }
        other => panic!("expected a single PlayAudio, got {:?}", other),
    }
}

#[test]
fn test_turn_complete_never_touches_playback() {
    let (next, actions) = dispatch(SessionState::Open, SessionEvent::TurnComplete);
    assert_eq!(next, SessionState::Open);
    assert!(!actions.iter().any(|a| matches!(a, Action::PlayAudio(_))));
    assert!(!has_teardown(&actions));
}

#[test]
fn test_transport_close_and_error_are_terminal_with_teardown() {
    for state in [SessionState::Connecting, SessionState::Open] {
        let (next, actions) = dispatch(state, SessionEvent::TransportClosed);
        assert_eq!(next, SessionState::Closed);
        assert!(has_teardown(&actions));

        let (next, actions) = dispatch(
            state,
            SessionEvent::TransportFailed("connection dropped".to_string()),
        );
        assert_eq!(next, SessionState::Error);
        assert!(has_teardown(&actions));
    }
}

#[test]
fn test_capture_end_closes_session() {
    let (next, actions) = dispatch(SessionState::Open, SessionEvent::CaptureEnded);
    assert_eq!(next, SessionState::Closed);
    assert!(has_teardown(&actions));
}

#[test]
fn test_terminal_states_swallow_late_events() {
    let envelope = wrap_chunk(&encode_pcm(&[0.1]), 24000);
    for state in [SessionState::Closed, SessionState::Error] {
        let (next, actions) = dispatch(
            state,
            SessionEvent::InboundAudio {
                data: envelope.data.clone(),
                mime: envelope.mime.clone(),
            },
        );
        assert_eq!(next, state);
        assert!(actions.is_empty());
    }
}

#[test]
fn test_classify_server_messages() {
    let mut msg = server_message("audio");
    msg.data = Some("AAA=".to_string());
    msg.mime = Some("audio/pcm;rate=24000".to_string());
    assert!(matches!(
        classify_server_message(msg),
        Some(SessionEvent::InboundAudio { .. })
    ));

    // Audio without a mime tag cannot be decoded at the right rate.
    let mut msg = server_message("audio");
    msg.data = Some("AAA=".to_string());
    assert!(classify_server_message(msg).is_none());

    assert!(matches!(
        classify_server_message(server_message("turn_complete")),
        Some(SessionEvent::TurnComplete)
    ));

    let mut msg = server_message("stt");
    msg.text = Some("hello there".to_string());
    assert!(matches!(
        classify_server_message(msg),
        Some(SessionEvent::Transcript(t)) if t == "hello there"
    ));

    let mut msg = server_message("error");
    msg.reason = Some("quota exceeded".to_string());
    assert!(matches!(
        classify_server_message(msg),
        Some(SessionEvent::TransportFailed(r)) if r == "quota exceeded"
    ));

    assert!(classify_server_message(server_message("weather")).is_none());
}

#[test]
fn test_session_log_is_bounded() {
    let mut log = SessionLog::new(3);
    assert!(log.is_empty());
    for i in 0..5 {
        log.record(format!("event {}", i));
    }
    assert_eq!(log.len(), 3);
    let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["event 2", "event 3", "event 4"]);
}
