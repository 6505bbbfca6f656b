//! Lifecycle tests for LiveConversation against scripted sessions and devices.

mod common;

use agentchat_realtime::error::{
    CONNECTION_ERROR_MESSAGE, MISSING_CREDENTIAL_MESSAGE, PERMISSION_DENIED_MESSAGE,
    START_FAILED_MESSAGE,
};
use agentchat_realtime::{
    CaptureConfig, INPUT_MIME_TYPE, LiveConversation, RealtimeError, ServerContent,
};
use common::{FakeDevices, FakeModel, SessionHandle, audio_chunk, eventually, transcript};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn fixture() -> (Arc<FakeModel>, Arc<FakeDevices>, Arc<SessionHandle>) {
    let model = Arc::new(FakeModel::new());
    let session = SessionHandle::new("session-1");
    model.queue(&session);
    (model, Arc::new(FakeDevices::new()), session)
}

fn small_blocks() -> CaptureConfig {
    CaptureConfig::default().with_block_size(4)
}

#[tokio::test]
async fn stop_without_a_call_is_a_no_op() {
    let (model, devices, _) = fixture();
    let call = LiveConversation::builder(model, devices).build();

    call.stop().await;
    call.stop().await;

    assert!(!call.is_live());
    assert_eq!(call.error(), None);
}

#[tokio::test]
async fn start_raises_live_and_sends_the_voice_profile() {
    let (model, devices, _session) = fixture();
    let call = LiveConversation::builder(model.clone(), devices.clone()).build();

    call.start().await.unwrap();

    assert!(call.is_live());
    assert!(call.subscribe().borrow().live);
    assert!(devices.mic_active());
    let configs = model.configs();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].voice, "Zephyr");
    assert_eq!(configs[0].response_modalities, vec!["AUDIO"]);
    assert!(configs[0].input_transcription && configs[0].output_transcription);

    call.stop().await;
}

#[tokio::test]
async fn missing_credential_fails_before_touching_devices() {
    let model = Arc::new(FakeModel::without_key());
    let devices = Arc::new(FakeDevices::new());
    let call = LiveConversation::builder(model.clone(), devices.clone()).build();

    let err = call.start().await.unwrap_err();

    assert!(matches!(err, RealtimeError::MissingCredential(_)));
    assert_eq!(call.error().as_deref(), Some(MISSING_CREDENTIAL_MESSAGE));
    assert!(!call.is_live());
    assert_eq!(devices.mic_opens(), 0);
    assert_eq!(model.connects(), 0);
}

#[tokio::test]
async fn denied_microphone_reports_permission_message() {
    let model = Arc::new(FakeModel::new());
    let devices = Arc::new(FakeDevices::denying());
    let call = LiveConversation::builder(model.clone(), devices).build();

    assert!(call.start().await.is_err());

    assert_eq!(call.error().as_deref(), Some(PERMISSION_DENIED_MESSAGE));
    assert!(!call.is_live());
    assert_eq!(model.connects(), 0);
}

#[tokio::test]
async fn failed_connect_releases_everything_acquired() {
    let (model, devices, _) = fixture();
    model.refuse_connections();
    let call = LiveConversation::builder(model, devices.clone()).build();

    assert!(call.start().await.is_err());

    assert_eq!(call.error().as_deref(), Some(START_FAILED_MESSAGE));
    assert!(!call.is_live());
    assert!(!devices.mic_active());
    assert!(devices.last_output().unwrap().closed());
}

#[tokio::test]
async fn next_start_clears_previous_error() {
    let model = Arc::new(FakeModel::new());
    let devices = Arc::new(FakeDevices::new());
    let call = LiveConversation::builder(model.clone(), devices).build();

    assert!(call.start().await.is_err());
    assert!(call.error().is_some());

    model.queue(&SessionHandle::new("session-2"));
    call.start().await.unwrap();
    assert_eq!(call.error(), None);
    call.stop().await;
}

#[tokio::test]
async fn microphone_blocks_are_streamed_in_order() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).capture(small_blocks()).build();
    call.start().await.unwrap();

    devices.speak(&[0.5, 0.5, 0.5]);
    devices.speak(&[0.5, 0.25, 0.25, 0.25, 0.25, 0.0]);

    assert!(eventually(|| session.sent().len() == 2).await);
    let sent = session.sent();
    assert!(sent.iter().all(|frame| frame.mime_type == INPUT_MIME_TYPE));
    assert_ne!(sent[0].data, sent[1].data);

    call.stop().await;
}

#[tokio::test]
async fn failed_send_does_not_stop_capture() {
    let (model, devices, session) = fixture();
    session.fail_next_sends(1);
    let call = LiveConversation::builder(model, devices.clone()).capture(small_blocks()).build();
    call.start().await.unwrap();

    devices.speak(&[0.1; 4]);
    devices.speak(&[0.2; 4]);
    devices.speak(&[0.3; 4]);

    assert!(eventually(|| session.sent().len() == 2).await);
    let sent = session.sent();
    assert_ne!(sent[0].data, sent[1].data);
    assert!(call.is_live());
    assert_eq!(call.error(), None);

    call.stop().await;
}

#[tokio::test]
async fn no_frames_are_sent_after_stop() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).capture(small_blocks()).build();
    call.start().await.unwrap();

    devices.speak(&[0.1; 4]);
    assert!(eventually(|| session.sent().len() == 1).await);

    call.stop().await;
    devices.speak(&[0.1; 8]);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(session.sent().len(), 1);
    assert!(session.is_closed());
}

#[tokio::test]
async fn transcript_is_reported_before_turn_reset() {
    let (model, devices, session) = fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let call = LiveConversation::builder(model, devices)
        .on_input_transcript(move |text| sink.lock().push(text.to_string()))
        .build();
    call.start().await.unwrap();

    session.push(transcript("Hel"));
    assert!(eventually(|| call.input_transcript() == "Hel").await);

    session.push(
        ServerContent::default()
            .with_input_transcription("lo ")
            .with_output_transcription("Hi")
            .with_turn_complete(),
    );
    assert!(eventually(|| seen.lock().len() == 2).await);

    assert_eq!(*seen.lock(), vec!["Hel".to_string(), "Hello ".to_string()]);
    assert_eq!(call.input_transcript(), "");
    assert_eq!(call.output_transcript(), "");

    call.stop().await;
}

#[tokio::test]
async fn model_audio_is_scheduled_back_to_back() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();
    output.set_time(1.0);

    session.push(ServerContent::default().with_audio(audio_chunk(2400)));
    session.push(ServerContent::default().with_audio(audio_chunk(4800)));
    assert!(eventually(|| output.scheduled().len() == 2).await);

    let scheduled = output.scheduled();
    assert!((scheduled[0].0 - 1.0).abs() < 1e-9);
    assert!((scheduled[1].0 - 1.1).abs() < 1e-9);
    assert!((scheduled[1].1 - 0.2).abs() < 1e-9);
    assert_eq!(call.active_sources(), 2);

    output.finish_all();
    assert_eq!(call.active_sources(), 0);

    call.stop().await;
}

#[tokio::test]
async fn interruption_in_the_same_message_stops_the_new_audio() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();

    session.push(ServerContent::default().with_audio(audio_chunk(24_000)));
    session.push(ServerContent::default().with_audio(audio_chunk(2400)).with_interrupted());
    assert!(eventually(|| output.scheduled().len() == 2).await);
    assert!(eventually(|| call.active_sources() == 0).await);
    assert_eq!(output.stopped(), vec![true, true]);

    output.set_time(2.5);
    session.push(ServerContent::default().with_audio(audio_chunk(2400)));
    assert!(eventually(|| output.scheduled().len() == 3).await);
    assert!((output.scheduled()[2].0 - 2.5).abs() < 1e-9);

    call.stop().await;
}

#[tokio::test]
async fn undecodable_audio_is_skipped() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();

    session.push(ServerContent::default().with_audio("%%%"));
    session.push(ServerContent::default().with_audio(audio_chunk(240)));
    assert!(eventually(|| output.scheduled().len() == 1).await);
    assert!(call.is_live());

    call.stop().await;
}

#[tokio::test]
async fn empty_audio_payload_schedules_nothing() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();

    session.push(ServerContent::default().with_audio(""));
    session.push(ServerContent::default().with_audio(audio_chunk(240)));
    assert!(eventually(|| output.scheduled().len() == 1).await);
    assert!((output.scheduled()[0].1 - 0.01).abs() < 1e-9);
    assert_eq!(call.active_sources(), 1);

    call.stop().await;
}

#[tokio::test]
async fn malformed_message_is_skipped() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();

    session.fail(RealtimeError::protocol("Invalid UTF-8 in binary message"));
    session.push(transcript("still here"));

    assert!(eventually(|| call.input_transcript() == "still here").await);
    assert!(call.is_live());
    assert_eq!(call.error(), None);
    assert!(!session.is_closed());

    call.stop().await;
}

#[tokio::test]
async fn remote_error_ends_the_call_with_a_message() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    session.push(transcript("partial"));

    session.fail(RealtimeError::connection("socket reset"));

    assert!(eventually(|| !call.is_live()).await);
    assert_eq!(call.error().as_deref(), Some(CONNECTION_ERROR_MESSAGE));
    assert!(!devices.mic_active());
    assert!(session.is_closed());
    assert!(devices.last_output().unwrap().closed());
    assert_eq!(call.input_transcript(), "");
}

#[tokio::test]
async fn remote_close_ends_the_call_quietly() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();

    session.hang_up();

    assert!(eventually(|| !call.is_live()).await);
    assert_eq!(call.error(), None);
    assert!(!devices.mic_active());
}

#[tokio::test]
async fn stop_releases_every_resource() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();
    session.push(ServerContent::default().with_audio(audio_chunk(2400)));
    assert!(eventually(|| call.active_sources() == 1).await);

    call.stop().await;

    assert!(!call.is_live());
    assert!(!devices.mic_active());
    assert!(session.is_closed());
    assert!(output.closed());
    assert_eq!(output.stopped(), vec![true]);
    assert_eq!(call.active_sources(), 0);
}

#[tokio::test]
async fn rejected_session_close_still_releases_the_rest() {
    let (model, devices, session) = fixture();
    session.reject_close();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();
    let output = devices.last_output().unwrap();
    session.push(ServerContent::default().with_audio(audio_chunk(2400)));
    assert!(eventually(|| call.active_sources() == 1).await);

    call.stop().await;

    assert!(!session.is_closed());
    assert!(!call.is_live());
    assert!(!call.subscribe().borrow().live);
    assert!(!devices.mic_active());
    assert!(output.closed());
    assert_eq!(output.stopped(), vec![true]);
    assert_eq!(call.error(), None);
}

#[tokio::test]
async fn concurrent_stops_both_return_idle() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();

    tokio::join!(call.stop(), call.stop());

    assert!(!call.is_live());
    assert!(session.is_closed());
    assert!(!devices.mic_active());
}

#[tokio::test]
async fn start_while_live_is_ignored() {
    let (model, devices, _session) = fixture();
    let call = LiveConversation::builder(model.clone(), devices.clone()).build();
    call.start().await.unwrap();

    call.start().await.unwrap();

    assert_eq!(model.connects(), 1);
    assert_eq!(devices.mic_opens(), 1);
    call.stop().await;
}

#[tokio::test]
async fn events_from_a_previous_session_are_ignored() {
    let (model, devices, first) = fixture();
    let second = SessionHandle::new("session-2");
    model.queue(&second);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let call = LiveConversation::builder(model, devices)
        .on_input_transcript(move |text| sink.lock().push(text.to_string()))
        .build();

    call.start().await.unwrap();
    call.stop().await;
    call.start().await.unwrap();

    first.push(transcript("stale"));
    first.fail(RealtimeError::connection("late failure"));
    second.push(transcript("fresh"));

    assert!(eventually(|| !seen.lock().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(*seen.lock(), vec!["fresh".to_string()]);
    assert!(call.is_live());
    assert_eq!(call.error(), None);

    call.stop().await;
}

#[tokio::test]
async fn stop_during_connect_abandons_the_session() {
    let gate = Arc::new(Notify::new());
    let model = Arc::new(FakeModel::gated(gate.clone()));
    let session = SessionHandle::new("session-1");
    model.queue(&session);
    let devices = Arc::new(FakeDevices::new());
    let call = Arc::new(LiveConversation::builder(model.clone(), devices.clone()).build());

    let starter = tokio::spawn({
        let call = call.clone();
        async move { call.start().await }
    });
    assert!(eventually(|| model.connects() == 1).await);
    assert!(call.is_live());

    let stopper = tokio::spawn({
        let call = call.clone();
        async move { call.stop().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.notify_one();

    starter.await.unwrap().unwrap();
    stopper.await.unwrap();

    assert!(!call.is_live());
    assert_eq!(call.error(), None);
    assert!(session.is_closed());
    assert!(!devices.mic_active());
    assert!(devices.last_output().unwrap().closed());
}

#[tokio::test]
async fn dropping_a_live_call_releases_it() {
    let (model, devices, session) = fixture();
    let call = LiveConversation::builder(model, devices.clone()).build();
    call.start().await.unwrap();

    drop(call);

    assert!(eventually(|| session.is_closed()).await);
    assert!(!devices.mic_active());
}
