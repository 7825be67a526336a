//! End-to-end balance flow: inbound main-cam directives dispatched through
//! the signaling layer drive serialized parameter mutations on a fake
//! sender.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use wscall_media_core::{
    run_balance, BalanceController, BalanceOptions, BalanceOutcome, BandwidthTable,
    ConnectionPort, MainCamDirective, MediaError, MediaResult, SendParameters, SenderPort,
    SkipReason, TrackPort, TrackSettings,
};
use wscall_signaling_core::{EventDispatcher, HeaderAccess, Originator};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .try_init();
}

struct FakeRequest {
    headers: Vec<(String, String)>,
}

impl FakeRequest {
    fn new(headers: &[(&str, &str)]) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    fn main_cam(command: &str) -> Self {
        Self::new(&[
            ("content-type", "application/conference.main-cam"),
            ("x-main-cam", command),
        ])
    }
}

impl HeaderAccess for FakeRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

struct FakeTrack {
    settings: TrackSettings,
}

impl TrackPort for FakeTrack {
    fn settings(&self) -> TrackSettings {
        self.settings
    }
}

struct FakeSender {
    state: Mutex<SendParameters>,
    applied: Mutex<Vec<SendParameters>>,
    transactions: AtomicU64,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    fail_next: AtomicBool,
    write_delay: Duration,
    track: Option<Arc<FakeTrack>>,
}

impl FakeSender {
    fn new(track: Option<Arc<FakeTrack>>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SendParameters {
                transaction_id: Some("txn-0".into()),
                ..SendParameters::default()
            }),
            applied: Mutex::new(Vec::new()),
            transactions: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            fail_next: AtomicBool::new(false),
            write_delay: Duration::from_millis(30),
            track,
        })
    }

    fn hd() -> Arc<Self> {
        Self::new(Some(Arc::new(FakeTrack {
            settings: TrackSettings {
                width: Some(1280),
                height: Some(720),
            },
        })))
    }

    fn trackless() -> Arc<Self> {
        Self::new(None)
    }

    fn applied_bitrates(&self) -> Vec<Option<u64>> {
        self.applied
            .lock()
            .iter()
            .map(|parameters| parameters.encodings[0].max_bitrate)
            .collect()
    }
}

#[async_trait]
impl SenderPort for FakeSender {
    fn parameters(&self) -> SendParameters {
        self.state.lock().clone()
    }

    async fn apply_parameters(&self, parameters: SendParameters) -> MediaResult<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.write_delay).await;
        let result = if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(MediaError::parameters_rejected("simulated host rejection"))
        } else {
            let mut accepted = parameters;
            let next = self.transactions.fetch_add(1, Ordering::SeqCst) + 1;
            accepted.transaction_id = Some(format!("txn-{next}"));
            self.applied.lock().push(accepted.clone());
            *self.state.lock() = accepted;
            Ok(())
        };
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn track(&self) -> Option<Arc<dyn TrackPort>> {
        self.track
            .as_ref()
            .map(|track| track.clone() as Arc<dyn TrackPort>)
    }
}

struct FakeConnection {
    sender: Option<Arc<FakeSender>>,
    codec: String,
}

impl FakeConnection {
    fn with_sender(sender: Arc<FakeSender>) -> Arc<Self> {
        Arc::new(Self {
            sender: Some(sender),
            codec: "video/vp8".into(),
        })
    }
}

impl ConnectionPort for FakeConnection {
    fn video_sender(&self) -> Option<Arc<dyn SenderPort>> {
        self.sender
            .as_ref()
            .map(|sender| sender.clone() as Arc<dyn SenderPort>)
    }

    fn video_codec(&self) -> String {
        self.codec.clone()
    }
}

#[tokio::test]
async fn directive_burst_applies_in_arrival_order_without_overlap() {
    init_tracing();

    let sender = FakeSender::hd();
    let connection = FakeConnection::with_sender(sender.clone());
    let table = BandwidthTable::default();
    let minimum = table.minimum("video/vp8");

    let dispatcher = EventDispatcher::new();
    let controller = BalanceController::new(table, BalanceOptions::default());
    controller.set_connection(connection);
    controller.subscribe(&dispatcher.events());
    tokio::task::yield_now().await;

    // Pause and resume arrive back to back, well before the first write
    // settles.
    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("pausemaincam"));
    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("resumemaincam"));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        sender.applied_bitrates(),
        vec![Some(minimum), Some(2_000_000)]
    );
    assert!(!sender.overlapped.load(Ordering::SeqCst));

    // The final state reflects the last directive, with no partial mix.
    let final_state = sender.parameters();
    assert_eq!(final_state.encodings[0].max_bitrate, Some(2_000_000));
    assert_eq!(final_state.encodings[0].scale_resolution_down_by, Some(1.0));
}

#[tokio::test]
async fn resolution_cap_directive_plans_against_requested_size() {
    init_tracing();

    let sender = FakeSender::hd();
    let connection = FakeConnection::with_sender(sender.clone());
    let dispatcher = EventDispatcher::new();
    let controller = BalanceController::new(BandwidthTable::default(), BalanceOptions::default());
    controller.set_connection(connection);
    controller.subscribe(&dispatcher.events());
    tokio::task::yield_now().await;

    dispatcher.dispatch_info(
        Originator::Remote,
        &FakeRequest::new(&[
            ("content-type", "application/conference.main-cam"),
            ("x-main-cam", "maxmaincamresolution"),
            ("x-main-cam-resolution", "640x360"),
        ]),
    );

    tokio::time::sleep(Duration::from_millis(150)).await;

    let state = sender.parameters();
    assert_eq!(state.encodings[0].max_bitrate, Some(600_000));
    assert_eq!(state.encodings[0].scale_resolution_down_by, Some(2.0));
}

#[tokio::test]
async fn failed_apply_is_logged_and_superseded_by_the_next_directive() {
    init_tracing();

    let sender = FakeSender::hd();
    sender.fail_next.store(true, Ordering::SeqCst);
    let connection = FakeConnection::with_sender(sender.clone());
    let dispatcher = EventDispatcher::new();
    let controller = BalanceController::new(BandwidthTable::default(), BalanceOptions::default());
    controller.set_connection(connection);
    controller.subscribe(&dispatcher.events());
    tokio::task::yield_now().await;

    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("pausemaincam"));
    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("resumemaincam"));

    tokio::time::sleep(Duration::from_millis(300)).await;

    // The rejected pause write never landed; the resume one did.
    assert_eq!(sender.applied_bitrates(), vec![Some(2_000_000)]);
}

#[tokio::test]
async fn skip_paths_do_not_touch_the_sender() {
    init_tracing();

    let table = BandwidthTable::default();
    let options = BalanceOptions::default();
    let directive = MainCamDirective::default();

    let no_sender = FakeConnection {
        sender: None,
        codec: String::new(),
    };
    assert_eq!(
        run_balance(&no_sender, &table, &options, &directive)
            .await
            .unwrap(),
        BalanceOutcome::Skipped(SkipReason::NoVideoSender)
    );

    let trackless = FakeConnection {
        sender: Some(FakeSender::trackless()),
        codec: "video/vp8".into(),
    };
    assert_eq!(
        run_balance(&trackless, &table, &options, &directive)
            .await
            .unwrap(),
        BalanceOutcome::Skipped(SkipReason::NoVideoTrack)
    );

    let sender = FakeSender::hd();
    let ignored = FakeConnection {
        sender: Some(sender.clone()),
        codec: "video/VP9".into(),
    };
    let options = BalanceOptions {
        ignore_codec_substring: Some("vp9".into()),
        ..BalanceOptions::default()
    };
    assert_eq!(
        run_balance(&ignored, &table, &options, &directive)
            .await
            .unwrap(),
        BalanceOutcome::Skipped(SkipReason::IgnoredCodec)
    );
    assert!(sender.applied.lock().is_empty());
}

#[tokio::test]
async fn manual_balance_uses_the_stashed_directive() {
    init_tracing();

    let sender = FakeSender::hd();
    let connection = FakeConnection::with_sender(sender.clone());
    let controller = BalanceController::new(BandwidthTable::default(), BalanceOptions::default());

    assert!(matches!(
        controller.balance(),
        Err(MediaError::NoConnection)
    ));

    controller.set_connection(connection);
    controller.balance().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // No directive stashed yet: plan by the track's own resolution.
    assert_eq!(sender.applied_bitrates(), vec![Some(2_000_000)]);

    controller.clear_connection();
    assert!(matches!(
        controller.balance(),
        Err(MediaError::NoConnection)
    ));
}

#[tokio::test]
async fn repeated_directive_applies_once() {
    init_tracing();

    let sender = FakeSender::hd();
    let connection = FakeConnection::with_sender(sender.clone());
    let dispatcher = EventDispatcher::new();
    let controller = BalanceController::new(BandwidthTable::default(), BalanceOptions::default());
    controller.set_connection(connection);
    controller.subscribe(&dispatcher.events());
    tokio::task::yield_now().await;

    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("pausemaincam"));
    tokio::time::sleep(Duration::from_millis(150)).await;
    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("pausemaincam"));
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The second identical pass diffs clean and skips the sender write.
    assert_eq!(sender.applied.lock().len(), 1);
}

#[tokio::test]
async fn unsubscribe_stops_intake_and_clears_the_stash() {
    init_tracing();

    let sender = FakeSender::hd();
    let connection = FakeConnection::with_sender(sender.clone());
    let dispatcher = EventDispatcher::new();
    let controller = BalanceController::new(BandwidthTable::default(), BalanceOptions::default());
    controller.set_connection(connection);
    controller.subscribe(&dispatcher.events());
    tokio::task::yield_now().await;

    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("pausemaincam"));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(sender.applied.lock().len(), 1);

    controller.unsubscribe();
    assert!(controller.last_directive().is_none());

    dispatcher.dispatch_info(Originator::Remote, &FakeRequest::main_cam("resumemaincam"));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(sender.applied.lock().len(), 1);
}
