use chill_player::{
    DeferReason, DropReason, ListenerId, ManualClock, MediaSurface, PassOutcome, ReadyState,
    SeekConfig, SeekCoordinator, SeekError, SeekPhase, SeekSignal, SignalHandler, SignalListeners,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// In-memory surface that behaves like a media element: a write emits
/// `Started` immediately and `Completed` when the test says so.
#[derive(Clone)]
struct FakeSurface {
    inner: Rc<FakeInner>,
}

struct FakeInner {
    position: Cell<f64>,
    duration: Cell<f64>,
    ready: Cell<ReadyState>,
    disposed: Cell<bool>,
    writes: RefCell<Vec<f64>>,
    listeners: SignalListeners,
    complete_on_next_query: Cell<bool>,
}

impl FakeSurface {
    fn new(duration: f64) -> Self {
        FakeSurface {
            inner: Rc::new(FakeInner {
                position: Cell::new(0.0),
                duration: Cell::new(duration),
                ready: Cell::new(ReadyState::HaveEnoughData),
                disposed: Cell::new(false),
                writes: RefCell::new(Vec::new()),
                listeners: SignalListeners::new(),
                complete_on_next_query: Cell::new(false),
            }),
        }
    }

    fn writes(&self) -> Vec<f64> {
        self.inner.writes.borrow().clone()
    }

    /// A seek the host starts on its own, like a player restarting an ended
    /// stream.
    fn start_own_seek(&self) {
        self.inner.listeners.emit(SeekSignal::Started);
    }

    fn complete_seek(&self) {
        self.inner.listeners.emit(SeekSignal::Completed);
    }

    /// Deliver `Completed` from inside the next `duration()` call, the way a
    /// surface that drains its event queue while answering queries would.
    fn complete_during_next_query(&self) {
        self.inner.complete_on_next_query.set(true);
    }

    fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl MediaSurface for FakeSurface {
    fn position(&self) -> f64 {
        self.inner.position.get()
    }

    fn set_position(&self, secs: f64) {
        self.inner.writes.borrow_mut().push(secs);
        self.inner.position.set(secs);
        self.inner.listeners.emit(SeekSignal::Started);
    }

    fn duration(&self) -> f64 {
        if self.inner.complete_on_next_query.replace(false) {
            self.complete_seek();
        }
        self.inner.duration.get()
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready.get()
    }

    fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    fn subscribe(&self, signal: SeekSignal, handler: SignalHandler) -> ListenerId {
        self.inner.listeners.add(signal, handler)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner.listeners.remove(id);
    }
}

type Coordinator = SeekCoordinator<FakeSurface, ManualClock>;

fn setup(duration: f64) -> (FakeSurface, ManualClock, Coordinator) {
    setup_with(duration, SeekConfig::default())
}

fn setup_with(duration: f64, config: SeekConfig) -> (FakeSurface, ManualClock, Coordinator) {
    let surface = FakeSurface::new(duration);
    let clock = ManualClock::new(1_000);
    let coordinator = SeekCoordinator::with_clock(surface.clone(), clock.clone(), config);
    (surface, clock, coordinator)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn issued_target(outcome: PassOutcome) -> f64 {
    match outcome {
        PassOutcome::Issued { target, .. } => target,
        other => panic!("expected an issued seek, got {:?}", other),
    }
}

#[test]
fn requests_in_one_frame_collapse_to_the_last() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(5.0);
    coordinator.request_seek(42.0);
    coordinator.request_seek(20.0);
    assert!(surface.writes().is_empty());
    assert_eq!(coordinator.phase(), SeekPhase::Pending);

    match coordinator.on_frame() {
        PassOutcome::Issued { requested, target } => {
            assert_eq!(requested, 20.0);
            assert_close(target, 19.6);
        }
        other => panic!("expected an issued seek, got {:?}", other),
    }

    assert_eq!(surface.writes().len(), 1);
    assert_eq!(coordinator.on_frame(), PassOutcome::Idle);
    assert_eq!(surface.writes().len(), 1);
}

#[test]
fn seeks_snap_backward_toward_keyframe() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    assert_close(issued_target(coordinator.on_frame()), 9.6);
    assert_close(surface.writes()[0], 9.6);
}

#[test]
fn seeks_near_start_are_not_snapped() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(0.5);
    assert_eq!(issued_target(coordinator.on_frame()), 0.5);
    assert_eq!(surface.writes(), vec![0.5]);
}

#[test]
fn negative_target_clamps_to_zero() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(-5.0);
    assert_eq!(issued_target(coordinator.on_frame()), 0.0);
    assert_eq!(surface.writes(), vec![0.0]);
}

#[test]
fn target_past_end_clamps_to_duration_then_snaps() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(500.0);
    assert_close(issued_target(coordinator.on_frame()), 119.6);
    assert_eq!(surface.writes().len(), 1);
}

#[test]
fn settle_window_spaces_out_seeks() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    surface.complete_seek();
    assert_eq!(coordinator.phase(), SeekPhase::Settling);

    clock.advance(50);
    coordinator.request_seek(30.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );

    clock.advance(49);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );
    assert_eq!(surface.writes().len(), 1);
    assert!(coordinator.needs_frame());

    clock.advance(1);
    assert_close(issued_target(coordinator.on_frame()), 29.6);
    assert_eq!(surface.writes().len(), 2);
}

#[test]
fn settle_window_applies_to_completion_at_time_zero() {
    let surface = FakeSurface::new(60.0);
    let clock = ManualClock::new(0);
    let mut coordinator =
        SeekCoordinator::with_clock(surface.clone(), clock.clone(), SeekConfig::default());

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    surface.complete_seek();

    coordinator.request_seek(20.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );
}

#[test]
fn first_seek_of_session_skips_settle_window() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    assert_eq!(coordinator.phase(), SeekPhase::Idle);
    coordinator.request_seek(3.0);
    assert!(matches!(coordinator.on_frame(), PassOutcome::Issued { .. }));
    assert_eq!(surface.writes().len(), 1);
}

#[test]
fn in_flight_seek_is_never_interrupted() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    assert_eq!(coordinator.phase(), SeekPhase::Seeking);

    for target in [30.0, 40.0, 50.0] {
        coordinator.request_seek(target);
        assert_eq!(
            coordinator.on_frame(),
            PassOutcome::Deferred(DeferReason::SeekInFlight)
        );
        clock.advance(16);
    }
    assert_eq!(surface.writes().len(), 1);
    assert_eq!(coordinator.pending_target(), Some(50.0));

    surface.complete_seek();
    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 49.6);

    assert_eq!(coordinator.on_frame(), PassOutcome::Idle);
    assert_eq!(surface.writes().len(), 2);
}

#[test]
fn request_after_issue_starts_a_new_cycle() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    coordinator.request_seek(60.0);
    assert_eq!(coordinator.pending_target(), Some(60.0));
    assert!(coordinator.needs_frame());

    surface.complete_seek();
    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 59.6);
}

#[test]
fn metadata_wait_keeps_the_target() {
    let (surface, _clock, mut coordinator) = setup(120.0);
    surface.inner.ready.set(ReadyState::HaveNothing);

    coordinator.request_seek(15.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::MetadataNotLoaded)
    );
    assert_eq!(coordinator.pending_target(), Some(15.0));
    assert!(surface.writes().is_empty());

    surface.inner.ready.set(ReadyState::HaveMetadata);
    assert_close(issued_target(coordinator.on_frame()), 14.6);
}

#[test]
fn disable_discards_pending_target() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.disable();

    assert!(!coordinator.needs_frame());
    assert_eq!(coordinator.pending_target(), None);
    assert_eq!(coordinator.on_frame(), PassOutcome::Idle);
    assert!(surface.writes().is_empty());
    assert_eq!(surface.listener_count(), 2);
}

#[test]
fn disabled_coordinator_writes_through() {
    let (surface, _clock, mut coordinator) = setup(120.0);
    coordinator.disable();

    coordinator.request_seek(7.0);
    coordinator.request_seek(500.0);
    assert_eq!(surface.writes(), vec![7.0, 500.0]);
    assert!(!coordinator.needs_frame());
}

#[test]
fn enable_restores_coordination() {
    let (surface, clock, mut coordinator) = setup(120.0);
    coordinator.disable();
    coordinator.disable();
    coordinator.request_seek(7.0);
    surface.complete_seek();

    coordinator.enable();
    coordinator.enable();
    assert!(coordinator.is_enabled());
    assert_eq!(surface.listener_count(), 2);

    clock.advance(100);
    coordinator.request_seek(20.0);
    assert_eq!(surface.writes(), vec![7.0]);
    assert_close(issued_target(coordinator.on_frame()), 19.6);
}

#[test]
fn seek_in_flight_survives_disable_and_enable() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    coordinator.disable();
    coordinator.enable();
    assert_eq!(coordinator.phase(), SeekPhase::Seeking);

    coordinator.request_seek(20.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::SeekInFlight)
    );
    assert_eq!(surface.writes().len(), 1);

    surface.complete_seek();
    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 19.6);
    assert_eq!(surface.writes().len(), 2);
}

#[test]
fn direct_write_while_disabled_gates_next_coordinated_seek() {
    let (surface, clock, mut coordinator) = setup(120.0);
    coordinator.disable();
    coordinator.request_seek(50.0);
    coordinator.enable();

    coordinator.request_seek(80.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::SeekInFlight)
    );

    surface.complete_seek();
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );

    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 79.6);
    assert_eq!(surface.writes().len(), 2);
}

#[test]
fn coordinator_configured_off_starts_disabled() {
    let config = SeekConfig {
        enabled: false,
        ..SeekConfig::default()
    };
    let (surface, _clock, mut coordinator) = setup_with(120.0, config);

    assert!(!coordinator.is_enabled());
    assert_eq!(surface.listener_count(), 2);
    coordinator.request_seek(12.0);
    assert_eq!(surface.writes(), vec![12.0]);
}

#[test]
fn dispose_is_idempotent() {
    let (surface, _clock, mut coordinator) = setup(120.0);
    coordinator.request_seek(10.0);

    coordinator.dispose();
    coordinator.dispose();

    assert_eq!(coordinator.phase(), SeekPhase::Disposed);
    assert_eq!(surface.listener_count(), 0);

    coordinator.request_seek(30.0);
    assert_eq!(coordinator.on_frame(), PassOutcome::Idle);
    coordinator.enable();
    coordinator.request_seek(40.0);
    assert!(surface.writes().is_empty());
}

#[test]
fn dispose_after_surface_teardown_is_quiet() {
    let (surface, _clock, mut coordinator) = setup(120.0);
    surface.inner.disposed.set(true);

    coordinator.request_seek(10.0);
    coordinator.dispose();
    coordinator.dispose();

    assert!(surface.writes().is_empty());
}

#[test]
fn surface_torn_down_mid_cycle_drops_target() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    surface.inner.disposed.set(true);

    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Dropped(DropReason::SurfaceGone)
    );
    assert_eq!(coordinator.pending_target(), None);
    assert!(!coordinator.needs_frame());
    assert!(surface.writes().is_empty());
}

#[test]
fn dropping_coordinator_detaches_listeners() {
    let surface = FakeSurface::new(120.0);
    {
        let _coordinator = SeekCoordinator::with_clock(
            surface.clone(),
            ManualClock::new(0),
            SeekConfig::default(),
        );
        assert_eq!(surface.listener_count(), 2);
    }
    assert_eq!(surface.listener_count(), 0);
}

#[test]
fn non_finite_requests_are_inert() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(f64::NAN);
    coordinator.request_seek(f64::INFINITY);

    assert_eq!(coordinator.pending_target(), None);
    assert!(!coordinator.needs_frame());
    assert_eq!(coordinator.phase(), SeekPhase::Idle);
    assert_eq!(coordinator.on_frame(), PassOutcome::Idle);
    assert!(surface.writes().is_empty());
}

#[test]
fn requests_while_duration_unknown_are_inert() {
    let (surface, _clock, mut coordinator) = setup(f64::NAN);

    coordinator.request_seek(10.0);

    assert_eq!(coordinator.pending_target(), None);
    assert!(!coordinator.needs_frame());
    assert!(surface.writes().is_empty());
}

#[test]
fn duration_lost_before_pass_drops_target() {
    let (surface, _clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    surface.inner.duration.set(f64::NAN);

    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Dropped(DropReason::UnknownDuration)
    );
    assert_eq!(coordinator.pending_target(), None);
    assert!(surface.writes().is_empty());
}

#[test]
fn position_reads_pass_through() {
    let (surface, _clock, coordinator) = setup(120.0);
    surface.inner.position.set(33.5);
    assert_eq!(coordinator.current_position(), 33.5);
}

#[test]
fn attach_without_surface_fails() {
    let result: Result<Coordinator, SeekError> =
        SeekCoordinator::attach(None, ManualClock::new(0), SeekConfig::default());
    assert!(matches!(result, Err(SeekError::MissingSurface)));
}

#[test]
fn attach_with_surface_coordinates() {
    let surface = FakeSurface::new(120.0);
    let mut coordinator = SeekCoordinator::attach(
        Some(surface.clone()),
        ManualClock::new(0),
        SeekConfig::default(),
    )
    .unwrap();

    coordinator.request_seek(10.0);
    assert!(matches!(coordinator.on_frame(), PassOutcome::Issued { .. }));
    assert_eq!(surface.writes().len(), 1);
}

#[test]
fn custom_tuning_is_respected() {
    let config = SeekConfig {
        snap_backward_seconds: 2.0,
        settle_milliseconds: 500,
        min_snap_time_seconds: 5.0,
        enabled: true,
    };
    let (surface, clock, mut coordinator) = setup_with(300.0, config);

    coordinator.request_seek(4.0);
    assert_eq!(issued_target(coordinator.on_frame()), 4.0);
    surface.complete_seek();

    clock.advance(499);
    coordinator.request_seek(100.0);
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );

    clock.advance(1);
    assert_eq!(issued_target(coordinator.on_frame()), 98.0);
    assert_eq!(surface.writes(), vec![4.0, 98.0]);
}

#[test]
fn settling_returns_to_idle() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    surface.complete_seek();
    assert_eq!(coordinator.phase(), SeekPhase::Settling);

    clock.advance(100);
    assert_eq!(coordinator.phase(), SeekPhase::Idle);
}

#[test]
fn completion_delivered_during_a_pass_is_recorded() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(10.0);
    coordinator.on_frame();
    clock.advance(500);

    coordinator.request_seek(30.0);
    surface.complete_during_next_query();
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::Settling)
    );
    assert_eq!(coordinator.phase(), SeekPhase::Pending);

    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 29.6);
}

#[test]
fn seek_started_by_the_host_holds_back_pending_target() {
    let (surface, clock, mut coordinator) = setup(120.0);

    coordinator.request_seek(30.0);
    surface.start_own_seek();
    assert_eq!(
        coordinator.on_frame(),
        PassOutcome::Deferred(DeferReason::SeekInFlight)
    );
    assert!(surface.writes().is_empty());

    surface.complete_seek();
    clock.advance(100);
    assert_close(issued_target(coordinator.on_frame()), 29.6);
    assert_eq!(surface.writes().len(), 1);
}
