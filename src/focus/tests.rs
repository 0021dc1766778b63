use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};

#[derive(Clone, Default)]
struct ScriptedHost {
    deny: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    abandons: Arc<AtomicUsize>,
}

impl FocusHost for ScriptedHost {
    fn request(&mut self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        !self.deny.load(Ordering::SeqCst)
    }

    fn abandon(&mut self) {
        self.abandons.fetch_add(1, Ordering::SeqCst);
    }
}

fn arbiter() -> (FocusArbiter, ScriptedHost) {
    let host = ScriptedHost::default();
    (FocusArbiter::new(Box::new(host.clone())), host)
}

#[test]
fn held_focus_is_not_requested_twice() {
    let (mut a, host) = arbiter();
    assert!(a.request());
    assert!(a.request());
    assert_eq!(host.requests.load(Ordering::SeqCst), 1);
    assert_eq!(a.state(), FocusState::Held);
}

#[test]
fn denial_leaves_focus_unheld() {
    let (mut a, host) = arbiter();
    host.deny.store(true, Ordering::SeqCst);
    assert!(!a.request());
    assert!(!a.holds_focus());
    assert_eq!(a.state(), FocusState::None);
}

#[test]
fn transient_loss_while_playing_resumes_on_gain() {
    let (mut a, _) = arbiter();
    a.request();
    assert_eq!(a.on_change(FocusChange::LossTransient, true), FocusDecision::Pause);
    assert_eq!(a.state(), FocusState::LostTransient);
    assert_eq!(a.on_change(FocusChange::Gain, false), FocusDecision::Resume);
    // The intent is consumed.
    assert_eq!(a.on_change(FocusChange::Gain, true), FocusDecision::Ignore);
}

#[test]
fn transient_loss_while_paused_does_not_resume() {
    let (mut a, _) = arbiter();
    a.request();
    assert_eq!(a.on_change(FocusChange::LossTransient, false), FocusDecision::Ignore);
    assert_eq!(a.on_change(FocusChange::Gain, false), FocusDecision::Ignore);
}

#[test]
fn permanent_loss_clears_resume_intent() {
    let (mut a, _) = arbiter();
    a.request();
    a.on_change(FocusChange::LossTransient, true);
    assert_eq!(a.on_change(FocusChange::Loss, false), FocusDecision::Pause);
    assert_eq!(a.state(), FocusState::None);
    assert_eq!(a.on_change(FocusChange::Gain, false), FocusDecision::Ignore);
}

#[test]
fn duck_then_gain_restores_volume() {
    let (mut a, _) = arbiter();
    a.request();
    assert_eq!(a.on_change(FocusChange::LossTransientCanDuck, true), FocusDecision::Duck);
    assert_eq!(a.state(), FocusState::HeldButDucked);
    assert!(a.holds_focus());
    assert_eq!(a.on_change(FocusChange::Gain, true), FocusDecision::Restore);
}

#[test]
fn release_abandons_once_and_blocks_requests() {
    let (mut a, host) = arbiter();
    a.request();
    a.release();
    a.release();
    assert_eq!(host.abandons.load(Ordering::SeqCst), 1);
    assert!(!a.request());
    assert_eq!(host.requests.load(Ordering::SeqCst), 1);
}

fn recording_client(
    shared: &SharedFocus,
    kind: FocusKind,
) -> (FocusClient, Arc<Mutex<Vec<FocusChange>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let client = shared.client(kind, move |c| sink.lock().unwrap().push(c));
    (client, seen)
}

#[test]
fn shared_gain_evicts_previous_holder() {
    let shared = SharedFocus::default();
    let (mut a, a_seen) = recording_client(&shared, FocusKind::Gain);
    let (mut b, _) = recording_client(&shared, FocusKind::Gain);

    assert!(a.request());
    assert!(b.request());
    assert_eq!(*a_seen.lock().unwrap(), vec![FocusChange::Loss]);
    assert!(!a.is_holder());
    assert_eq!(shared.holder(), Some(b.id()));
}

#[test]
fn shared_transient_hands_focus_back() {
    let shared = SharedFocus::default();
    let (mut music, seen) = recording_client(&shared, FocusKind::Gain);
    let (mut alert, _) = recording_client(&shared, FocusKind::Transient);

    music.request();
    alert.request();
    alert.abandon();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![FocusChange::LossTransient, FocusChange::Gain]
    );
    assert_eq!(shared.holder(), Some(music.id()));
}

#[test]
fn shared_duckable_request_reports_can_duck() {
    let shared = SharedFocus::default();
    let (mut music, seen) = recording_client(&shared, FocusKind::Gain);
    let (mut nav, _) = recording_client(&shared, FocusKind::TransientMayDuck);

    music.request();
    nav.request();
    assert_eq!(*seen.lock().unwrap(), vec![FocusChange::LossTransientCanDuck]);
}

#[test]
fn shared_blocked_stack_denies_everyone() {
    let shared = SharedFocus::default();
    let (mut music, _) = recording_client(&shared, FocusKind::Gain);
    shared.set_blocked(true);
    assert!(!music.request());
    shared.set_blocked(false);
    assert!(music.request());
}

#[test]
fn abandon_without_holding_is_silent() {
    let shared = SharedFocus::default();
    let (mut music, seen) = recording_client(&shared, FocusKind::Gain);
    music.abandon();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn listener_may_forward_onto_a_channel() {
    let shared = SharedFocus::default();
    let (tx, rx) = mpsc::channel();
    let mut music = shared.client(FocusKind::Gain, move |c| {
        let _ = tx.send(c);
    });
    let (mut other, _) = recording_client(&shared, FocusKind::Gain);

    music.request();
    other.request();
    assert_eq!(rx.try_recv(), Ok(FocusChange::Loss));
}
