//! Selection controller: the actor picker's modal lifecycle.
//!
//! ```text
//! Closed ──select──▶ Open ──chosen(actor)──────────────▶ Resolved(Chosen)
//!                      │ ──outside click / cancel /
//!                      │   chosen(null) / host close ──▶ Resolved(Canceled)
//! Resolved ──select──▶ Open
//! ```
//!
//! Both terminal transitions close the surface. Every terminal outcome is
//! delivered to the callers awaiting the current presentation, to the
//! registered observer callback, and to broadcast subscribers. Presenting
//! while already open re-presents the same surface and joins the flow in
//! progress.

use actorbridge_types::selection::{
    CancelReason, ChosenActorState, SelectionOutcome, SelectionState, SurfaceRect,
};
use actorbridge_wire::ChoiceNotice;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

/// Host-side handle on the element that displays the remote surface.
pub trait SurfacePresenter: Send + Sync + 'static {
    /// Show the surface as a modal.
    fn show_modal(&self);
    /// Hide the surface. Must be harmless when already hidden.
    fn close(&self);
    /// Current bounding box of the surface.
    fn bounding_rect(&self) -> SurfaceRect;
}

/// Observer callback invoked on every terminal outcome.
pub type SelectionObserverFn = Box<dyn Fn(&SelectionOutcome) + Send + Sync>;

type SharedObserver = Arc<dyn Fn(&SelectionOutcome) + Send + Sync>;

/// Capacity of the outcome broadcast channel.
const EVENT_CAPACITY: usize = 64;

struct SelectionInner {
    state: SelectionState,
    waiters: Vec<oneshot::Sender<SelectionOutcome>>,
    chosen: ChosenActorState,
}

/// Owns the singleton picker surface of one bridge instance.
pub struct SelectionController {
    presenter: Arc<dyn SurfacePresenter>,
    inner: Mutex<SelectionInner>,
    observer: RwLock<Option<SharedObserver>>,
    events: broadcast::Sender<SelectionOutcome>,
}

impl SelectionController {
    pub fn new(presenter: Arc<dyn SurfacePresenter>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            presenter,
            inner: Mutex::new(SelectionInner {
                state: SelectionState::Closed,
                waiters: Vec::new(),
                chosen: ChosenActorState::Unset,
            }),
            observer: RwLock::new(None),
            events,
        }
    }

    /// Register the observer callback, replacing any previous one.
    pub fn set_observer(&self, observer: SelectionObserverFn) {
        let mut slot = self.observer.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::from(observer));
    }

    /// Subscribe to terminal outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionOutcome> {
        self.events.subscribe()
    }

    /// Present the surface and return a receiver for this presentation's
    /// outcome.
    pub fn open(&self) -> oneshot::Receiver<SelectionOutcome> {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.state.is_open() {
                debug!(
                    waiters = inner.waiters.len() + 1,
                    "Actor picker already open; joining current selection"
                );
            } else {
                info!("Presenting actor picker");
                inner.state = SelectionState::Open;
            }
            inner.waiters.push(tx);
        }
        self.presenter.show_modal();
        rx
    }

    /// Feed a click at viewport coordinates. Returns `true` when the click
    /// fell outside the open surface and canceled the selection.
    pub fn handle_click(&self, x: f64, y: f64) -> bool {
        if !self.state().is_open() {
            return false;
        }
        if self.presenter.bounding_rect().contains(x, y) {
            return false;
        }
        debug!(x, y, "Click outside actor picker");
        self.finish(SelectionOutcome::Canceled {
            reason: CancelReason::OutsideClick,
        });
        true
    }

    /// Apply a `chosen` notification from the remote surface.
    pub fn handle_choice(&self, notice: ChoiceNotice) {
        let outcome = match notice {
            ChoiceNotice::Actor(actor) => {
                info!(actor = %actor.uri, "Actor chosen");
                self.set_chosen(ChosenActorState::Chosen(actor.clone()));
                SelectionOutcome::Chosen(actor)
            }
            ChoiceNotice::Empty => {
                info!("Remote surface reported no actor");
                self.set_chosen(ChosenActorState::Cleared);
                SelectionOutcome::Canceled {
                    reason: CancelReason::EmptyChoice,
                }
            }
            ChoiceNotice::Invalid(uri) => {
                warn!(uri = %uri, "Ignoring malformed chosen actor reference");
                SelectionOutcome::Canceled {
                    reason: CancelReason::InvalidChoice,
                }
            }
        };
        self.finish(outcome);
    }

    /// Apply an explicit cancel notification from the remote surface.
    pub fn handle_canceled(&self) {
        info!("Actor picker canceled by remote surface");
        self.finish(SelectionOutcome::Canceled {
            reason: CancelReason::Remote,
        });
    }

    /// Close the surface from the host side. Returns `false` when it was
    /// not open.
    pub fn close(&self) -> bool {
        if !self.state().is_open() {
            return false;
        }
        self.finish(SelectionOutcome::Canceled {
            reason: CancelReason::Programmatic,
        });
        true
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SelectionState {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state.clone()
    }

    /// What is known about the chosen actor.
    pub fn chosen_actor(&self) -> ChosenActorState {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.chosen.clone()
    }

    fn set_chosen(&self, chosen: ChosenActorState) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.chosen = chosen;
    }

    /// Apply a terminal outcome: close the surface if it was open, release
    /// this presentation's waiters and notify observers.
    fn finish(&self, outcome: SelectionOutcome) {
        let (was_open, waiters) = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let was_open = inner.state.is_open();
            if was_open {
                inner.state = SelectionState::Resolved(outcome.clone());
            }
            (was_open, std::mem::take(&mut inner.waiters))
        };

        if was_open {
            self.presenter.close();
        }

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        // Called without the lock so the observer may replace itself.
        let observer = self
            .observer
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(observer) = observer {
            observer(&outcome);
        }
        let _ = self.events.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actorbridge_types::selection::ChosenActor;
    use actorbridge_types::ActorReference;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TestSurface {
        shown: AtomicUsize,
        closed: AtomicUsize,
    }

    impl SurfacePresenter for TestSurface {
        fn show_modal(&self) {
            self.shown.fetch_add(1, Ordering::SeqCst);
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn bounding_rect(&self) -> SurfaceRect {
            SurfaceRect {
                top: 10.0,
                left: 10.0,
                width: 100.0,
                height: 100.0,
            }
        }
    }

    fn controller() -> (Arc<TestSurface>, SelectionController) {
        let surface = Arc::new(TestSurface::default());
        let controller = SelectionController::new(surface.clone());
        (surface, controller)
    }

    fn actor() -> ChosenActor {
        ChosenActor {
            uri: ActorReference::from_public_key(&[4u8; 32]),
            nickname: Some("bob".to_string()),
        }
    }

    #[tokio::test]
    async fn test_outside_click_cancels() {
        let (surface, controller) = controller();
        let rx = controller.open();
        assert_eq!(surface.shown.load(Ordering::SeqCst), 1);

        assert!(!controller.handle_click(50.0, 50.0));
        assert!(controller.state().is_open());

        assert!(controller.handle_click(500.0, 50.0));
        assert_eq!(
            rx.await.unwrap(),
            SelectionOutcome::Canceled {
                reason: CancelReason::OutsideClick
            }
        );
        assert_eq!(surface.closed.load(Ordering::SeqCst), 1);
        assert!(!controller.state().is_open());
    }

    #[test]
    fn test_click_while_closed_ignored() {
        let (surface, controller) = controller();
        assert!(!controller.handle_click(500.0, 500.0));
        assert_eq!(surface.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chosen_resolves_and_closes() {
        let (surface, controller) = controller();
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = notified.clone();
        controller.set_observer(Box::new(move |outcome| {
            sink.lock().unwrap().push(outcome.clone());
        }));

        let rx = controller.open();
        controller.handle_choice(ChoiceNotice::Actor(actor()));

        assert_eq!(rx.await.unwrap(), SelectionOutcome::Chosen(actor()));
        assert_eq!(surface.closed.load(Ordering::SeqCst), 1);
        assert_eq!(
            *notified.lock().unwrap(),
            vec![SelectionOutcome::Chosen(actor())]
        );
        assert_eq!(
            controller.chosen_actor(),
            ChosenActorState::Chosen(actor())
        );
        assert_eq!(
            controller.state(),
            SelectionState::Resolved(SelectionOutcome::Chosen(actor()))
        );
    }

    #[tokio::test]
    async fn test_empty_choice_is_cancellation() {
        let (_surface, controller) = controller();
        let rx = controller.open();
        controller.handle_choice(ChoiceNotice::Empty);

        assert_eq!(
            rx.await.unwrap(),
            SelectionOutcome::Canceled {
                reason: CancelReason::EmptyChoice
            }
        );
        assert_eq!(controller.chosen_actor(), ChosenActorState::Cleared);
    }

    #[tokio::test]
    async fn test_invalid_choice_keeps_previous_actor() {
        let (_surface, controller) = controller();
        controller.handle_choice(ChoiceNotice::Actor(actor()));

        let rx = controller.open();
        controller.handle_choice(ChoiceNotice::Invalid("actor:zz".to_string()));
        assert_eq!(
            rx.await.unwrap(),
            SelectionOutcome::Canceled {
                reason: CancelReason::InvalidChoice
            }
        );
        assert_eq!(
            controller.chosen_actor(),
            ChosenActorState::Chosen(actor())
        );
    }

    #[tokio::test]
    async fn test_remote_cancel() {
        let (surface, controller) = controller();
        let mut events = controller.subscribe();
        let rx = controller.open();
        controller.handle_canceled();

        let expected = SelectionOutcome::Canceled {
            reason: CancelReason::Remote,
        };
        assert_eq!(rx.await.unwrap(), expected);
        assert_eq!(events.recv().await.unwrap(), expected);
        assert_eq!(surface.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_open_joins_current_flow() {
        let (surface, controller) = controller();
        let first = controller.open();
        let second = controller.open();
        assert_eq!(surface.shown.load(Ordering::SeqCst), 2);

        controller.handle_choice(ChoiceNotice::Actor(actor()));
        assert_eq!(first.await.unwrap(), SelectionOutcome::Chosen(actor()));
        assert_eq!(second.await.unwrap(), SelectionOutcome::Chosen(actor()));
        assert_eq!(surface.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_programmatic_close() {
        let (_surface, controller) = controller();
        assert!(!controller.close());

        let rx = controller.open();
        assert!(controller.close());
        assert_eq!(
            rx.await.unwrap(),
            SelectionOutcome::Canceled {
                reason: CancelReason::Programmatic
            }
        );
        assert!(!controller.close());
    }

    #[test]
    fn test_observer_can_replace_itself() {
        let (_surface, controller) = controller();
        let controller = Arc::new(controller);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&controller);
        let (first_count, second_count) = (first.clone(), second.clone());
        controller.set_observer(Box::new(move |_| {
            first_count.fetch_add(1, Ordering::SeqCst);
            if let Some(controller) = weak.upgrade() {
                let counter = second_count.clone();
                controller.set_observer(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }));

        controller.handle_canceled();
        controller.handle_canceled();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_choice_while_closed_updates_cache_only() {
        let (surface, controller) = controller();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        controller.set_observer(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        controller.handle_choice(ChoiceNotice::Actor(actor()));
        assert_eq!(controller.state(), SelectionState::Closed);
        assert_eq!(surface.closed.load(Ordering::SeqCst), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(controller.chosen_actor().actor(), Some(&actor()));
    }
}
