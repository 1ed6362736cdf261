//! Enter/exit animation orchestration
//!
//! Animations are driven by CSS classes. Entering waits one frame, then for
//! the running animation (if any) to end before switching to the
//! transitioned-in class. Exiting deep-clones the content so the original can
//! leave the DOM right away while the clone plays the exit animation and
//! removes itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::config::ContentOptions;
use crate::dom::{Dom, EventType, ListenerOptions, ListenerTarget};

/// Animation phase of a content element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationPhase {
    #[default]
    TransitioningIn,
    TransitionedIn,
    TransitioningOut,
}

/// Class lists for each phase (each may hold several space-separated classes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationClasses {
    pub transitioning_in: String,
    pub transitioned_in: String,
    pub transitioning_out: String,
}

impl AnimationClasses {
    pub fn from_options(options: &ContentOptions) -> Self {
        Self {
            transitioning_in: options.transitioning_in_class().to_string(),
            transitioned_in: options.transitioned_in_class().to_string(),
            transitioning_out: options.transitioning_out_class().to_string(),
        }
    }

    pub fn class_for(&self, phase: AnimationPhase) -> &str {
        match phase {
            AnimationPhase::TransitioningIn => &self.transitioning_in,
            AnimationPhase::TransitionedIn => &self.transitioned_in,
            AnimationPhase::TransitioningOut => &self.transitioning_out,
        }
    }
}

impl Default for AnimationClasses {
    fn default() -> Self {
        Self::from_options(&ContentOptions::default())
    }
}

struct WaitState<D: Dom> {
    cancelled: Cell<bool>,
    listener: RefCell<Option<D::Listener>>,
    callback: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<D: Dom> WaitState<D> {
    fn finish(&self) {
        let listener = self.listener.borrow_mut().take();
        drop(listener);
        let callback = self.callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Pending wait started by [`wait_for_animations`].
///
/// Dropping the handle does not cancel the wait; call [`AnimationWait::cancel`].
pub struct AnimationWait<D: Dom> {
    state: Rc<WaitState<D>>,
}

impl<D: Dom> AnimationWait<D> {
    /// Stop waiting: the callback will not run and the `animationend`
    /// listener, if already attached, is removed.
    pub fn cancel(&self) {
        self.state.cancelled.set(true);
        let listener = self.state.listener.borrow_mut().take();
        drop(listener);
        let callback = self.state.callback.borrow_mut().take();
        drop(callback);
    }

    pub fn is_pending(&self) -> bool {
        self.state.callback.borrow().is_some()
    }
}

/// Run `callback` once `element` has no running animation.
///
/// Waits one animation frame, then inspects the computed style: with an
/// animation running the callback fires on the first `animationend`,
/// otherwise right away. An animation that never ends never fires the callback.
pub fn wait_for_animations<D: Dom>(
    dom: &D,
    element: D::Node,
    callback: impl FnOnce() + 'static,
) -> AnimationWait<D> {
    let state = Rc::new(WaitState::<D> {
        cancelled: Cell::new(false),
        listener: RefCell::new(None),
        callback: RefCell::new(Some(Box::new(callback))),
    });

    let frame_state = Rc::clone(&state);
    let frame_dom = dom.clone();
    dom.request_animation_frame(Box::new(move || {
        if frame_state.cancelled.get() {
            return;
        }
        if !frame_dom.computed_style(&element).has_running_animation() {
            frame_state.finish();
            return;
        }

        trace!("Animation running, waiting for animationend");
        let handler_state = Rc::clone(&frame_state);
        let listener = frame_dom.add_event_listener(
            ListenerTarget::Node(element),
            EventType::AnimationEnd,
            ListenerOptions::BUBBLE,
            Rc::new(move |_: &D::Event| handler_state.finish()),
        );
        *frame_state.listener.borrow_mut() = Some(listener);
    }));

    AnimationWait { state }
}
