//! Dropdown content lifecycle
//!
//! [`DropdownContent`] ties the subsystems to one mounted content element.
//! The host calls the mount hooks when the element is inserted and the
//! matching teardown hooks when it goes away:
//!
//! | mount                       | unmount                        |
//! |-----------------------------|--------------------------------|
//! | [`DropdownContent::setup`]  | [`DropdownContent::teardown`]  |
//! | [`DropdownContent::setup_mutation_observer`] | [`DropdownContent::teardown_mutation_observer`] |
//! | [`DropdownContent::animate_in`] | [`DropdownContent::animate_out`] |
//!
//! Everything registered by a mount hook is owned by the content and released
//! by the matching teardown hook, so listeners never outlive the mount.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::animation::{wait_for_animations, AnimationClasses, AnimationPhase, AnimationWait};
use crate::config::{content_id, ContentOptions};
use crate::dom::{Dom, MutationRecord};
use crate::dropdown::Dropdown;
use crate::layout_watch::{observe_content_mutations, RepositionFilter, ViewportWatch};
use crate::outside::OutsideClickDetector;
use crate::run_loop;
use crate::scroll::ScrollHandling;
use crate::scroll_helpers::scrollable_ancestors;

type PhaseListener = Rc<dyn Fn(AnimationPhase)>;

struct MountState<D: Dom> {
    detector: Option<OutsideClickDetector<D>>,
    viewport: Option<ViewportWatch<D>>,
    scroll_handling: Option<ScrollHandling<D>>,
    scrollable_ancestors: Vec<D::Node>,
    mutation_observer: Option<D::Observer>,
    enter_wait: Option<AnimationWait<D>>,
}

impl<D: Dom> Default for MountState<D> {
    fn default() -> Self {
        Self {
            detector: None,
            viewport: None,
            scroll_handling: None,
            scrollable_ancestors: Vec::new(),
            mutation_observer: None,
            enter_wait: None,
        }
    }
}

struct ContentInner<D: Dom> {
    dom: D,
    dropdown: Dropdown<D::Event>,
    options: ContentOptions,
    classes: AnimationClasses,
    dropdown_id: String,
    is_touch_device: bool,
    should_reposition: RefCell<Option<RepositionFilter<D>>>,
    phase: Cell<AnimationPhase>,
    phase_listener: RefCell<Option<PhaseListener>>,
    mount: RefCell<MountState<D>>,
}

impl<D: Dom> ContentInner<D> {
    fn set_phase(&self, phase: AnimationPhase) {
        if self.phase.replace(phase) == phase {
            return;
        }
        let listener = self.phase_listener.borrow().clone();
        if let Some(listener) = listener {
            listener(phase);
        }
    }
}

/// Lifecycle logic of one dropdown content element
pub struct DropdownContent<D: Dom> {
    inner: Rc<ContentInner<D>>,
}

impl<D: Dom> Clone for DropdownContent<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> DropdownContent<D> {
    pub fn new(dom: D, dropdown: Dropdown<D::Event>, options: ContentOptions) -> Self {
        let is_touch_device = options
            .is_touch_device
            .unwrap_or_else(|| dom.is_touch_device());
        let dropdown_id = content_id(&dropdown.unique_id);
        let classes = AnimationClasses::from_options(&options);
        Self {
            inner: Rc::new(ContentInner {
                dom,
                dropdown,
                options,
                classes,
                dropdown_id,
                is_touch_device,
                should_reposition: RefCell::new(None),
                phase: Cell::new(AnimationPhase::TransitioningIn),
                phase_listener: RefCell::new(None),
                mount: RefCell::new(MountState::default()),
            }),
        }
    }

    /// Register the predicate that has the final say on whether a relevant
    /// mutation batch repositions the dropdown.
    pub fn with_should_reposition(
        self,
        filter: impl Fn(&[MutationRecord<D::Node>], &Dropdown<D::Event>) -> bool + 'static,
    ) -> Self {
        *self.inner.should_reposition.borrow_mut() = Some(Rc::new(filter));
        self
    }

    /// Called whenever the animation phase changes.
    pub fn on_animation_phase_change(&self, listener: impl Fn(AnimationPhase) + 'static) {
        *self.inner.phase_listener.borrow_mut() = Some(Rc::new(listener));
    }

    /// Id of the content element, `"<prefix>-<unique id>"`
    pub fn dropdown_id(&self) -> &str {
        &self.inner.dropdown_id
    }

    pub fn dropdown(&self) -> &Dropdown<D::Event> {
        &self.inner.dropdown
    }

    pub fn options(&self) -> &ContentOptions {
        &self.inner.options
    }

    pub fn classes(&self) -> &AnimationClasses {
        &self.inner.classes
    }

    pub fn is_touch_device(&self) -> bool {
        self.inner.is_touch_device
    }

    pub fn animation_phase(&self) -> AnimationPhase {
        self.inner.phase.get()
    }

    /// Class list for the current animation phase
    pub fn animation_class(&self) -> &str {
        self.inner.classes.class_for(self.inner.phase.get())
    }

    /// Container the content renders into, when not rendering in place
    pub fn destination_element(&self) -> Option<D::Node> {
        let destination = &self.inner.options.destination;
        if destination.is_empty() {
            return None;
        }
        self.inner.dom.element_by_id(destination)
    }

    /// Scrollable ancestors of the trigger captured by the last `setup`
    pub fn scrollable_ancestors(&self) -> Vec<D::Node> {
        self.inner.mount.borrow().scrollable_ancestors.clone()
    }

    pub fn is_set_up(&self) -> bool {
        self.inner.mount.borrow().detector.is_some()
    }

    /// Request a reposition through the run loop. Inside an event handler
    /// the call is deferred until the handler returns.
    pub fn reposition(&self) {
        (self.reposition_request())();
    }

    fn reposition_request(&self) -> Rc<dyn Fn()> {
        let actions = Rc::clone(&self.inner.dropdown.actions);
        Rc::new(move || {
            let actions = Rc::clone(&actions);
            run_loop::join(move || actions.reposition());
        })
    }

    /// Arm outside-click detection, viewport watching and scroll handling for
    /// `element`. Calling it again first releases the previous listeners and
    /// leaves a pending enter animation running.
    pub fn setup(&self, element: &D::Node) {
        if self.is_set_up() {
            self.release_listeners();
        }

        let inner = &self.inner;
        let dom = &inner.dom;
        let trigger = dom.find_by_attribute("data-ebd-id", &inner.dropdown.trigger_id());

        let detector = OutsideClickDetector::attach(
            dom,
            element.clone(),
            trigger.clone(),
            inner.dropdown.clone(),
            inner.dropdown_id.clone(),
            inner.options.root_event_type,
            inner.is_touch_device,
        );
        let reposition = self.reposition_request();
        let viewport = ViewportWatch::attach(dom, Rc::clone(&reposition));

        let ancestors = trigger
            .as_ref()
            .map(|trigger| scrollable_ancestors(dom, trigger))
            .unwrap_or_default();
        let scroll_handling = if inner.options.prevent_scroll {
            ScrollHandling::prevent_scroll(dom, element.clone())
        } else {
            ScrollHandling::reposition_on_scroll(dom, &ancestors, reposition)
        };

        debug!(
            "Set up {} (trigger found: {}, {} scrollable ancestors, prevent scroll: {})",
            inner.dropdown_id,
            trigger.is_some(),
            ancestors.len(),
            inner.options.prevent_scroll
        );

        let mut mount = inner.mount.borrow_mut();
        mount.detector = Some(detector);
        mount.viewport = Some(viewport);
        mount.scroll_handling = Some(scroll_handling);
        mount.scrollable_ancestors = ancestors;
    }

    /// Remove everything `setup` registered and stop a pending enter wait.
    /// Safe to call when nothing is set up.
    pub fn teardown(&self) {
        if self.is_set_up() {
            debug!("Tearing down {}", self.inner.dropdown_id);
        }
        self.release_listeners();
        let enter_wait = self.inner.mount.borrow_mut().enter_wait.take();
        if let Some(wait) = enter_wait {
            wait.cancel();
        }
    }

    fn release_listeners(&self) {
        let (viewport, scroll_handling, detector) = {
            let mut mount = self.inner.mount.borrow_mut();
            mount.scrollable_ancestors.clear();
            (
                mount.viewport.take(),
                mount.scroll_handling.take(),
                mount.detector.take(),
            )
        };
        // Handlers may re-enter `mount`, so drop outside the borrow
        drop(viewport);
        drop(scroll_handling);
        drop(detector);
    }

    /// Start observing `element` for layout-relevant mutations.
    pub fn setup_mutation_observer(&self, element: &D::Node) {
        self.teardown_mutation_observer();
        let filter = self.inner.should_reposition.borrow().clone();
        let observer = observe_content_mutations(
            &self.inner.dom,
            element,
            self.inner.dropdown.clone(),
            filter,
            self.reposition_request(),
        );
        self.inner.mount.borrow_mut().mutation_observer = observer;
    }

    /// Disconnect the mutation observer. Safe to call repeatedly.
    pub fn teardown_mutation_observer(&self) {
        let observer = self.inner.mount.borrow_mut().mutation_observer.take();
        drop(observer);
    }

    /// Move to the transitioned-in phase once the enter animation of
    /// `element` finishes.
    pub fn animate_in(&self, element: &D::Node) {
        if !self.inner.options.animation_enabled {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let wait = wait_for_animations(&self.inner.dom, element.clone(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.set_phase(AnimationPhase::TransitionedIn);
            }
        });
        let previous = self.inner.mount.borrow_mut().enter_wait.replace(wait);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Play the exit animation on a detached clone of `element`.
    ///
    /// The clone is appended next to the content (one level higher when
    /// rendering in place), gets the transitioning-out classes instead of the
    /// transitioning-in ones, and removes itself once its animation ends. The
    /// content's own phase is reset so a remount enters cleanly.
    pub fn animate_out(&self, element: &D::Node) {
        if !self.inner.options.animation_enabled {
            return;
        }
        let dom = &self.inner.dom;
        let Some(mut parent) = dom.parent_element(element) else {
            return;
        };
        if self.inner.options.render_in_place {
            let Some(outer) = dom.parent_element(&parent) else {
                return;
            };
            parent = outer;
        }
        let Some(clone) = dom.clone_deep(element) else {
            return;
        };

        let id = dom.attribute(&clone, "id").unwrap_or_default();
        dom.set_id(&clone, &format!("{id}--clone"));
        for class in self.inner.classes.transitioning_in.split_whitespace() {
            dom.remove_class(&clone, class);
        }
        for class in self.inner.classes.transitioning_out.split_whitespace() {
            dom.add_class(&clone, class);
        }
        dom.append_child(&parent, &clone);
        debug!("Exit animation started for {}", self.inner.dropdown_id);

        self.inner.set_phase(AnimationPhase::TransitioningIn);

        let removal_dom = dom.clone();
        let removed = clone.clone();
        // The clone cleans up after itself, the wait is not tracked
        let _ = wait_for_animations(dom, clone, move || {
            removal_dom.remove_child(&parent, &removed);
        });
    }
}
