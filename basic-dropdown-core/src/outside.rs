//! Outside-interaction detection
//!
//! A capturing listener on the document decides, for each pointer (or touch
//! end) event, whether the interaction happened inside the dropdown, inside
//! one of its nested child dropdowns, or genuinely outside. Only the last case
//! asks the dropdown to close.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::config::{RootEventType, CONTENT_CLASS};
use crate::dom::{Dom, DomEvent, EventType, ListenerOptions, ListenerTarget, TouchPoint};
use crate::dropdown::Dropdown;
use crate::run_loop;
use crate::touch::has_moved;

/// Upper bound on nested-dropdown hops, for markup whose trigger references loop
const MAX_NESTING_DEPTH: usize = 64;

/// Nearest element at or above `node` carrying the content class marker.
pub fn closest_content<D: Dom>(dom: &D, node: &D::Node) -> Option<D::Node> {
    let mut current = Some(node.clone());
    while let Some(element) = current {
        if dom.has_class(&element, CONTENT_CLASS) {
            return Some(element);
        }
        current = dom.parent_element(&element);
    }
    None
}

/// Whether `node` sits inside a dropdown that is (transitively) nested in the
/// dropdown whose content id is `dropdown_id`.
///
/// Each hop goes from a content element to the trigger that controls it
/// (`aria-controls`), then to the content enclosing that trigger. A missing
/// id, trigger or enclosing content ends the walk as "not nested".
pub fn dropdown_is_valid_parent<D: Dom>(dom: &D, node: &D::Node, dropdown_id: &str) -> bool {
    let Some(mut content) = closest_content(dom, node) else {
        return false;
    };
    let mut visited: Vec<String> = Vec::new();

    for _ in 0..MAX_NESTING_DEPTH {
        let Some(id) = dom.attribute(&content, "id").filter(|id| !id.is_empty()) else {
            return false;
        };
        if visited.contains(&id) {
            return false;
        }
        let Some(trigger) = dom.find_by_attribute("aria-controls", &id) else {
            return false;
        };
        visited.push(id);

        let Some(parent) = closest_content(dom, &trigger) else {
            return false;
        };
        let Some(parent_id) = dom.attribute(&parent, "id") else {
            return false;
        };
        if parent_id == dropdown_id {
            return true;
        }
        content = parent;
    }
    false
}

/// Touch-move waiting to be matched against the next touch end.
/// `point` is `None` when the move carried no touch data.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingTouchMove {
    point: Option<TouchPoint>,
}

struct DetectorShared<D: Dom> {
    dom: D,
    content: D::Node,
    trigger: Option<D::Node>,
    dropdown_id: String,
    dropdown: Dropdown<D::Event>,
    touch_move: RefCell<Option<PendingTouchMove>>,
    touch_move_listener: RefCell<Option<D::Listener>>,
}

impl<D: Dom> DetectorShared<D> {
    fn handle_root_event(&self, event: &D::Event) {
        let Some(target) = event.target() else {
            return;
        };

        let pending = self.touch_move.borrow_mut().take();
        if has_moved(event.touch_point(), pending.map(|p| p.point)) {
            trace!("Touch sequence moved, treating as scroll");
            return;
        }

        let in_content = self.dom.contains(&self.content, &target);
        let in_trigger = self
            .trigger
            .as_ref()
            .is_some_and(|trigger| self.dom.contains(trigger, &target));
        if in_content || in_trigger {
            return;
        }

        if dropdown_is_valid_parent(&self.dom, &target, &self.dropdown_id) {
            trace!("Interaction inside nested dropdown of {}", self.dropdown_id);
            return;
        }

        debug!("Outside interaction, closing {}", self.dropdown_id);
        self.dropdown.actions.close(event, true);
    }

    fn handle_touch_start(self: &Rc<Self>) {
        *self.touch_move.borrow_mut() = None;
        if self.touch_move_listener.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let listener = self.dom.add_event_listener(
            ListenerTarget::Document,
            EventType::TouchMove,
            ListenerOptions::CAPTURE,
            Rc::new(move |event: &D::Event| {
                if let Some(shared) = weak.upgrade() {
                    shared.handle_touch_move(event);
                }
            }),
        );
        *self.touch_move_listener.borrow_mut() = Some(listener);
    }

    fn handle_touch_move(&self, event: &D::Event) {
        *self.touch_move.borrow_mut() = Some(PendingTouchMove {
            point: event.touch_point(),
        });
        // Bind the listener so the RefCell borrow ends before it is dropped
        let listener = self.touch_move_listener.borrow_mut().take();
        drop(listener);
    }
}

/// Global listeners that close the dropdown on outside interaction
pub struct OutsideClickDetector<D: Dom> {
    shared: Rc<DetectorShared<D>>,
    _listeners: Vec<D::Listener>,
}

impl<D: Dom> OutsideClickDetector<D> {
    /// Register the root listener and, on touch devices, the touch listeners.
    pub fn attach(
        dom: &D,
        content: D::Node,
        trigger: Option<D::Node>,
        dropdown: Dropdown<D::Event>,
        dropdown_id: String,
        root_event_type: RootEventType,
        is_touch_device: bool,
    ) -> Self {
        let shared = Rc::new(DetectorShared {
            dom: dom.clone(),
            content,
            trigger,
            dropdown_id,
            dropdown,
            touch_move: RefCell::new(None),
            touch_move_listener: RefCell::new(None),
        });

        let root_event = match root_event_type {
            RootEventType::Click => EventType::Click,
            RootEventType::MouseDown => EventType::MouseDown,
        };

        let mut listeners = vec![dom.add_event_listener(
            ListenerTarget::Document,
            root_event,
            ListenerOptions::CAPTURE,
            root_handler(&shared),
        )];

        if is_touch_device {
            let weak = Rc::downgrade(&shared);
            listeners.push(dom.add_event_listener(
                ListenerTarget::Document,
                EventType::TouchStart,
                ListenerOptions::CAPTURE,
                Rc::new(move |_: &D::Event| {
                    if let Some(shared) = weak.upgrade() {
                        run_loop::run(|| shared.handle_touch_start());
                    }
                }),
            ));
            listeners.push(dom.add_event_listener(
                ListenerTarget::Document,
                EventType::TouchEnd,
                ListenerOptions::CAPTURE,
                root_handler(&shared),
            ));
        }

        Self {
            shared,
            _listeners: listeners,
        }
    }
}

impl<D: Dom> Drop for OutsideClickDetector<D> {
    fn drop(&mut self) {
        let listener = self.shared.touch_move_listener.borrow_mut().take();
        drop(listener);
    }
}

fn root_handler<D: Dom>(shared: &Rc<DetectorShared<D>>) -> crate::dom::Handler<D::Event> {
    let weak: Weak<DetectorShared<D>> = Rc::downgrade(shared);
    Rc::new(move |event: &D::Event| {
        if let Some(shared) = weak.upgrade() {
            run_loop::run(|| shared.handle_root_event(event));
        }
    })
}
