//! Scroll containment
//!
//! Two strategies, picked once per mount:
//! - **Prevent scroll**: a non-passive capturing `wheel` listener keeps wheel
//!   input from scrolling anything but the dropdown content.
//! - **Reposition on scroll**: the window and every scrollable ancestor of the
//!   trigger request a reposition when they scroll.
//!
//! The active strategy is held as a [`ScrollHandling`] value; dropping it
//! removes exactly the listeners it installed.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::dom::{Dom, DomEvent, EventType, ListenerOptions, ListenerTarget};
use crate::run_loop;
use crate::scroll_helpers::{distribute_scroll, get_available_scroll, get_scroll_deltas};

/// Installed scroll strategy. Dropping it detaches its listeners.
pub enum ScrollHandling<D: Dom> {
    PreventScroll {
        _wheel: D::Listener,
    },
    RepositionOnScroll {
        _window: D::Listener,
        _ancestors: Vec<D::Listener>,
    },
}

impl<D: Dom> ScrollHandling<D> {
    /// Block scrolling outside `content` and redistribute residual wheel
    /// scroll inside it.
    pub fn prevent_scroll(dom: &D, content: D::Node) -> Self {
        debug!("Installing wheel containment");
        let handler_dom = dom.clone();
        let wheel = dom.add_event_listener(
            ListenerTarget::Document,
            EventType::Wheel,
            ListenerOptions {
                capture: true,
                passive: false,
            },
            Rc::new(move |event: &D::Event| {
                run_loop::run(|| handle_wheel(&handler_dom, &content, event));
            }),
        );
        Self::PreventScroll { _wheel: wheel }
    }

    /// Request a reposition whenever the window or one of `ancestors` scrolls.
    pub fn reposition_on_scroll(dom: &D, ancestors: &[D::Node], reposition: Rc<dyn Fn()>) -> Self {
        debug!(
            "Installing reposition-on-scroll for window and {} ancestors",
            ancestors.len()
        );
        let listen = |target: ListenerTarget<D::Node>| {
            let reposition = Rc::clone(&reposition);
            dom.add_event_listener(
                target,
                EventType::Scroll,
                ListenerOptions::BUBBLE,
                Rc::new(move |_: &D::Event| run_loop::run(|| reposition())),
            )
        };
        let window = listen(ListenerTarget::Window);
        let ancestors = ancestors
            .iter()
            .map(|ancestor| listen(ListenerTarget::Node(ancestor.clone())))
            .collect();
        Self::RepositionOnScroll {
            _window: window,
            _ancestors: ancestors,
        }
    }

    pub fn prevents_scroll(&self) -> bool {
        matches!(self, Self::PreventScroll { .. })
    }
}

/// Contain one wheel event.
///
/// Outside the content the event is always cancelled. Inside, the delta is
/// clamped to the scroll budget left within the content; when clamping
/// cancels the event the remaining delta is applied by hand, so overshooting
/// wheel events and two-axis gestures on one-axis containers still scroll.
pub fn handle_wheel<D: Dom>(dom: &D, content: &D::Node, event: &D::Event) {
    let Some(target) = event.target() else {
        return;
    };

    if !dom.contains(content, &target) {
        trace!("Wheel outside dropdown, preventing");
        event.prevent_default();
        return;
    }

    let available = get_available_scroll(dom, &target, content);
    let mut deltas = get_scroll_deltas(dom, event);

    if deltas.delta_x < available.delta_x_negative {
        deltas.delta_x = available.delta_x_negative;
        event.prevent_default();
    } else if deltas.delta_x > available.delta_x_positive {
        deltas.delta_x = available.delta_x_positive;
        event.prevent_default();
    } else if deltas.delta_y < available.delta_y_negative {
        deltas.delta_y = available.delta_y_negative;
        event.prevent_default();
    } else if deltas.delta_y > available.delta_y_positive {
        deltas.delta_y = available.delta_y_positive;
        event.prevent_default();
    }

    if event.default_prevented() && (deltas.delta_x != 0.0 || deltas.delta_y != 0.0) {
        trace!(
            "Redistributing clamped wheel delta ({}, {})",
            deltas.delta_x,
            deltas.delta_y
        );
        distribute_scroll(dom, deltas.delta_x, deltas.delta_y, &target, content);
    }
}
