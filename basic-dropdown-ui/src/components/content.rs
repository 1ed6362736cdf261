//! Dropdown content component
//!
//! Renders the floating panel and hands the mounted element to
//! [`DropdownContent`], which arms outside-click detection, scroll handling,
//! layout watching and the enter animation. Unmounting tears all of that down
//! and plays the exit animation on a detached clone.

use std::cell::RefCell;
use std::rc::Rc;

use basic_dropdown_core::{
    content_style, AnimationClasses, AnimationPhase, ContentOptions, ContentPosition, Dom,
    Dropdown, DropdownContent, MutationRecord, RootEventType, CONTENT_CLASS,
};
use dioxus::prelude::*;
use dioxus_core::{Runtime, RuntimeGuard};
use tracing::{debug, warn};
use web_sys_x::Element;

use crate::web_dom::{WebDom, WebEvent};

type RepositionPredicate = dyn Fn(&[MutationRecord<Element>], &Dropdown<WebEvent>) -> bool;

/// Predicate deciding whether a layout-relevant mutation batch repositions
/// the dropdown. PartialEq compares by pointer.
#[derive(Clone)]
pub struct ShouldReposition(pub Rc<RepositionPredicate>);

impl ShouldReposition {
    pub fn new(
        predicate: impl Fn(&[MutationRecord<Element>], &Dropdown<WebEvent>) -> bool + 'static,
    ) -> Self {
        Self(Rc::new(predicate))
    }
}

impl PartialEq for ShouldReposition {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Mounted element plus the lifecycle driving it
struct MountedContent {
    content: DropdownContent<WebDom>,
    element: Element,
}

/// Floating content of a dropdown
#[component]
pub fn BasicDropdownContent(
    /// Dropdown handle, see `use_floating_dropdown`
    dropdown: Dropdown<WebEvent>,
    /// Id of the container the content is moved into
    #[props(default)]
    destination: String,
    /// Render where declared instead of moving into `destination`
    #[props(default)]
    render_in_place: bool,
    /// Block page scroll while open instead of following it
    #[props(default)]
    prevent_scroll: bool,
    /// Event that counts as an outside interaction
    #[props(default)]
    root_event_type: RootEventType,
    /// Overrides touch detection
    #[props(default)]
    is_touch_device: Option<bool>,
    #[props(default)]
    transitioning_in_class: Option<String>,
    #[props(default)]
    transitioned_in_class: Option<String>,
    #[props(default)]
    transitioning_out_class: Option<String>,
    /// Disable to skip enter/exit animations (e.g. in tests)
    #[props(default = true)]
    animation_enabled: bool,
    /// Position from the last reposition
    #[props(default)]
    position: ContentPosition,
    /// Final say on whether content mutations reposition
    #[props(default)]
    should_reposition: Option<ShouldReposition>,
    #[props(default)]
    on_focus_in: Option<EventHandler<FocusEvent>>,
    #[props(default)]
    on_focus_out: Option<EventHandler<FocusEvent>>,
    #[props(default)]
    on_mouse_enter: Option<EventHandler<MouseEvent>>,
    #[props(default)]
    on_mouse_leave: Option<EventHandler<MouseEvent>>,
    /// Extra CSS classes for the content element
    #[props(default)]
    class: Option<String>,
    children: Element,
) -> Element {
    let options = ContentOptions {
        destination: destination.clone(),
        render_in_place,
        prevent_scroll,
        is_touch_device,
        root_event_type,
        transitioning_in_class,
        transitioned_in_class,
        transitioning_out_class,
        animation_enabled,
    };
    let initial_class = AnimationClasses::from_options(&options)
        .class_for(AnimationPhase::TransitioningIn)
        .to_string();
    let animation_class = use_signal(move || initial_class);
    let mounted = use_hook(|| Rc::new(RefCell::new(None::<MountedContent>)));

    let on_mounted = {
        let mounted = mounted.clone();
        let dropdown = dropdown.clone();
        move |evt: MountedEvent| {
            let Some(element) = evt.data().downcast::<Element>().cloned() else {
                return;
            };
            let Some(dom) = WebDom::new() else {
                return;
            };
            if let Err(e) = options.validate() {
                warn!("Invalid dropdown options for {}: {}", dropdown.unique_id, e);
            }

            let mut content = DropdownContent::new(dom.clone(), dropdown.clone(), options.clone());
            if let Some(ShouldReposition(predicate)) = should_reposition.clone() {
                content = content.with_should_reposition(move |records, dropdown| {
                    predicate(records, dropdown)
                });
            }

            if !render_in_place {
                match content.destination_element() {
                    Some(destination) => dom.append_child(&destination, &element),
                    None => warn!(
                        "Dropdown destination #{} not found, rendering in place",
                        options.destination
                    ),
                }
            }

            // Phase changes come from animation callbacks, outside the runtime
            let runtime = Runtime::current();
            let classes = content.classes().clone();
            content.on_animation_phase_change(move |phase| {
                let _guard = RuntimeGuard::new(runtime.clone());
                if let Ok(mut guard) = animation_class.try_write() {
                    *guard = classes.class_for(phase).to_string();
                }
            });

            content.setup(&element);
            content.setup_mutation_observer(&element);
            content.animate_in(&element);
            debug!("Mounted {}", content.dropdown_id());

            let previous = mounted
                .borrow_mut()
                .replace(MountedContent { content, element });
            if let Some(previous) = previous {
                previous.content.teardown();
                previous.content.teardown_mutation_observer();
            }
        }
    };

    use_drop({
        let mounted = mounted.clone();
        move || {
            let Some(MountedContent { content, element }) = mounted.borrow_mut().take() else {
                return;
            };
            content.teardown();
            content.teardown_mutation_observer();
            content.animate_out(&element);
        }
    });

    let dropdown_id = basic_dropdown_core::content_id(&dropdown.unique_id);
    let in_place_class = if render_in_place {
        format!(" {CONTENT_CLASS}--in-place")
    } else {
        String::new()
    };
    let extra_class = class.unwrap_or_default();
    let style = content_style(&position);

    let body = rsx! {
        div {
            id: "{dropdown_id}",
            class: "{CONTENT_CLASS}{in_place_class} {animation_class} {extra_class}",
            style: "{style}",
            onmounted: on_mounted,
            onfocusin: move |evt| {
                if let Some(handler) = on_focus_in {
                    handler.call(evt);
                }
            },
            onfocusout: move |evt| {
                if let Some(handler) = on_focus_out {
                    handler.call(evt);
                }
            },
            onmouseenter: move |evt| {
                if let Some(handler) = on_mouse_enter {
                    handler.call(evt);
                }
            },
            onmouseleave: move |evt| {
                if let Some(handler) = on_mouse_leave {
                    handler.call(evt);
                }
            },
            {children}
        }
    };

    if render_in_place {
        rsx! {
            div { class: "{CONTENT_CLASS}-wormhole-origin", {body} }
        }
    } else {
        body
    }
}
