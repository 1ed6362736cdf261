//! Dropdown handle positioned with floating-ui
//!
//! [`use_floating_dropdown`] creates the [`Dropdown`] handle passed to
//! [`BasicDropdownContent`](super::BasicDropdownContent). Its `reposition`
//! runs floating-ui against the trigger and writes the result into a signal
//! the caller feeds back as the content position.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use basic_dropdown_core::{content_id, ContentPosition, Dom, Dropdown, DropdownActions};
use dioxus::prelude::*;
use dioxus_core::{Runtime, RuntimeGuard};
use tracing::{debug, warn};

use crate::floating_ui::{self, ComputePositionOptions};
use crate::web_dom::{WebDom, WebEvent};

/// Counter for generating unique dropdown IDs
static DROPDOWN_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Dropdown actions backed by floating-ui and Dioxus signals.
///
/// Callbacks arrive from browser listeners, outside the Dioxus runtime, so
/// both actions restore the runtime captured at creation first.
pub struct FloatingReposition {
    unique_id: String,
    options: ComputePositionOptions,
    match_trigger_width: bool,
    runtime: Rc<Runtime>,
    position: Signal<ContentPosition>,
    on_close: EventHandler<bool>,
}

impl DropdownActions<WebEvent> for FloatingReposition {
    fn close(&self, _event: &WebEvent, is_interaction_outside: bool) {
        let _guard = RuntimeGuard::new(self.runtime.clone());
        self.on_close.call(is_interaction_outside);
    }

    fn reposition(&self) {
        let Some(dom) = WebDom::new() else {
            return;
        };
        let trigger_id = format!("{}-trigger", self.unique_id);
        let Some(trigger) = dom.find_by_attribute("data-ebd-id", &trigger_id) else {
            debug!("No trigger for dropdown {}, skipping reposition", self.unique_id);
            return;
        };
        let Some(content) = dom.element_by_id(&content_id(&self.unique_id)) else {
            return;
        };

        let width = self
            .match_trigger_width
            .then(|| f64::from(trigger.client_width()));
        let options = self.options.clone();
        let runtime = self.runtime.clone();
        let position = self.position;
        let unique_id = self.unique_id.clone();

        wasm_bindgen_futures_x::spawn_local(async move {
            match floating_ui::compute_position(&trigger, &content, options).await {
                Ok(result) => {
                    let _guard = RuntimeGuard::new(runtime);
                    // The signal is gone if the dropdown unmounted meanwhile
                    if let Ok(mut guard) = position.try_write() {
                        *guard = result.to_content_position(width);
                    }
                }
                Err(e) => warn!("Failed to position dropdown {}: {:?}", unique_id, e),
            }
        });
    }
}

/// Handle returned by [`use_floating_dropdown`]
#[derive(Clone, PartialEq)]
pub struct FloatingDropdownHandle {
    pub dropdown: Dropdown<WebEvent>,
    /// Latest computed position of the content
    pub position: Signal<ContentPosition>,
}

impl FloatingDropdownHandle {
    /// Value for the trigger's `data-ebd-id` attribute
    pub fn trigger_id(&self) -> String {
        self.dropdown.trigger_id()
    }

    /// Value for the trigger's `aria-controls` attribute
    pub fn content_id(&self) -> String {
        content_id(&self.dropdown.unique_id)
    }
}

/// Hook that creates a dropdown handle positioned by floating-ui.
///
/// `on_close` receives `is_interaction_outside`.
///
/// ```ignore
/// let mut open = use_signal(|| false);
/// let handle = use_floating_dropdown(
///     ComputePositionOptions { offset: Some(4.0), flip: true, ..Default::default() },
///     true,
///     EventHandler::new(move |_| open.set(false)),
/// );
/// rsx! {
///     button {
///         "data-ebd-id": handle.trigger_id(),
///         "aria-controls": handle.content_id(),
///         onclick: move |_| open.toggle(),
///         "Options"
///     }
///     if open() {
///         BasicDropdownContent {
///             dropdown: handle.dropdown.clone(),
///             destination: "dropdown-overlay",
///             position: (handle.position)(),
///             ul { li { "One" } li { "Two" } }
///         }
///     }
/// }
/// ```
pub fn use_floating_dropdown(
    options: ComputePositionOptions,
    match_trigger_width: bool,
    on_close: EventHandler<bool>,
) -> FloatingDropdownHandle {
    let position = use_signal(ContentPosition::default);

    let dropdown = use_hook(move || {
        let id = DROPDOWN_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let unique_id = format!("dropdown-{}", id);
        let actions = FloatingReposition {
            unique_id: unique_id.clone(),
            options,
            match_trigger_width,
            runtime: Runtime::current(),
            position,
            on_close,
        };
        Dropdown::new(unique_id, Rc::new(actions) as Rc<dyn DropdownActions<WebEvent>>)
    });

    FloatingDropdownHandle { dropdown, position }
}
