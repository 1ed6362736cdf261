//! Browser implementation of the dropdown DOM seam
//!
//! # Listener Cleanup
//!
//! Listeners and observers follow the same RAII pattern: the handle owns the
//! `Closure` and removes (or disconnects) it when dropped. A handle can be
//! dropped from inside its own callback (the touch-move listener removes
//! itself on first fire), so the closure itself is released from a spawned
//! task once the current one finishes instead of inside `Drop`.

use std::rc::Rc;

use basic_dropdown_core::dom::{
    ComputedStyle, DeltaMode, Dom, DomEvent, EventType, Handler, ListenerOptions, ListenerTarget,
    MutatedNode, MutationCallback, MutationRecord, NodeKind, ScrollMetrics, TouchPoint,
    WheelDelta,
};
use tracing::warn;
use wasm_bindgen_x::prelude::*;
use wasm_bindgen_x::JsCast;
use web_sys_x::Element;

/// Document and window of the page the dropdown lives in
#[derive(Clone, Debug)]
pub struct WebDom {
    window: web_sys_x::Window,
    document: web_sys_x::Document,
}

impl WebDom {
    /// `None` outside a browsing context.
    pub fn new() -> Option<Self> {
        let window = web_sys_x::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn event_target(&self, target: &ListenerTarget<Element>) -> web_sys_x::EventTarget {
        match target {
            ListenerTarget::Document => self.document.clone().into(),
            ListenerTarget::Window => self.window.clone().into(),
            ListenerTarget::Node(element) => element.clone().into(),
        }
    }

    fn style_of(&self, element: &Element) -> Option<web_sys_x::CssStyleDeclaration> {
        self.window.get_computed_style(element).ok().flatten()
    }
}

/// DOM event as seen by the dropdown logic
#[derive(Clone, Debug)]
pub struct WebEvent(pub web_sys_x::Event);

impl DomEvent for WebEvent {
    type Node = Element;

    fn target(&self) -> Option<Element> {
        let target = self.0.target()?;
        match target.dyn_into::<Element>() {
            Ok(element) => Some(element),
            // Text nodes resolve to their parent element
            Err(target) => target
                .dyn_into::<web_sys_x::Node>()
                .ok()
                .and_then(|node| node.parent_element()),
        }
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn default_prevented(&self) -> bool {
        self.0.default_prevented()
    }

    fn wheel_delta(&self) -> Option<WheelDelta> {
        let wheel = self.0.dyn_ref::<web_sys_x::WheelEvent>()?;
        Some(WheelDelta {
            delta_x: wheel.delta_x(),
            delta_y: wheel.delta_y(),
            mode: DeltaMode::from_raw(wheel.delta_mode()),
        })
    }

    fn touch_point(&self) -> Option<TouchPoint> {
        let touch_event = self.0.dyn_ref::<web_sys_x::TouchEvent>()?;
        let touch = touch_event.changed_touches().get(0)?;
        let stylus = js_sys_x::Reflect::get(&touch, &"touchType".into())
            .ok()
            .and_then(|value| value.as_string())
            .is_some_and(|kind| kind == "stylus");
        Some(TouchPoint {
            page_x: f64::from(touch.page_x()),
            page_y: f64::from(touch.page_y()),
            stylus,
        })
    }
}

/// Event listener that removes itself when dropped
pub struct WebListener {
    target: web_sys_x::EventTarget,
    event_name: &'static str,
    capture: bool,
    callback: Option<Closure<dyn FnMut(web_sys_x::Event)>>,
}

impl Drop for WebListener {
    fn drop(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.event_name,
            callback.as_ref().unchecked_ref(),
            self.capture,
        );
        wasm_bindgen_futures_x::spawn_local(async move {
            drop(callback);
        });
    }
}

/// Mutation observer that disconnects when dropped
pub struct WebObserver {
    observer: web_sys_x::MutationObserver,
    callback: Option<Closure<dyn FnMut(js_sys_x::Array, web_sys_x::MutationObserver)>>,
}

impl Drop for WebObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
        if let Some(callback) = self.callback.take() {
            wasm_bindgen_futures_x::spawn_local(async move {
                drop(callback);
            });
        }
    }
}

fn summarize(node: &web_sys_x::Node) -> MutatedNode {
    let kind = match node.node_type() {
        web_sys_x::Node::ELEMENT_NODE => NodeKind::Element,
        web_sys_x::Node::TEXT_NODE => NodeKind::Text,
        web_sys_x::Node::COMMENT_NODE => NodeKind::Comment,
        _ => NodeKind::Other,
    };
    MutatedNode {
        kind,
        value: node.node_value(),
    }
}

fn summarize_list(nodes: &web_sys_x::NodeList) -> Vec<MutatedNode> {
    (0..nodes.length())
        .filter_map(|index| nodes.get(index))
        .map(|node| summarize(&node))
        .collect()
}

fn convert_records(records: &js_sys_x::Array) -> Vec<MutationRecord<Element>> {
    records
        .iter()
        .filter_map(|record| record.dyn_into::<web_sys_x::MutationRecord>().ok())
        .map(|record| MutationRecord {
            target: record
                .target()
                .and_then(|node| node.dyn_into::<Element>().ok()),
            added_nodes: summarize_list(&record.added_nodes()),
            removed_nodes: summarize_list(&record.removed_nodes()),
        })
        .collect()
}

/// CSS attribute selector matching `value` exactly
fn attribute_selector(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{name}=\"{escaped}\"]")
}

fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

impl Dom for WebDom {
    type Node = Element;
    type Event = WebEvent;
    type Listener = WebListener;
    type Observer = WebObserver;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn find_by_attribute(&self, name: &str, value: &str) -> Option<Element> {
        self.document
            .query_selector(&attribute_selector(name, value))
            .ok()
            .flatten()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &web_sys_x::Node = node.as_ref();
        ancestor.contains(Some(node))
    }

    fn parent_element(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_uppercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_id(&self, node: &Element, id: &str) {
        node.set_id(id);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn clone_deep(&self, node: &Element) -> Option<Element> {
        node.clone_node_with_deep(true)
            .ok()?
            .dyn_into::<Element>()
            .ok()
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            warn!("Failed to append dropdown element: {:?}", e);
        }
    }

    fn remove_child(&self, parent: &Element, child: &Element) {
        let parent_node: &web_sys_x::Node = parent.as_ref();
        let is_child = child
            .parent_node()
            .is_some_and(|node| &node == parent_node);
        if is_child {
            let _ = parent.remove_child(child);
        }
    }

    fn computed_style(&self, node: &Element) -> ComputedStyle {
        let Some(style) = self.style_of(node) else {
            return ComputedStyle::default();
        };
        let read = |property: &str, fallback: &str| {
            style
                .get_property_value(property)
                .ok()
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };
        ComputedStyle {
            position: read("position", "static"),
            overflow: read("overflow", "visible"),
            overflow_x: read("overflow-x", "visible"),
            overflow_y: read("overflow-y", "visible"),
            animation_name: read("animation-name", "none"),
            animation_play_state: read("animation-play-state", "running"),
        }
    }

    fn scroll_metrics(&self, node: &Element) -> ScrollMetrics {
        ScrollMetrics {
            scroll_left: f64::from(node.scroll_left()),
            scroll_top: f64::from(node.scroll_top()),
            scroll_width: f64::from(node.scroll_width()),
            scroll_height: f64::from(node.scroll_height()),
            client_width: f64::from(node.client_width()),
            client_height: f64::from(node.client_height()),
        }
    }

    fn set_scroll_position(&self, node: &Element, left: f64, top: f64) {
        node.set_scroll_left(left.round() as i32);
        node.set_scroll_top(top.round() as i32);
    }

    fn scroll_line_height(&self) -> Option<f64> {
        let root = self.document.document_element()?;
        let value = self.style_of(&root)?.get_property_value("line-height").ok()?;
        parse_px(&value)
    }

    fn is_touch_device(&self) -> bool {
        js_sys_x::Reflect::has(&self.window, &"ontouchstart".into()).unwrap_or(false)
    }

    fn add_event_listener(
        &self,
        target: ListenerTarget<Element>,
        event: EventType,
        options: ListenerOptions,
        handler: Handler<WebEvent>,
    ) -> WebListener {
        let target = self.event_target(&target);
        let event_name = event.as_str();
        let callback: Closure<dyn FnMut(web_sys_x::Event)> =
            Closure::wrap(Box::new(move |event: web_sys_x::Event| {
                handler(&WebEvent(event));
            }));

        let listener_options = web_sys_x::AddEventListenerOptions::new();
        listener_options.set_capture(options.capture);
        listener_options.set_passive(options.passive);
        if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
            event_name,
            callback.as_ref().unchecked_ref(),
            &listener_options,
        ) {
            warn!("Failed to add {} listener: {:?}", event_name, e);
        }

        WebListener {
            target,
            event_name,
            capture: options.capture,
            callback: Some(callback),
        }
    }

    fn observe_mutations(
        &self,
        node: &Element,
        callback: MutationCallback<Element>,
    ) -> Option<WebObserver> {
        let closure: Closure<dyn FnMut(js_sys_x::Array, web_sys_x::MutationObserver)> =
            Closure::wrap(Box::new(
                move |records: js_sys_x::Array, _: web_sys_x::MutationObserver| {
                    callback(&convert_records(&records));
                },
            ));

        let observer = match web_sys_x::MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("Failed to create mutation observer: {:?}", e);
                return None;
            }
        };
        let init = web_sys_x::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(e) = observer.observe_with_options(node, &init) {
            warn!("Failed to observe dropdown content: {:?}", e);
            return None;
        }

        Some(WebObserver {
            observer,
            callback: Some(closure),
        })
    }

    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>) {
        let frame = Closure::once_into_js(move || callback());
        if let Err(e) = self.window.request_animation_frame(frame.unchecked_ref()) {
            warn!("Failed to request animation frame: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("18px"), Some(18.0));
        assert_eq!(parse_px(" 20.5px "), Some(20.5));
        assert_eq!(parse_px("normal"), None);
        assert_eq!(parse_px("1.5"), None);
    }

    #[test]
    fn test_attribute_selector_escapes_backslash_then_quote() {
        assert_eq!(
            attribute_selector("data-ebd-id", "7-trigger"),
            r#"[data-ebd-id="7-trigger"]"#
        );
        assert_eq!(
            attribute_selector("data-ebd-id", r#"a\b"c"#),
            r#"[data-ebd-id="a\\b\"c"]"#
        );
    }
}
