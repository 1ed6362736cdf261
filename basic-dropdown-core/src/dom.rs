//! The DOM seam the dropdown logic runs against
//!
//! Everything the content lifecycle needs from a document lives behind the
//! [`Dom`] trait: element lookup and tree walking, class and attribute access,
//! scroll geometry, computed style, event listeners, mutation observers and
//! animation frames.
//!
//! Listener and observer handles are owned values. Dropping a
//! [`Dom::Listener`] removes the listener, dropping a [`Dom::Observer`]
//! disconnects the observer. Removing something that is already gone is a
//! no-op.

use std::fmt;
use std::rc::Rc;

/// Callback invoked for every dispatched event a listener matches
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Callback invoked with a batch of mutation records
pub type MutationCallback<N> = Rc<dyn Fn(&[MutationRecord<N>])>;

/// Event types the dropdown subscribes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    MouseDown,
    TouchStart,
    TouchMove,
    TouchEnd,
    Wheel,
    Scroll,
    Resize,
    OrientationChange,
    AnimationEnd,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Wheel => "wheel",
            Self::Scroll => "scroll",
            Self::Resize => "resize",
            Self::OrientationChange => "orientationchange",
            Self::AnimationEnd => "animationend",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a listener is attached
#[derive(Clone, Debug, PartialEq)]
pub enum ListenerTarget<N> {
    Document,
    Window,
    Node(N),
}

/// Options passed along with `addEventListener`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

impl ListenerOptions {
    pub const BUBBLE: Self = Self {
        capture: false,
        passive: false,
    };

    pub const CAPTURE: Self = Self {
        capture: true,
        passive: false,
    };
}

/// Unit of a wheel delta
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Maps `WheelEvent.deltaMode` (0, 1, 2) to a mode. Unknown values count as pixels.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Line,
            2 => Self::Page,
            _ => Self::Pixel,
        }
    }
}

/// Raw wheel delta as reported by the event
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelDelta {
    pub delta_x: f64,
    pub delta_y: f64,
    pub mode: DeltaMode,
}

/// First changed touch of a touch event
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub page_x: f64,
    pub page_y: f64,
    pub stylus: bool,
}

/// Read access to a dispatched event
pub trait DomEvent {
    type Node;

    fn target(&self) -> Option<Self::Node>;
    fn prevent_default(&self);
    fn default_prevented(&self) -> bool;
    /// Present for wheel events only.
    fn wheel_delta(&self) -> Option<WheelDelta>;
    /// First changed touch, present for touch events only.
    fn touch_point(&self) -> Option<TouchPoint>;
}

/// Subset of `getComputedStyle` the dropdown reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputedStyle {
    pub position: String,
    pub overflow: String,
    pub overflow_x: String,
    pub overflow_y: String,
    pub animation_name: String,
    pub animation_play_state: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            position: "static".to_string(),
            overflow: "visible".to_string(),
            overflow_x: "visible".to_string(),
            overflow_y: "visible".to_string(),
            animation_name: "none".to_string(),
            animation_play_state: "running".to_string(),
        }
    }
}

fn is_scroll_value(value: &str) -> bool {
    value.contains("auto") || value.contains("scroll")
}

impl ComputedStyle {
    /// Any of the overflow properties lets the element scroll
    pub fn is_scroll_container(&self) -> bool {
        is_scroll_value(&self.overflow)
            || is_scroll_value(&self.overflow_x)
            || is_scroll_value(&self.overflow_y)
    }

    pub fn scrolls_x(&self) -> bool {
        is_scroll_value(&self.overflow_x)
    }

    pub fn scrolls_y(&self) -> bool {
        is_scroll_value(&self.overflow_y)
    }

    pub fn has_running_animation(&self) -> bool {
        self.animation_name != "none" && self.animation_play_state == "running"
    }
}

/// Scroll offsets and extents of an element, in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn scroll_left_max(&self) -> f64 {
        self.scroll_width - self.client_width
    }

    pub fn scroll_top_max(&self) -> f64 {
        self.scroll_height - self.client_height
    }
}

/// Kind of a node that showed up in a mutation record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Other,
}

/// Node added to or removed from the observed subtree
#[derive(Clone, Debug, PartialEq)]
pub struct MutatedNode {
    pub kind: NodeKind,
    pub value: Option<String>,
}

impl MutatedNode {
    pub fn element() -> Self {
        Self {
            kind: NodeKind::Element,
            value: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            value: Some(value.into()),
        }
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Comment,
            value: Some(value.into()),
        }
    }
}

/// One `childList` mutation
#[derive(Clone, Debug, PartialEq)]
pub struct MutationRecord<N> {
    pub target: Option<N>,
    pub added_nodes: Vec<MutatedNode>,
    pub removed_nodes: Vec<MutatedNode>,
}

/// Document operations used by the dropdown content lifecycle
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;
    type Event: DomEvent<Node = Self::Node> + 'static;
    /// Removes its listener when dropped.
    type Listener: 'static;
    /// Disconnects its observer when dropped.
    type Observer: 'static;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// First element in document order whose attribute `name` equals `value`.
    fn find_by_attribute(&self, name: &str, value: &str) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Upper-case tag name, e.g. `BODY`.
    fn tag_name(&self, node: &Self::Node) -> String;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_id(&self, node: &Self::Node, id: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);

    fn clone_deep(&self, node: &Self::Node) -> Option<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    /// No-op when `child` is not a child of `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

    fn computed_style(&self, node: &Self::Node) -> ComputedStyle;
    fn scroll_metrics(&self, node: &Self::Node) -> ScrollMetrics;
    fn set_scroll_position(&self, node: &Self::Node, left: f64, top: f64);
    /// Pixel height of one wheel "line", if the host can tell.
    fn scroll_line_height(&self) -> Option<f64>;
    fn is_touch_device(&self) -> bool;

    fn add_event_listener(
        &self,
        target: ListenerTarget<Self::Node>,
        event: EventType,
        options: ListenerOptions,
        handler: Handler<Self::Event>,
    ) -> Self::Listener;

    /// Observes `childList` changes of `node` and its whole subtree.
    fn observe_mutations(
        &self,
        node: &Self::Node,
        callback: MutationCallback<Self::Node>,
    ) -> Option<Self::Observer>;

    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>);
}
