//! In-memory DOM for exercising the dropdown lifecycle without a browser
//!
//! Events are dispatched explicitly with [`TestDom::dispatch`], mutation
//! records are delivered with [`TestDom::flush_mutations`] and queued
//! animation frames run with [`TestDom::flush_animation_frames`]. Listener and
//! observer bookkeeping is counted so tests can assert nothing leaks.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::dom::{
    ComputedStyle, Dom, DomEvent, EventType, Handler, ListenerOptions, ListenerTarget,
    MutatedNode, MutationCallback, MutationRecord, NodeKind, ScrollMetrics, TouchPoint,
    WheelDelta,
};

/// Handle to a node of a [`TestDom`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TestNode(usize);

enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        classes: Vec<String>,
    },
    Text(String),
    Comment(String),
}

struct NodeEntry {
    data: NodeData,
    parent: Option<usize>,
    children: Vec<usize>,
    style: ComputedStyle,
    metrics: ScrollMetrics,
}

struct ListenerEntry {
    key: u64,
    target: ListenerTarget<TestNode>,
    event: EventType,
    options: ListenerOptions,
    handler: Handler<TestEvent>,
}

struct ObserverEntry {
    key: u64,
    node: TestNode,
    callback: MutationCallback<TestNode>,
    pending: Vec<MutationRecord<TestNode>>,
}

/// Listener and observer bookkeeping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomStats {
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub observers_connected: usize,
    pub observers_disconnected: usize,
}

struct Inner {
    nodes: Vec<NodeEntry>,
    listeners: Vec<ListenerEntry>,
    observers: Vec<ObserverEntry>,
    frames: VecDeque<Box<dyn FnOnce()>>,
    next_key: u64,
    stats: DomStats,
    document_element: usize,
    body: usize,
    touch_device: bool,
    line_height: Option<f64>,
}

impl Inner {
    fn push_node(&mut self, data: NodeData) -> usize {
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
            style: ComputedStyle::default(),
            metrics: ScrollMetrics::default(),
        });
        self.nodes.len() - 1
    }

    fn next_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }

    fn contains(&self, ancestor: usize, node: usize) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.nodes[index].parent;
        }
        false
    }

    fn attribute(&self, node: usize, name: &str) -> Option<String> {
        match &self.nodes[node].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    fn summary(&self, node: usize) -> MutatedNode {
        match &self.nodes[node].data {
            NodeData::Element { .. } => MutatedNode::element(),
            NodeData::Text(text) => MutatedNode::text(text.clone()),
            NodeData::Comment(text) => MutatedNode::comment(text.clone()),
        }
    }

    fn record_mutation(
        &mut self,
        parent: usize,
        added: Vec<MutatedNode>,
        removed: Vec<MutatedNode>,
    ) {
        let observed: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, observer)| self.contains(observer.node.0, parent))
            .map(|(index, _)| index)
            .collect();
        for index in observed {
            self.observers[index].pending.push(MutationRecord {
                target: Some(TestNode(parent)),
                added_nodes: added.clone(),
                removed_nodes: removed.clone(),
            });
        }
    }

    fn detach(&mut self, child: usize) {
        if let Some(parent) = self.nodes[child].parent.take() {
            self.nodes[parent].children.retain(|&c| c != child);
            let removed = vec![self.summary(child)];
            self.record_mutation(parent, Vec::new(), removed);
        }
    }

    fn clone_subtree(&mut self, node: usize) -> usize {
        let data = match &self.nodes[node].data {
            NodeData::Element {
                tag,
                attributes,
                classes,
            } => NodeData::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                classes: classes.clone(),
            },
            NodeData::Text(text) => NodeData::Text(text.clone()),
            NodeData::Comment(text) => NodeData::Comment(text.clone()),
        };
        let copy = self.push_node(data);
        self.nodes[copy].style = self.nodes[node].style.clone();
        self.nodes[copy].metrics = self.nodes[node].metrics;
        let children = self.nodes[node].children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.nodes[child_copy].parent = Some(copy);
            self.nodes[copy].children.push(child_copy);
        }
        copy
    }

    /// Elements attached to the document, in document order
    fn document_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![self.document_element];
        while let Some(index) = stack.pop() {
            order.push(index);
            for &child in self.nodes[index].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}

/// In-memory document with an `<html><body></body></html>` skeleton
#[derive(Clone)]
pub struct TestDom {
    inner: Rc<RefCell<Inner>>,
}

impl Default for TestDom {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDom {
    pub fn new() -> Self {
        let mut inner = Inner {
            nodes: Vec::new(),
            listeners: Vec::new(),
            observers: Vec::new(),
            frames: VecDeque::new(),
            next_key: 0,
            stats: DomStats::default(),
            document_element: 0,
            body: 0,
            touch_device: false,
            line_height: None,
        };
        let html = inner.push_node(NodeData::Element {
            tag: "HTML".into(),
            attributes: Vec::new(),
            classes: Vec::new(),
        });
        let body = inner.push_node(NodeData::Element {
            tag: "BODY".into(),
            attributes: Vec::new(),
            classes: Vec::new(),
        });
        inner.nodes[body].parent = Some(html);
        inner.nodes[html].children.push(body);
        inner.document_element = html;
        inner.body = body;
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn document_element(&self) -> TestNode {
        TestNode(self.inner.borrow().document_element)
    }

    pub fn body_node(&self) -> TestNode {
        TestNode(self.inner.borrow().body)
    }

    pub fn create_element(&self, tag: &str) -> TestNode {
        TestNode(self.inner.borrow_mut().push_node(NodeData::Element {
            tag: tag.to_ascii_uppercase(),
            attributes: Vec::new(),
            classes: Vec::new(),
        }))
    }

    pub fn create_text(&self, text: &str) -> TestNode {
        TestNode(self.inner.borrow_mut().push_node(NodeData::Text(text.to_string())))
    }

    pub fn create_comment(&self, text: &str) -> TestNode {
        TestNode(
            self.inner
                .borrow_mut()
                .push_node(NodeData::Comment(text.to_string())),
        )
    }

    /// Create an element and append it to `parent`.
    pub fn element_in(&self, parent: TestNode, tag: &str) -> TestNode {
        let node = self.create_element(tag);
        self.append_child(&parent, &node);
        node
    }

    pub fn set_attribute(&self, node: TestNode, name: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        if let NodeData::Element { attributes, .. } = &mut inner.nodes[node.0].data {
            match attributes.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn classes(&self, node: TestNode) -> Vec<String> {
        match &self.inner.borrow().nodes[node.0].data {
            NodeData::Element { classes, .. } => classes.clone(),
            _ => Vec::new(),
        }
    }

    pub fn children(&self, node: TestNode) -> Vec<TestNode> {
        self.inner.borrow().nodes[node.0]
            .children
            .iter()
            .map(|&c| TestNode(c))
            .collect()
    }

    pub fn set_style(&self, node: TestNode, update: impl FnOnce(&mut ComputedStyle)) {
        update(&mut self.inner.borrow_mut().nodes[node.0].style);
    }

    pub fn set_scroll_metrics(&self, node: TestNode, metrics: ScrollMetrics) {
        self.inner.borrow_mut().nodes[node.0].metrics = metrics;
    }

    pub fn set_touch_device(&self, touch_device: bool) {
        self.inner.borrow_mut().touch_device = touch_device;
    }

    pub fn set_line_height(&self, line_height: Option<f64>) {
        self.inner.borrow_mut().line_height = line_height;
    }

    pub fn stats(&self) -> DomStats {
        self.inner.borrow().stats
    }

    /// Number of currently registered listeners
    pub fn active_listeners(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Number of listeners registered for `event` on `target`
    pub fn listeners_on(&self, target: &ListenerTarget<TestNode>, event: EventType) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|entry| &entry.target == target && entry.event == event)
            .count()
    }

    /// Options of the first listener registered for `event` on `target`
    pub fn listener_options(
        &self,
        target: &ListenerTarget<TestNode>,
        event: EventType,
    ) -> Option<ListenerOptions> {
        self.inner
            .borrow()
            .listeners
            .iter()
            .find(|entry| &entry.target == target && entry.event == event)
            .map(|entry| entry.options)
    }

    pub fn active_observers(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    pub fn pending_animation_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    /// Invoke the listeners registered for `event` on `target`, in
    /// registration order. Listeners removed by an earlier handler are skipped.
    pub fn dispatch(
        &self,
        target: ListenerTarget<TestNode>,
        event: EventType,
        payload: &TestEvent,
    ) {
        let matching: Vec<(u64, Handler<TestEvent>)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.target == target && entry.event == event)
            .map(|entry| (entry.key, Rc::clone(&entry.handler)))
            .collect();
        for (key, handler) in matching {
            let still_registered = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|entry| entry.key == key);
            if still_registered {
                handler(payload);
            }
        }
    }

    /// Deliver queued mutation records, one batch per observer.
    pub fn flush_mutations(&self) {
        let batches: Vec<(MutationCallback<TestNode>, Vec<MutationRecord<TestNode>>)> = self
            .inner
            .borrow_mut()
            .observers
            .iter_mut()
            .filter(|observer| !observer.pending.is_empty())
            .map(|observer| {
                (
                    Rc::clone(&observer.callback),
                    std::mem::take(&mut observer.pending),
                )
            })
            .collect();
        for (callback, records) in batches {
            callback(&records);
        }
    }

    /// Run the animation frames queued so far. Frames requested while
    /// flushing wait for the next flush.
    pub fn flush_animation_frames(&self) {
        let frames: Vec<Box<dyn FnOnce()>> = self.inner.borrow_mut().frames.drain(..).collect();
        for frame in frames {
            frame();
        }
    }
}

/// Listener handle of a [`TestDom`]
pub struct TestListener {
    dom: Weak<RefCell<Inner>>,
    key: u64,
}

impl Drop for TestListener {
    fn drop(&mut self) {
        let Some(inner) = self.dom.upgrade() else {
            return;
        };
        // The entry's handler is dropped after the borrow ends; it may own
        // other listeners whose drop borrows again.
        let removed = {
            let mut inner = inner.borrow_mut();
            let position = inner.listeners.iter().position(|entry| entry.key == self.key);
            let removed = position.map(|index| inner.listeners.remove(index));
            if removed.is_some() {
                inner.stats.listeners_removed += 1;
            }
            removed
        };
        drop(removed);
    }
}

/// Observer handle of a [`TestDom`]
pub struct TestObserver {
    dom: Weak<RefCell<Inner>>,
    key: u64,
}

impl Drop for TestObserver {
    fn drop(&mut self) {
        let Some(inner) = self.dom.upgrade() else {
            return;
        };
        let removed = {
            let mut inner = inner.borrow_mut();
            let position = inner.observers.iter().position(|entry| entry.key == self.key);
            let removed = position.map(|index| inner.observers.remove(index));
            if removed.is_some() {
                inner.stats.observers_disconnected += 1;
            }
            removed
        };
        drop(removed);
    }
}

/// Event payload dispatched through a [`TestDom`]
#[derive(Debug, Default)]
pub struct TestEvent {
    pub target: Option<TestNode>,
    pub wheel: Option<WheelDelta>,
    pub touch: Option<TouchPoint>,
    prevented: Cell<bool>,
}

impl TestEvent {
    pub fn on(target: TestNode) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }

    pub fn without_target() -> Self {
        Self::default()
    }

    pub fn wheel(target: TestNode, delta_x: f64, delta_y: f64) -> Self {
        Self {
            target: Some(target),
            wheel: Some(WheelDelta {
                delta_x,
                delta_y,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn touch(target: TestNode, page_x: f64, page_y: f64) -> Self {
        Self {
            target: Some(target),
            touch: Some(TouchPoint {
                page_x,
                page_y,
                stylus: false,
            }),
            ..Default::default()
        }
    }

    pub fn stylus(target: TestNode, page_x: f64, page_y: f64) -> Self {
        Self {
            target: Some(target),
            touch: Some(TouchPoint {
                page_x,
                page_y,
                stylus: true,
            }),
            ..Default::default()
        }
    }
}

impl DomEvent for TestEvent {
    type Node = TestNode;

    fn target(&self) -> Option<TestNode> {
        self.target
    }

    fn prevent_default(&self) {
        self.prevented.set(true);
    }

    fn default_prevented(&self) -> bool {
        self.prevented.get()
    }

    fn wheel_delta(&self) -> Option<WheelDelta> {
        self.wheel
    }

    fn touch_point(&self) -> Option<TouchPoint> {
        self.touch
    }
}

impl Dom for TestDom {
    type Node = TestNode;
    type Event = TestEvent;
    type Listener = TestListener;
    type Observer = TestObserver;

    fn element_by_id(&self, id: &str) -> Option<TestNode> {
        self.find_by_attribute("id", id)
    }

    fn find_by_attribute(&self, name: &str, value: &str) -> Option<TestNode> {
        let inner = self.inner.borrow();
        inner
            .document_order()
            .into_iter()
            .find(|&index| inner.attribute(index, name).as_deref() == Some(value))
            .map(TestNode)
    }

    fn body(&self) -> Option<TestNode> {
        Some(self.body_node())
    }

    fn contains(&self, ancestor: &TestNode, node: &TestNode) -> bool {
        self.inner.borrow().contains(ancestor.0, node.0)
    }

    fn parent_element(&self, node: &TestNode) -> Option<TestNode> {
        self.inner.borrow().nodes[node.0].parent.map(TestNode)
    }

    fn tag_name(&self, node: &TestNode) -> String {
        match &self.inner.borrow().nodes[node.0].data {
            NodeData::Element { tag, .. } => tag.clone(),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
        }
    }

    fn attribute(&self, node: &TestNode, name: &str) -> Option<String> {
        self.inner.borrow().attribute(node.0, name)
    }

    fn set_id(&self, node: &TestNode, id: &str) {
        self.set_attribute(*node, "id", id);
    }

    fn has_class(&self, node: &TestNode, class: &str) -> bool {
        self.classes(*node).iter().any(|c| c == class)
    }

    fn add_class(&self, node: &TestNode, class: &str) {
        let mut inner = self.inner.borrow_mut();
        if let NodeData::Element { classes, .. } = &mut inner.nodes[node.0].data {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, node: &TestNode, class: &str) {
        let mut inner = self.inner.borrow_mut();
        if let NodeData::Element { classes, .. } = &mut inner.nodes[node.0].data {
            classes.retain(|c| c != class);
        }
    }

    fn clone_deep(&self, node: &TestNode) -> Option<TestNode> {
        Some(TestNode(self.inner.borrow_mut().clone_subtree(node.0)))
    }

    fn append_child(&self, parent: &TestNode, child: &TestNode) {
        let mut inner = self.inner.borrow_mut();
        if inner.contains(child.0, parent.0) {
            return;
        }
        inner.detach(child.0);
        inner.nodes[child.0].parent = Some(parent.0);
        inner.nodes[parent.0].children.push(child.0);
        let added = vec![inner.summary(child.0)];
        inner.record_mutation(parent.0, added, Vec::new());
    }

    fn remove_child(&self, parent: &TestNode, child: &TestNode) {
        let mut inner = self.inner.borrow_mut();
        if inner.nodes[child.0].parent == Some(parent.0) {
            inner.detach(child.0);
        }
    }

    fn computed_style(&self, node: &TestNode) -> ComputedStyle {
        self.inner.borrow().nodes[node.0].style.clone()
    }

    fn scroll_metrics(&self, node: &TestNode) -> ScrollMetrics {
        self.inner.borrow().nodes[node.0].metrics
    }

    fn set_scroll_position(&self, node: &TestNode, left: f64, top: f64) {
        let mut inner = self.inner.borrow_mut();
        let metrics = &mut inner.nodes[node.0].metrics;
        metrics.scroll_left = left.clamp(0.0, metrics.scroll_left_max().max(0.0));
        metrics.scroll_top = top.clamp(0.0, metrics.scroll_top_max().max(0.0));
    }

    fn scroll_line_height(&self) -> Option<f64> {
        self.inner.borrow().line_height
    }

    fn is_touch_device(&self) -> bool {
        self.inner.borrow().touch_device
    }

    fn add_event_listener(
        &self,
        target: ListenerTarget<TestNode>,
        event: EventType,
        options: ListenerOptions,
        handler: Handler<TestEvent>,
    ) -> TestListener {
        let mut inner = self.inner.borrow_mut();
        let key = inner.next_key();
        inner.listeners.push(ListenerEntry {
            key,
            target,
            event,
            options,
            handler,
        });
        inner.stats.listeners_added += 1;
        TestListener {
            dom: Rc::downgrade(&self.inner),
            key,
        }
    }

    fn observe_mutations(
        &self,
        node: &TestNode,
        callback: MutationCallback<TestNode>,
    ) -> Option<TestObserver> {
        let mut inner = self.inner.borrow_mut();
        let key = inner.next_key();
        inner.observers.push(ObserverEntry {
            key,
            node: *node,
            callback,
            pending: Vec::new(),
        });
        inner.stats.observers_connected += 1;
        Some(TestObserver {
            dom: Rc::downgrade(&self.inner),
            key,
        })
    }

    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>) {
        self.inner.borrow_mut().frames.push_back(callback);
    }
}

impl TestDom {
    /// Kind of a node, for assertions on what was cloned or appended
    pub fn node_kind(&self, node: TestNode) -> NodeKind {
        match &self.inner.borrow().nodes[node.0].data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_drop_unregisters() {
        let dom = TestDom::new();
        let listener = dom.add_event_listener(
            ListenerTarget::Window,
            EventType::Resize,
            ListenerOptions::BUBBLE,
            Rc::new(|_: &TestEvent| {}),
        );
        assert_eq!(dom.listeners_on(&ListenerTarget::Window, EventType::Resize), 1);
        drop(listener);
        assert_eq!(dom.active_listeners(), 0);
        assert_eq!(dom.stats().listeners_removed, 1);
    }

    #[test]
    fn test_mutations_recorded_for_subtree() {
        let dom = TestDom::new();
        let root = dom.element_in(dom.body_node(), "div");
        let inner = dom.element_in(root, "ul");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _observer = dom.observe_mutations(
            &root,
            Rc::new(move |records: &[MutationRecord<TestNode>]| {
                s.borrow_mut().extend(records.iter().cloned());
            }),
        );

        let item = dom.create_element("li");
        dom.append_child(&inner, &item);
        dom.flush_mutations();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].target, Some(inner));
        assert_eq!(seen[0].added_nodes, vec![MutatedNode::element()]);
    }

    #[test]
    fn test_find_by_attribute_only_sees_attached_nodes() {
        let dom = TestDom::new();
        let detached = dom.create_element("button");
        dom.set_attribute(detached, "data-ebd-id", "1-trigger");
        assert_eq!(dom.find_by_attribute("data-ebd-id", "1-trigger"), None);

        dom.append_child(&dom.body_node(), &detached);
        assert_eq!(dom.find_by_attribute("data-ebd-id", "1-trigger"), Some(detached));
    }

    #[test]
    fn test_clone_deep_copies_subtree_detached() {
        let dom = TestDom::new();
        let root = dom.element_in(dom.body_node(), "div");
        dom.add_class(&root, "panel");
        let text = dom.create_text("hello");
        dom.append_child(&root, &text);

        let copy = dom.clone_deep(&root).unwrap();
        assert_ne!(copy, root);
        assert_eq!(dom.parent_element(&copy), None);
        assert!(dom.has_class(&copy, "panel"));
        let children = dom.children(copy);
        assert_eq!(children.len(), 1);
        assert_eq!(dom.node_kind(children[0]), NodeKind::Text);
    }
}
