#![cfg(feature = "test-utils")]
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use basic_dropdown_core::dom::{Dom, DomEvent, EventType, ListenerTarget, ScrollMetrics};
use basic_dropdown_core::testing::{TestDom, TestEvent, TestNode};
use basic_dropdown_core::{
    content_id, AnimationPhase, ContentOptions, Dropdown, DropdownActions, DropdownContent,
    CONTENT_CLASS,
};

#[derive(Default)]
struct Recorder {
    closes: RefCell<Vec<bool>>,
    repositions: Cell<usize>,
}

impl DropdownActions<TestEvent> for Recorder {
    fn close(&self, _event: &TestEvent, is_interaction_outside: bool) {
        self.closes.borrow_mut().push(is_interaction_outside);
    }

    fn reposition(&self) {
        self.repositions.set(self.repositions.get() + 1);
    }
}

struct Mounted {
    recorder: Rc<Recorder>,
    trigger: TestNode,
    element: TestNode,
    content: DropdownContent<TestDom>,
}

/// Render a trigger under `trigger_parent` and a content element under
/// `content_parent`, then run the mount hooks.
fn mount(
    dom: &TestDom,
    unique_id: &str,
    trigger_parent: TestNode,
    content_parent: TestNode,
    options: ContentOptions,
) -> Mounted {
    let recorder = Rc::new(Recorder::default());
    let dropdown = Dropdown::new(unique_id, recorder.clone() as Rc<dyn DropdownActions<TestEvent>>);

    let trigger = dom.element_in(trigger_parent, "button");
    dom.set_attribute(trigger, "data-ebd-id", &dropdown.trigger_id());
    dom.set_attribute(trigger, "aria-controls", &content_id(unique_id));

    let content = DropdownContent::new(dom.clone(), dropdown, options);
    let element = dom.element_in(content_parent, "div");
    dom.set_attribute(element, "id", content.dropdown_id());
    dom.add_class(&element, CONTENT_CLASS);
    for class in content.animation_class().split_whitespace() {
        dom.add_class(&element, class);
    }

    content.setup(&element);
    content.setup_mutation_observer(&element);
    content.animate_in(&element);

    Mounted {
        recorder,
        trigger,
        element,
        content,
    }
}

fn unmount(mounted: &Mounted) {
    mounted.content.teardown();
    mounted.content.teardown_mutation_observer();
    mounted.content.animate_out(&mounted.element);
}

fn overlay(dom: &TestDom) -> TestNode {
    let overlay = dom.element_in(dom.body_node(), "div");
    dom.set_attribute(overlay, "id", "overlay");
    overlay
}

fn click(dom: &TestDom, target: TestNode) {
    dom.dispatch(ListenerTarget::Document, EventType::Click, &TestEvent::on(target));
}

#[test]
fn test_registrations_match_removals_across_mounts() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let scroller = dom.element_in(dom.body_node(), "section");
    dom.set_style(scroller, |s| s.overflow = "auto".into());

    for options in [
        ContentOptions::default(),
        ContentOptions {
            prevent_scroll: true,
            is_touch_device: Some(true),
            ..Default::default()
        },
    ] {
        let mounted = mount(&dom, "a", scroller, overlay, options);
        assert_eq!(mounted.content.scrollable_ancestors(), vec![scroller]);
        assert!(dom.active_listeners() > 0);
        assert_eq!(dom.active_observers(), 1);

        // A touch sequence adds the lazy touchmove listener
        dom.dispatch(
            ListenerTarget::Document,
            EventType::TouchStart,
            &TestEvent::touch(mounted.element, 0.0, 0.0),
        );

        unmount(&mounted);
        dom.flush_animation_frames();
        dom.flush_animation_frames();

        assert_eq!(dom.active_listeners(), 0);
        assert_eq!(dom.active_observers(), 0);
        assert!(mounted.content.scrollable_ancestors().is_empty());
    }

    let stats = dom.stats();
    assert_eq!(stats.listeners_added, stats.listeners_removed);
    assert_eq!(stats.observers_connected, 2);
    assert_eq!(stats.observers_disconnected, 2);
}

#[test]
fn test_inside_interactions_never_close() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    let option = dom.element_in(mounted.element, "li");
    let icon = dom.element_in(mounted.trigger, "svg");

    for target in [mounted.element, option, mounted.trigger, icon] {
        click(&dom, target);
    }
    assert!(mounted.recorder.closes.borrow().is_empty());
}

#[test]
fn test_nested_dropdown_does_not_close_parent() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let a = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    // B's trigger lives inside A's content, B's content is portaled next to A
    let b = mount(&dom, "b", a.element, overlay, ContentOptions::default());
    let inside_b = dom.element_in(b.element, "li");

    click(&dom, inside_b);
    assert!(a.recorder.closes.borrow().is_empty());
    assert!(b.recorder.closes.borrow().is_empty());

    // Clicking in A is outside of B only
    let inside_a = dom.element_in(a.element, "p");
    click(&dom, inside_a);
    assert!(a.recorder.closes.borrow().is_empty());
    assert_eq!(*b.recorder.closes.borrow(), vec![true]);
}

#[test]
fn test_sibling_dropdown_is_outside() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let a = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    let c = mount(&dom, "c", dom.body_node(), overlay, ContentOptions::default());

    click(&dom, c.element);
    assert_eq!(*a.recorder.closes.borrow(), vec![true]);
    assert!(c.recorder.closes.borrow().is_empty());
}

#[test]
fn test_outside_click_closes_exactly_once() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    let page = dom.element_in(dom.body_node(), "main");

    click(&dom, page);
    assert_eq!(*mounted.recorder.closes.borrow(), vec![true]);

    unmount(&mounted);
    click(&dom, page);
    assert_eq!(mounted.recorder.closes.borrow().len(), 1);
}

#[test]
fn test_touch_scroll_is_not_a_tap() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(
        &dom,
        "a",
        dom.body_node(),
        overlay,
        ContentOptions {
            is_touch_device: Some(true),
            ..Default::default()
        },
    );
    let page = dom.element_in(dom.body_node(), "main");
    let doc = || ListenerTarget::Document;

    dom.dispatch(doc(), EventType::TouchStart, &TestEvent::touch(page, 10.0, 10.0));
    dom.dispatch(doc(), EventType::TouchMove, &TestEvent::touch(page, 10.0, 80.0));
    dom.dispatch(doc(), EventType::TouchEnd, &TestEvent::touch(page, 10.0, 80.0));
    assert!(mounted.recorder.closes.borrow().is_empty());

    // A plain tap afterwards closes
    dom.dispatch(doc(), EventType::TouchStart, &TestEvent::touch(page, 10.0, 10.0));
    dom.dispatch(doc(), EventType::TouchEnd, &TestEvent::touch(page, 10.0, 10.0));
    assert_eq!(*mounted.recorder.closes.borrow(), vec![true]);
}

#[test]
fn test_prevent_scroll_wheel_containment() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(
        &dom,
        "a",
        dom.body_node(),
        overlay,
        ContentOptions {
            prevent_scroll: true,
            ..Default::default()
        },
    );
    dom.set_style(mounted.element, |s| s.overflow_y = "auto".into());
    dom.set_scroll_metrics(
        mounted.element,
        ScrollMetrics {
            scroll_top: 100.0,
            scroll_height: 400.0,
            client_height: 200.0,
            scroll_width: 150.0,
            client_width: 150.0,
            ..Default::default()
        },
    );
    let item = dom.element_in(mounted.element, "li");
    let page = dom.element_in(dom.body_node(), "main");
    let wheel = |event: &TestEvent| {
        dom.dispatch(ListenerTarget::Document, EventType::Wheel, event);
    };

    let outside = TestEvent::wheel(page, 0.0, 5.0);
    wheel(&outside);
    assert!(outside.default_prevented());

    let within = TestEvent::wheel(item, 0.0, 60.0);
    wheel(&within);
    assert!(!within.default_prevented());
    assert_eq!(dom.scroll_metrics(&mounted.element).scroll_top, 100.0);

    let over = TestEvent::wheel(item, 0.0, 250.0);
    wheel(&over);
    assert!(over.default_prevented());
    assert_eq!(dom.scroll_metrics(&mounted.element).scroll_top, 200.0);

    // Scroll handling never repositions
    assert_eq!(mounted.recorder.repositions.get(), 0);
}

#[test]
fn test_ancestor_scroll_repositions() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let scroller = dom.element_in(dom.body_node(), "section");
    dom.set_style(scroller, |s| s.overflow_y = "scroll".into());
    let mounted = mount(&dom, "a", scroller, overlay, ContentOptions::default());

    dom.dispatch(ListenerTarget::Node(scroller), EventType::Scroll, &TestEvent::on(scroller));
    dom.dispatch(ListenerTarget::Window, EventType::Scroll, &TestEvent::without_target());
    assert_eq!(mounted.recorder.repositions.get(), 2);
    assert_eq!(dom.listeners_on(&ListenerTarget::Document, EventType::Wheel), 0);
}

#[test]
fn test_mutation_relevance() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());

    let empty = dom.create_text("");
    dom.append_child(&mounted.element, &empty);
    let comment = dom.create_comment("placeholder");
    dom.append_child(&mounted.element, &comment);
    dom.flush_mutations();
    assert_eq!(mounted.recorder.repositions.get(), 0);

    let row = dom.create_element("li");
    dom.append_child(&mounted.element, &row);
    dom.flush_mutations();
    assert_eq!(mounted.recorder.repositions.get(), 1);

    dom.remove_child(&mounted.element, &row);
    dom.flush_mutations();
    assert_eq!(mounted.recorder.repositions.get(), 2);
}

#[test]
fn test_viewport_changes_reposition_once_each() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());

    dom.dispatch(ListenerTarget::Window, EventType::Resize, &TestEvent::without_target());
    assert_eq!(mounted.recorder.repositions.get(), 1);
    dom.dispatch(
        ListenerTarget::Window,
        EventType::OrientationChange,
        &TestEvent::without_target(),
    );
    assert_eq!(mounted.recorder.repositions.get(), 2);
}

#[test]
fn test_enter_without_running_animation() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    let listeners = dom.stats().listeners_added;

    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitioningIn);
    dom.flush_animation_frames();
    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitionedIn);
    assert_eq!(dom.stats().listeners_added, listeners);
}

#[test]
fn test_enter_waits_for_animationend() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    dom.set_style(mounted.element, |s| s.animation_name = "drop-fade-below".into());

    dom.flush_animation_frames();
    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitioningIn);

    dom.dispatch(
        ListenerTarget::Node(mounted.element),
        EventType::AnimationEnd,
        &TestEvent::on(mounted.element),
    );
    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitionedIn);
}

#[test]
fn test_exit_clone_lifecycle() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    dom.flush_animation_frames();
    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitionedIn);

    unmount(&mounted);
    dom.remove_child(&overlay, &mounted.element);

    let children = dom.children(overlay);
    assert_eq!(children.len(), 1);
    let clone = children[0];
    assert_eq!(
        dom.attribute(&clone, "id").as_deref(),
        Some("basic-dropdown-content-a--clone")
    );
    let classes = dom.classes(clone);
    assert!(classes.iter().any(|c| c == "basic-dropdown--transitioning-out"));
    assert!(!classes.iter().any(|c| c == "basic-dropdown--transitioning-in"));
    assert!(classes.iter().any(|c| c == CONTENT_CLASS));
    assert_eq!(mounted.content.animation_phase(), AnimationPhase::TransitioningIn);

    // Exit animation keeps the clone until animationend
    dom.set_style(clone, |s| s.animation_name = "drop-fade-above".into());
    dom.flush_animation_frames();
    assert_eq!(dom.children(overlay), vec![clone]);

    dom.dispatch(ListenerTarget::Node(clone), EventType::AnimationEnd, &TestEvent::on(clone));
    assert!(dom.children(overlay).is_empty());
    assert_eq!(dom.active_listeners(), 0);
}

#[test]
fn test_exit_without_animation_removes_clone_next_frame() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());

    unmount(&mounted);
    assert_eq!(dom.children(overlay).len(), 2);
    dom.flush_animation_frames();
    assert_eq!(dom.children(overlay), vec![mounted.element]);
}

#[test]
fn test_remount_reuses_entry_path() {
    let dom = TestDom::new();
    let overlay = overlay(&dom);
    let mounted = mount(&dom, "a", dom.body_node(), overlay, ContentOptions::default());
    let phases = Rc::new(RefCell::new(Vec::new()));
    let p = phases.clone();
    mounted
        .content
        .on_animation_phase_change(move |phase| p.borrow_mut().push(phase));

    dom.flush_animation_frames();
    unmount(&mounted);
    dom.flush_animation_frames();

    mounted.content.setup(&mounted.element);
    mounted.content.animate_in(&mounted.element);
    dom.flush_animation_frames();

    assert_eq!(
        *phases.borrow(),
        vec![
            AnimationPhase::TransitionedIn,
            AnimationPhase::TransitioningIn,
            AnimationPhase::TransitionedIn,
        ]
    );
    mounted.content.teardown();
    assert_eq!(dom.active_listeners(), 0);
}
