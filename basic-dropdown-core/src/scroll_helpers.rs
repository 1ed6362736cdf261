//! Scroll geometry helpers
//!
//! Pure functions over the [`Dom`] seam: locating scrollable ancestors,
//! normalising wheel deltas, measuring how much scroll is left inside a
//! boundary and applying residual scroll by hand.

use crate::dom::{DeltaMode, Dom, DomEvent, WheelDelta};

/// Lines scrolled per wheel "page"
pub const LINES_PER_PAGE: f64 = 3.0;

/// Line height used when the host cannot measure one
pub const DEFAULT_LINE_HEIGHT: f64 = 16.0;

/// Wheel delta in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollDeltas {
    pub delta_x: f64,
    pub delta_y: f64,
}

/// Scroll budget left in each direction, as signed pixel deltas.
///
/// Negative fields are `<= 0`, positive fields are `>= 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AvailableScroll {
    pub delta_x_negative: f64,
    pub delta_x_positive: f64,
    pub delta_y_negative: f64,
    pub delta_y_positive: f64,
}

/// Nearest ancestor strictly above `node` that scrolls.
///
/// `position: absolute` skips statically positioned ancestors and
/// `position: fixed` resolves to the body, as does running off the top.
pub fn get_scroll_parent<D: Dom>(dom: &D, node: &D::Node) -> Option<D::Node> {
    let style = dom.computed_style(node);
    if style.position == "fixed" {
        return dom.body();
    }
    let exclude_static_parent = style.position == "absolute";

    let mut current = dom.parent_element(node);
    while let Some(parent) = current {
        let style = dom.computed_style(&parent);
        let skipped = exclude_static_parent && style.position == "static";
        if !skipped && style.is_scroll_container() {
            return Some(parent);
        }
        current = dom.parent_element(&parent);
    }
    dom.body()
}

fn is_document_root<D: Dom>(dom: &D, node: &D::Node) -> bool {
    let tag = dom.tag_name(node).to_ascii_uppercase();
    tag == "BODY" || tag == "HTML"
}

/// Scrollable ancestors of `trigger`, nearest first, excluding body and html.
pub fn scrollable_ancestors<D: Dom>(dom: &D, trigger: &D::Node) -> Vec<D::Node> {
    let mut ancestors: Vec<D::Node> = Vec::new();
    let mut next = get_scroll_parent(dom, trigger);
    while let Some(scrollable) = next {
        if is_document_root(dom, &scrollable) || ancestors.contains(&scrollable) {
            break;
        }
        next = get_scroll_parent(dom, &scrollable);
        ancestors.push(scrollable);
    }
    ancestors
}

/// Normalise a wheel event's delta to pixels.
///
/// Line deltas are multiplied by the host's line height, page deltas by
/// [`LINES_PER_PAGE`] lines. Non-wheel events yield zero.
pub fn get_scroll_deltas<D: Dom>(dom: &D, event: &D::Event) -> ScrollDeltas {
    let Some(WheelDelta {
        mut delta_x,
        mut delta_y,
        mode,
    }) = event.wheel_delta()
    else {
        return ScrollDeltas::default();
    };

    if mode != DeltaMode::Pixel {
        if mode == DeltaMode::Page {
            delta_x *= LINES_PER_PAGE;
            delta_y *= LINES_PER_PAGE;
        }
        let line_height = dom.scroll_line_height().unwrap_or(DEFAULT_LINE_HEIGHT);
        delta_x *= line_height;
        delta_y *= line_height;
    }

    ScrollDeltas { delta_x, delta_y }
}

/// Sum of the scroll budget of every element from `target` up to and
/// including `boundary`.
pub fn get_available_scroll<D: Dom>(
    dom: &D,
    target: &D::Node,
    boundary: &D::Node,
) -> AvailableScroll {
    let mut available = AvailableScroll::default();
    let mut current = Some(target.clone());
    while let Some(element) = current {
        if !dom.contains(boundary, &element) {
            break;
        }
        let metrics = dom.scroll_metrics(&element);
        available.delta_x_negative -= metrics.scroll_left;
        available.delta_x_positive += metrics.scroll_left_max() - metrics.scroll_left;
        available.delta_y_negative -= metrics.scroll_top;
        available.delta_y_positive += metrics.scroll_top_max() - metrics.scroll_top;
        current = dom.parent_element(&element);
    }
    available
}

/// Move `position` by `delta` within `[0, max]`, returning the new position
/// and the part of the delta that did not fit.
fn consume(delta: f64, position: f64, max: f64) -> (f64, f64) {
    let negative = -position;
    let positive = max - position;
    if delta < 0.0 && delta < negative {
        (0.0, delta - negative)
    } else if delta > 0.0 && delta > positive {
        (max, delta - positive)
    } else {
        (position + delta, 0.0)
    }
}

struct ScrollAssignment<N> {
    element: N,
    scroll_left: f64,
    scroll_top: f64,
}

fn calculate_scroll_distribution<D: Dom>(
    dom: &D,
    mut delta_x: f64,
    mut delta_y: f64,
    target: &D::Node,
    boundary: &D::Node,
) -> Vec<ScrollAssignment<D::Node>> {
    let mut assignments = Vec::new();
    let mut current = Some(target.clone());
    while let Some(element) = current {
        let metrics = dom.scroll_metrics(&element);
        let style = dom.computed_style(&element);
        let mut scroll_left = metrics.scroll_left;
        let mut scroll_top = metrics.scroll_top;

        if style.scrolls_x() {
            (scroll_left, delta_x) =
                consume(delta_x, metrics.scroll_left, metrics.scroll_left_max());
        }
        if style.scrolls_y() {
            (scroll_top, delta_y) = consume(delta_y, metrics.scroll_top, metrics.scroll_top_max());
        }

        let done = element == *boundary || (delta_x == 0.0 && delta_y == 0.0);
        current = if done { None } else { dom.parent_element(&element) };
        assignments.push(ScrollAssignment {
            element,
            scroll_left,
            scroll_top,
        });
    }
    assignments
}

/// Apply `(delta_x, delta_y)` to the scrollable elements between `target` and
/// `boundary`, innermost first, carrying overflow outwards.
pub fn distribute_scroll<D: Dom>(
    dom: &D,
    delta_x: f64,
    delta_y: f64,
    target: &D::Node,
    boundary: &D::Node,
) {
    for assignment in calculate_scroll_distribution(dom, delta_x, delta_y, target, boundary) {
        dom.set_scroll_position(
            &assignment.element,
            assignment.scroll_left,
            assignment.scroll_top,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ScrollMetrics;
    use crate::testing::{TestDom, TestEvent};

    fn scroll_box(dom: &TestDom, node: crate::testing::TestNode, top: f64, height: f64) {
        dom.set_scroll_metrics(
            node,
            ScrollMetrics {
                scroll_top: top,
                scroll_height: height,
                client_height: 100.0,
                scroll_width: 100.0,
                client_width: 100.0,
                ..Default::default()
            },
        );
        dom.set_style(node, |s| s.overflow_y = "auto".into());
    }

    #[test]
    fn test_scroll_parent_skips_non_scrolling() {
        let dom = TestDom::new();
        let outer = dom.element_in(dom.body_node(), "div");
        dom.set_style(outer, |s| s.overflow = "scroll".into());
        let middle = dom.element_in(outer, "div");
        let trigger = dom.element_in(middle, "button");

        assert_eq!(get_scroll_parent(&dom, &trigger), Some(outer));
        assert_eq!(get_scroll_parent(&dom, &outer), Some(dom.body_node()));
    }

    #[test]
    fn test_scroll_parent_fixed_is_body() {
        let dom = TestDom::new();
        let outer = dom.element_in(dom.body_node(), "div");
        dom.set_style(outer, |s| s.overflow = "auto".into());
        let fixed = dom.element_in(outer, "div");
        dom.set_style(fixed, |s| s.position = "fixed".into());
        assert_eq!(get_scroll_parent(&dom, &fixed), Some(dom.body_node()));
    }

    #[test]
    fn test_scroll_parent_absolute_skips_static() {
        let dom = TestDom::new();
        let positioned = dom.element_in(dom.body_node(), "div");
        dom.set_style(positioned, |s| {
            s.overflow = "auto".into();
            s.position = "relative".into();
        });
        let static_scroller = dom.element_in(positioned, "div");
        dom.set_style(static_scroller, |s| s.overflow = "auto".into());
        let absolute = dom.element_in(static_scroller, "div");
        dom.set_style(absolute, |s| s.position = "absolute".into());

        assert_eq!(get_scroll_parent(&dom, &absolute), Some(positioned));
    }

    #[test]
    fn test_scrollable_ancestors_nearest_first() {
        let dom = TestDom::new();
        let outer = dom.element_in(dom.body_node(), "section");
        dom.set_style(outer, |s| s.overflow_y = "auto".into());
        let plain = dom.element_in(outer, "div");
        let inner = dom.element_in(plain, "div");
        dom.set_style(inner, |s| s.overflow_x = "scroll".into());
        let trigger = dom.element_in(inner, "button");

        assert_eq!(scrollable_ancestors(&dom, &trigger), vec![inner, outer]);
    }

    #[test]
    fn test_scrollable_ancestors_empty_at_top_level() {
        let dom = TestDom::new();
        let trigger = dom.element_in(dom.body_node(), "button");
        assert!(scrollable_ancestors(&dom, &trigger).is_empty());
    }

    #[test]
    fn test_scroll_deltas_by_mode() {
        let dom = TestDom::new();
        let target = dom.element_in(dom.body_node(), "div");

        let pixel = TestEvent::wheel(target, 3.0, -7.0);
        assert_eq!(
            get_scroll_deltas(&dom, &pixel),
            ScrollDeltas {
                delta_x: 3.0,
                delta_y: -7.0
            }
        );

        let mut line = TestEvent::wheel(target, 0.0, 2.0);
        if let Some(wheel) = line.wheel.as_mut() {
            wheel.mode = DeltaMode::Line;
        }
        assert_eq!(get_scroll_deltas(&dom, &line).delta_y, 2.0 * DEFAULT_LINE_HEIGHT);

        dom.set_line_height(Some(20.0));
        let mut page = TestEvent::wheel(target, 0.0, 1.0);
        if let Some(wheel) = page.wheel.as_mut() {
            wheel.mode = DeltaMode::Page;
        }
        assert_eq!(get_scroll_deltas(&dom, &page).delta_y, LINES_PER_PAGE * 20.0);

        assert_eq!(get_scroll_deltas(&dom, &TestEvent::on(target)), ScrollDeltas::default());
    }

    #[test]
    fn test_available_scroll_sums_up_to_boundary() {
        let dom = TestDom::new();
        let outside = dom.element_in(dom.body_node(), "div");
        scroll_box(&dom, outside, 10.0, 1000.0);
        let boundary = dom.element_in(outside, "div");
        scroll_box(&dom, boundary, 20.0, 200.0);
        let list = dom.element_in(boundary, "ul");
        scroll_box(&dom, list, 30.0, 150.0);

        let available = get_available_scroll(&dom, &list, &boundary);
        assert_eq!(available.delta_y_negative, -50.0);
        // boundary: 100 - 20, list: 50 - 30
        assert_eq!(available.delta_y_positive, 100.0);
        assert_eq!(available.delta_x_negative, 0.0);
        assert_eq!(available.delta_x_positive, 0.0);
    }

    #[test]
    fn test_distribute_scroll_carries_overflow_outwards() {
        let dom = TestDom::new();
        let boundary = dom.element_in(dom.body_node(), "div");
        scroll_box(&dom, boundary, 0.0, 300.0);
        let list = dom.element_in(boundary, "ul");
        scroll_box(&dom, list, 40.0, 150.0);

        distribute_scroll(&dom, 0.0, 30.0, &list, &boundary);

        // list had 10px left, the remaining 20px land on the boundary
        assert_eq!(dom.scroll_metrics(&list).scroll_top, 50.0);
        assert_eq!(dom.scroll_metrics(&boundary).scroll_top, 20.0);
    }

    #[test]
    fn test_distribute_scroll_stops_when_consumed() {
        let dom = TestDom::new();
        let boundary = dom.element_in(dom.body_node(), "div");
        scroll_box(&dom, boundary, 5.0, 300.0);
        let list = dom.element_in(boundary, "ul");
        scroll_box(&dom, list, 0.0, 150.0);

        distribute_scroll(&dom, 0.0, 25.0, &list, &boundary);

        assert_eq!(dom.scroll_metrics(&list).scroll_top, 25.0);
        assert_eq!(dom.scroll_metrics(&boundary).scroll_top, 5.0);
    }

    #[test]
    fn test_distribute_scroll_keeps_non_scrolling_axis() {
        let dom = TestDom::new();
        let boundary = dom.element_in(dom.body_node(), "div");
        dom.set_scroll_metrics(
            boundary,
            ScrollMetrics {
                scroll_left: 12.0,
                scroll_width: 200.0,
                client_width: 100.0,
                scroll_height: 300.0,
                client_height: 100.0,
                ..Default::default()
            },
        );
        dom.set_style(boundary, |s| s.overflow_y = "auto".into());

        distribute_scroll(&dom, 40.0, 10.0, &boundary, &boundary);

        let metrics = dom.scroll_metrics(&boundary);
        assert_eq!(metrics.scroll_left, 12.0);
        assert_eq!(metrics.scroll_top, 10.0);
    }
}
