//! Layout-change watching
//!
//! Content mutations and viewport changes both move things around on screen,
//! so both end in a reposition request. Mutations that only add or remove
//! comments or empty text nodes are ignored.

use std::rc::Rc;

use tracing::trace;

use crate::dom::{
    Dom, EventType, ListenerOptions, ListenerTarget, MutatedNode, MutationRecord, NodeKind,
};
use crate::dropdown::Dropdown;
use crate::run_loop;

/// Caller-supplied override deciding whether a relevant mutation batch
/// should reposition the dropdown
pub type RepositionFilter<D> = Rc<
    dyn Fn(&[MutationRecord<<D as Dom>::Node>], &Dropdown<<D as Dom>::Event>) -> bool,
>;

fn is_relevant(node: &MutatedNode) -> bool {
    match node.kind {
        NodeKind::Comment => false,
        NodeKind::Text => !node.value.as_deref().unwrap_or("").is_empty(),
        NodeKind::Element | NodeKind::Other => true,
    }
}

/// Whether any node in `nodes` can affect layout
pub fn contains_relevant_mutation(nodes: &[MutatedNode]) -> bool {
    nodes.iter().any(is_relevant)
}

/// Whether any record adds or removes a layout-relevant node
pub fn mutations_are_relevant<N>(records: &[MutationRecord<N>]) -> bool {
    records.iter().any(|record| {
        contains_relevant_mutation(&record.added_nodes)
            || contains_relevant_mutation(&record.removed_nodes)
    })
}

/// Observe `content` and request a reposition after relevant mutations.
///
/// When `filter` is set it gets the final say on batches that are relevant.
pub fn observe_content_mutations<D: Dom>(
    dom: &D,
    content: &D::Node,
    dropdown: Dropdown<D::Event>,
    filter: Option<RepositionFilter<D>>,
    reposition: Rc<dyn Fn()>,
) -> Option<D::Observer> {
    dom.observe_mutations(
        content,
        Rc::new(move |records: &[MutationRecord<D::Node>]| {
            let mut should_reposition = mutations_are_relevant(records);
            if should_reposition {
                if let Some(filter) = &filter {
                    should_reposition = filter(records, &dropdown);
                }
            }
            trace!(
                "{} mutation records, reposition: {should_reposition}",
                records.len()
            );
            if should_reposition {
                run_loop::run(|| reposition());
            }
        }),
    )
}

/// Window `resize` and `orientationchange` listeners
pub struct ViewportWatch<D: Dom> {
    _resize: D::Listener,
    _orientation_change: D::Listener,
}

impl<D: Dom> ViewportWatch<D> {
    pub fn attach(dom: &D, reposition: Rc<dyn Fn()>) -> Self {
        let listen = |event: EventType| {
            let reposition = Rc::clone(&reposition);
            dom.add_event_listener(
                ListenerTarget::Window,
                event,
                ListenerOptions::BUBBLE,
                Rc::new(move |_: &D::Event| run_loop::run(|| reposition())),
            )
        };
        Self {
            _resize: listen(EventType::Resize),
            _orientation_change: listen(EventType::OrientationChange),
        }
    }
}
