//! basic-dropdown-core - Behaviour of a floating dropdown panel
//!
//! Outside-click detection across nested dropdowns, scroll containment,
//! layout-change watching and enter/exit animations. Everything talks to the
//! page through the [`dom::Dom`] trait, so the logic runs the same against a
//! browser document or the in-memory document used by tests.

pub mod animation;
pub mod config;
pub mod content;
pub mod dom;
pub mod dropdown;
pub mod layout_watch;
pub mod outside;
pub mod run_loop;
pub mod scroll;
pub mod scroll_helpers;
pub mod style;
pub mod touch;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use animation::{AnimationClasses, AnimationPhase};
pub use config::{content_id, ConfigError, ContentOptions, RootEventType, CONTENT_CLASS};
pub use content::DropdownContent;
pub use dom::{Dom, DomEvent, MutationRecord};
pub use dropdown::{Dropdown, DropdownActions};
pub use style::{content_style, ContentPosition};
