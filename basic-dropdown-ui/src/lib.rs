//! basic-dropdown-ui - Browser backend and Dioxus component for dropdowns
//!
//! Implements the DOM seam of `basic-dropdown-core` on `web-sys-x`, binds
//! floating-ui for positioning and wraps it all in a Dioxus component.

pub mod components;
pub mod floating_ui;
pub mod web_dom;

pub use components::*;
pub use web_dom::{WebDom, WebEvent};
