//! Dropdown components

pub mod content;
pub mod floating_dropdown;

pub use content::{BasicDropdownContent, ShouldReposition};
pub use floating_dropdown::{use_floating_dropdown, FloatingDropdownHandle, FloatingReposition};
