//! Caller-owned dropdown handle

use std::fmt;
use std::rc::Rc;

/// Actions the content lifecycle requests from the owning dropdown
pub trait DropdownActions<E> {
    /// Close the dropdown. `is_interaction_outside` is true when the request
    /// comes from a click or tap outside the dropdown.
    fn close(&self, event: &E, is_interaction_outside: bool);

    /// Recompute the content position. May be called several times per update.
    fn reposition(&self);
}

/// Identity plus actions of one dropdown instance
pub struct Dropdown<E> {
    pub unique_id: String,
    pub actions: Rc<dyn DropdownActions<E>>,
}

impl<E> Dropdown<E> {
    pub fn new(unique_id: impl Into<String>, actions: Rc<dyn DropdownActions<E>>) -> Self {
        Self {
            unique_id: unique_id.into(),
            actions,
        }
    }

    /// Value of the trigger's `data-ebd-id` attribute
    pub fn trigger_id(&self) -> String {
        format!("{}-trigger", self.unique_id)
    }
}

impl<E> Clone for Dropdown<E> {
    fn clone(&self) -> Self {
        Self {
            unique_id: self.unique_id.clone(),
            actions: Rc::clone(&self.actions),
        }
    }
}

impl<E> PartialEq for Dropdown<E> {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id && Rc::ptr_eq(&self.actions, &other.actions)
    }
}

impl<E> fmt::Debug for Dropdown<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropdown")
            .field("unique_id", &self.unique_id)
            .finish_non_exhaustive()
    }
}
