//! `ObservableValue<T>` (translates `ql/utilities/observablevalue.hpp`).
//!
//! A value cell that is itself an [`Observable`]: every assignment notifies
//! the registered observers.  The global evaluation date is one of these.

use crate::errors::Result;
use crate::patterns::observable::{Observable, ObservableImpl};
use std::cell::RefCell;
use std::fmt;

/// A value that notifies its observers when it is assigned.
pub struct ObservableValue<T> {
    value: RefCell<T>,
    observable: ObservableImpl,
}

impl<T: Clone> ObservableValue<T> {
    /// Create a new cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            observable: ObservableImpl::new(),
        }
    }

    /// Return a clone of the current value without notifying anybody.
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    /// Assign a new value and notify all registered observers.
    pub fn set(&self, value: T) -> Result<()> {
        *self.value.borrow_mut() = value;
        self.observable.notify()
    }
}

impl<T: Clone + PartialEq> ObservableValue<T> {
    /// Assign `value` and notify only if it differs from the current one.
    ///
    /// Returns whether a notification was sent.
    pub fn set_if_changed(&self, value: T) -> Result<bool> {
        if *self.value.borrow() == value {
            return Ok(false);
        }
        self.set(value)?;
        Ok(true)
    }
}

impl<T> Observable for ObservableValue<T> {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &*self.value.borrow())
            .field("observers", &self.observable.len())
            .finish()
    }
}
