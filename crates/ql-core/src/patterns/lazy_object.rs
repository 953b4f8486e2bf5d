//! LazyObject pattern (translates `ql/patterns/lazyobject.hpp`).
//!
//! A `LazyObject` is both an [`Observer`] (of its inputs) and an
//! [`Observable`] (to its consumers).  It caches the value produced by
//! [`perform_calculations`](LazyObject::perform_calculations) and recomputes
//! it only after an input changed.
//!
//! The cache uses interior mutability so that a calculation can be triggered
//! through `&self`, matching QuantLib's use of `mutable`.
//!
//! Notification rules:
//! * an upstream update turns a fresh object dirty and is forwarded once;
//!   further updates while dirty are swallowed, which is what makes
//!   notification terminate on cyclic graphs;
//! * while frozen, upstream updates are recorded but neither forwarded nor
//!   allowed to discard the cached value; [`unfreeze`](LazyObject::unfreeze)
//!   then invalidates and forwards a single notification;
//! * a failing calculation leaves the object dirty so the next read retries.

use crate::errors::{Error, Result};
use crate::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Trait for objects that lazily compute and cache their results.
///
/// Implementors embed a [`LazyState`], provide
/// [`perform_calculations`][Self::perform_calculations], and route
/// [`Observer::update`] to [`lazy_update`][Self::lazy_update].
pub trait LazyObject: Observer + Observable {
    /// The value produced by a calculation.
    type Results;

    /// The embedded bookkeeping.
    fn lazy_state(&self) -> &LazyState<Self::Results>;

    /// Perform the actual (expensive) calculation from the current inputs.
    fn perform_calculations(&self) -> Result<Self::Results>;

    /// Ensure results are up to date and return them.
    ///
    /// Runs [`perform_calculations`][Self::perform_calculations] iff the cache
    /// is stale.  A frozen object keeps a fresh cache, so for it this only
    /// computes when nothing valid was cached before freezing.
    fn calculate(&self) -> Result<Rc<Self::Results>> {
        let state = self.lazy_state();
        if !state.calculated.get() {
            // set first: a cyclic read during the calculation sees the old cache
            state.calculated.set(true);
            tracing::debug!(
                observable = ?self.observable().id(),
                "performing lazy calculation"
            );
            match self.perform_calculations() {
                Ok(results) => {
                    state.results.replace(Some(Rc::new(results)));
                }
                Err(e) => {
                    state.calculated.set(false);
                    tracing::debug!(error = %e, "lazy calculation failed");
                    return Err(e);
                }
            }
        }
        state.cached().ok_or_else(|| {
            Error::Runtime("lazy object read during its own first calculation".into())
        })
    }

    /// Recompute unconditionally, regardless of the cache state.
    fn recalculate(&self) -> Result<Rc<Self::Results>> {
        self.lazy_state().calculated.set(false);
        self.calculate()
    }

    /// Reaction to an upstream notification.
    fn lazy_update(&self) -> Result<()> {
        let state = self.lazy_state();
        if state.updating.get() {
            return Ok(());
        }
        if state.frozen.get() {
            state.updated_while_frozen.set(true);
            return Ok(());
        }
        let was_calculated = state.calculated.replace(false);
        if was_calculated || state.always_forward.get() {
            state.updating.set(true);
            let notified = self.notify_observers();
            state.updating.set(false);
            notified
        } else {
            Ok(())
        }
    }

    /// Discard the cache and tell observers, as for an explicit input swap.
    ///
    /// While frozen the event is recorded and replayed by
    /// [`unfreeze`][Self::unfreeze].
    fn invalidate(&self) -> Result<()> {
        let state = self.lazy_state();
        if state.frozen.get() {
            state.updated_while_frozen.set(true);
            return Ok(());
        }
        state.calculated.set(false);
        self.notify_observers()
    }

    /// Hold the current results constant until [`unfreeze`][Self::unfreeze].
    fn freeze(&self) {
        self.lazy_state().frozen.set(true);
    }

    /// Leave frozen mode.
    ///
    /// If any upstream update arrived while frozen, the cache is discarded
    /// and exactly one notification is sent.
    fn unfreeze(&self) -> Result<()> {
        let state = self.lazy_state();
        if !state.frozen.replace(false) {
            return Ok(());
        }
        if state.updated_while_frozen.replace(false) {
            state.calculated.set(false);
            return self.notify_observers();
        }
        Ok(())
    }

    /// Forward every upstream notification, not only the first one after a
    /// calculation.
    fn always_forward_notifications(&self) {
        self.lazy_state().always_forward.set(true);
    }

    /// Forward only the notification that turns a fresh object dirty
    /// (the default).
    fn forward_first_notification_only(&self) {
        self.lazy_state().always_forward.set(false);
    }

    /// Return `true` if the cache is currently valid.
    fn is_calculated(&self) -> bool {
        self.lazy_state().calculated.get()
    }

    /// Return `true` if the object is frozen.
    fn is_frozen(&self) -> bool {
        self.lazy_state().frozen.get()
    }
}

/// Bookkeeping required by [`LazyObject`]: the observer and observable
/// halves, the dirty/frozen flags and the cached results.
///
/// Embed this in your struct and delegate the accessor methods to it.
///
/// # Example
/// ```
/// use std::rc::{Rc, Weak};
/// use ql_core::patterns::lazy_object::{LazyObject, LazyState};
/// use ql_core::patterns::observable::{Observable, ObservableImpl, Observer, ObserverImpl};
///
/// struct Answer {
///     lazy: LazyState<f64>,
/// }
///
/// impl Observable for Answer {
///     fn observable(&self) -> &ObservableImpl { self.lazy.observable() }
/// }
///
/// impl Observer for Answer {
///     fn observer(&self) -> &ObserverImpl { self.lazy.observer() }
///     fn update(&self) -> ql_core::Result<()> { self.lazy_update() }
/// }
///
/// impl LazyObject for Answer {
///     type Results = f64;
///     fn lazy_state(&self) -> &LazyState<f64> { &self.lazy }
///     fn perform_calculations(&self) -> ql_core::Result<f64> { Ok(42.0) }
/// }
///
/// let answer = Rc::new_cyclic(|this: &Weak<Answer>| Answer {
///     lazy: LazyState::new(this.clone()),
/// });
/// assert_eq!(*answer.calculate().unwrap(), 42.0);
/// assert!(answer.is_calculated());
/// ```
pub struct LazyState<R> {
    observable: ObservableImpl,
    observer: ObserverImpl,
    calculated: Cell<bool>,
    frozen: Cell<bool>,
    updated_while_frozen: Cell<bool>,
    updating: Cell<bool>,
    always_forward: Cell<bool>,
    results: RefCell<Option<Rc<R>>>,
}

impl<R> LazyState<R> {
    /// Create the bookkeeping for the lazy object behind `this`; the cache
    /// starts out stale.
    pub fn new(this: Weak<dyn Observer>) -> Self {
        Self {
            observable: ObservableImpl::new(),
            observer: ObserverImpl::new(this),
            calculated: Cell::new(false),
            frozen: Cell::new(false),
            updated_while_frozen: Cell::new(false),
            updating: Cell::new(false),
            always_forward: Cell::new(false),
            results: RefCell::new(None),
        }
    }

    /// The observable half.
    pub fn observable(&self) -> &ObservableImpl {
        &self.observable
    }

    /// The observer half.
    pub fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    /// The last results produced, fresh or not.
    pub fn cached(&self) -> Option<Rc<R>> {
        self.results.borrow().clone()
    }
}

impl<R> fmt::Debug for LazyState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyState")
            .field("calculated", &self.calculated.get())
            .field("frozen", &self.frozen.get())
            .field("observable", &self.observable)
            .field("observer", &self.observer)
            .finish()
    }
}
