//! `Quote` trait, `SimpleQuote`, and the derived quotes.
//!
//! Translates `ql/quote.hpp`, `ql/quotes/simplequote.hpp`,
//! `ql/quotes/derivedquote.hpp` and `ql/quotes/compositequote.hpp`.
//!
//! A quote is the smallest observable leaf of the graph: it is either
//! invalid (no value) or holds a number.  Derived quotes observe the quotes
//! they are computed from and forward their notifications.

use ql_core::errors::{Error, Result};
use ql_core::handle::Handle;
use ql_core::patterns::observable::{
    AsObservable, Observable, ObservableImpl, Observer, ObserverImpl,
};
use ql_core::Real;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A market-observable value.
///
/// Corresponds to `QuantLib::Quote`.
pub trait Quote: Observable + AsObservable + fmt::Debug {
    /// Return the current value.
    ///
    /// Fails with [`Error::NullValue`] if the quote is invalid.
    fn value(&self) -> Result<Real>;

    /// Return `true` if the quote currently holds a value.
    fn is_valid(&self) -> bool;
}

/// The value of the quote a handle points to.
///
/// Fails with [`Error::EmptyHandle`] on an empty handle.
pub fn handle_value(handle: &Handle<dyn Quote>) -> Result<Real> {
    handle.current_link()?.value()
}

/// Closeness test used by [`SimpleQuote`] to decide whether a new value is
/// a change.
pub type Closeness = fn(Real, Real) -> bool;

fn bit_identical(a: Real, b: Real) -> bool {
    a.to_bits() == b.to_bits()
}

// ── SimpleQuote ──────────────────────────────────────────────────────────────

/// A settable market quote.
///
/// Corresponds to `QuantLib::SimpleQuote`.
pub struct SimpleQuote {
    value: Cell<Option<Real>>,
    closeness: Closeness,
    observable: ObservableImpl,
}

impl SimpleQuote {
    /// Create a valid quote.
    pub fn new(value: Real) -> Self {
        Self::with_closeness(Some(value), bit_identical)
    }

    /// Create an invalid quote.
    pub fn empty() -> Self {
        Self::with_closeness(None, bit_identical)
    }

    /// Create a quote that treats values satisfying `closeness` as unchanged.
    ///
    /// ```
    /// use ql_math::comparison::{close_enough, DEFAULT_ULPS};
    /// use ql_quotes::{Quote, SimpleQuote};
    ///
    /// let q = SimpleQuote::with_closeness(Some(0.2), |a, b| close_enough(a, b, DEFAULT_ULPS));
    /// q.set_value(0.2 * (1.0 + f64::EPSILON)).unwrap();
    /// assert_eq!(q.value().unwrap(), 0.2);
    /// ```
    pub fn with_closeness(value: Option<Real>, closeness: Closeness) -> Self {
        Self {
            value: Cell::new(value),
            closeness,
            observable: ObservableImpl::new(),
        }
    }

    /// Set a new value.
    ///
    /// Observers are notified unless the quote was valid and the new value
    /// is close to the old one, in which case nothing changes.  Returns the
    /// difference between new and old value (the new value itself if the
    /// quote was invalid).
    pub fn set_value(&self, value: Real) -> Result<Real> {
        let diff = match self.value.get() {
            Some(old) if (self.closeness)(old, value) => return Ok(0.0),
            Some(old) => value - old,
            None => value,
        };
        self.value.set(Some(value));
        self.notify_observers()?;
        Ok(diff)
    }

    /// Make the quote invalid; notifies iff it held a value.
    pub fn reset(&self) -> Result<()> {
        if self.value.take().is_some() {
            self.notify_observers()?;
        }
        Ok(())
    }
}

impl Observable for SimpleQuote {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Result<Real> {
        self.value.get().ok_or(Error::NullValue)
    }

    fn is_valid(&self) -> bool {
        self.value.get().is_some()
    }
}

impl fmt::Debug for SimpleQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(v) => write!(f, "SimpleQuote({v})"),
            None => write!(f, "SimpleQuote(null)"),
        }
    }
}

// ── DerivedQuote ─────────────────────────────────────────────────────────────

/// A quote computed from another quote by a unary function.
///
/// Corresponds to `QuantLib::DerivedQuote`.
pub struct DerivedQuote<F> {
    element: Handle<dyn Quote>,
    f: F,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl<F: Fn(Real) -> Real + 'static> DerivedQuote<F> {
    /// Create the quote and subscribe it to `element`.
    pub fn new(element: Handle<dyn Quote>, f: F) -> Rc<Self> {
        let quote = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            DerivedQuote {
                element,
                f,
                observable: ObservableImpl::new(),
                observer: ObserverImpl::new(this),
            }
        });
        quote.register_with(quote.element.as_observable());
        quote
    }
}

impl<F> Observable for DerivedQuote<F> {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl<F> Observer for DerivedQuote<F> {
    fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl<F: Fn(Real) -> Real + 'static> Quote for DerivedQuote<F> {
    fn value(&self) -> Result<Real> {
        Ok((self.f)(handle_value(&self.element)?))
    }

    fn is_valid(&self) -> bool {
        self.element.get().map_or(false, |q| q.is_valid())
    }
}

impl<F> fmt::Debug for DerivedQuote<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedQuote")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

// ── CompositeQuote ───────────────────────────────────────────────────────────

/// A quote computed from two quotes by a binary function.
///
/// Corresponds to `QuantLib::CompositeQuote`.
pub struct CompositeQuote<F> {
    element1: Handle<dyn Quote>,
    element2: Handle<dyn Quote>,
    f: F,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl<F: Fn(Real, Real) -> Real + 'static> CompositeQuote<F> {
    /// Create the quote and subscribe it to both elements.
    pub fn new(element1: Handle<dyn Quote>, element2: Handle<dyn Quote>, f: F) -> Rc<Self> {
        let quote = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            CompositeQuote {
                element1,
                element2,
                f,
                observable: ObservableImpl::new(),
                observer: ObserverImpl::new(this),
            }
        });
        quote.register_with(quote.element1.as_observable());
        quote.register_with(quote.element2.as_observable());
        quote
    }
}

impl<F> Observable for CompositeQuote<F> {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl<F> Observer for CompositeQuote<F> {
    fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl<F: Fn(Real, Real) -> Real + 'static> Quote for CompositeQuote<F> {
    fn value(&self) -> Result<Real> {
        let v1 = handle_value(&self.element1)?;
        let v2 = handle_value(&self.element2)?;
        Ok((self.f)(v1, v2))
    }

    fn is_valid(&self) -> bool {
        let valid = |h: &Handle<dyn Quote>| h.get().map_or(false, |q| q.is_valid());
        valid(&self.element1) && valid(&self.element2)
    }
}

impl<F> fmt::Debug for CompositeQuote<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeQuote")
            .field("element1", &self.element1)
            .field("element2", &self.element2)
            .finish_non_exhaustive()
    }
}
