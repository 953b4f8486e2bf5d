//! `Handle<T>`: a shared, observable indirection to an observable subject
//! (translates `ql/handle.hpp`).
//!
//! All copies of a handle share one *link*.  The link observes the current
//! subject and re-notifies its own observers, so whoever observes a handle
//! sees every change of whatever the handle currently points to.  A
//! [`RelinkableHandle`] can rebind the link; rebinding moves the
//! subscription to the new subject and is itself a notification.
//!
//! | C++ | Rust |
//! |-----|------|
//! | `Handle<T>` | `Handle<T>` (`Rc` to a shared link, optionally empty) |
//! | `RelinkableHandle<T>` | `RelinkableHandle<T>` (derefs to `Handle<T>`) |
//! | `Handle::currentLink()` | [`Handle::current_link`] |

use crate::errors::{Error, Result};
use crate::patterns::observable::{AsObservable, Observable, ObservableImpl, Observer, ObserverImpl};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

struct Link<T: ?Sized> {
    current: RefCell<Option<Rc<T>>>,
    is_observer: Cell<bool>,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl<T: ?Sized + AsObservable + 'static> Link<T> {
    fn new(subject: Option<Rc<T>>, register_as_observer: bool) -> Rc<Self> {
        let link = Rc::new_cyclic(|this: &Weak<Self>| {
            let this: Weak<dyn Observer> = this.clone();
            Link {
                current: RefCell::new(None),
                is_observer: Cell::new(false),
                observable: ObservableImpl::new(),
                observer: ObserverImpl::new(this),
            }
        });
        link.bind(subject, register_as_observer);
        link
    }

    fn bind(&self, subject: Option<Rc<T>>, register_as_observer: bool) {
        let old = self.current.replace(subject.clone());
        if let Some(old) = old {
            if self.is_observer.get() {
                let old = old.as_observable();
                self.observer.unregister_with(&*old);
            }
        }
        if let Some(new) = subject {
            if register_as_observer {
                self.observer.register_with(new.as_observable());
            }
        }
        self.is_observer.set(register_as_observer);
    }

    fn link_to(
        &self,
        subject: Option<Rc<T>>,
        register_as_observer: bool,
        force_notify: bool,
    ) -> Result<()> {
        let same = same_subject(self.current.borrow().as_ref(), subject.as_ref());
        let changed = !same || register_as_observer != self.is_observer.get();
        if changed {
            self.bind(subject, register_as_observer);
        }
        if changed || force_notify {
            tracing::debug!(
                link = ?self.observable.id(),
                linked = !self.current.borrow().is_none(),
                "handle relinked"
            );
            self.notify_observers()?;
        }
        Ok(())
    }
}

fn same_subject<T: ?Sized>(a: Option<&Rc<T>>, b: Option<&Rc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ()),
        _ => false,
    }
}

impl<T: ?Sized> Observable for Link<T> {
    fn observable(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl<T: ?Sized> Observer for Link<T> {
    fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

/// A shared, possibly empty reference to an observable subject.
///
/// Cloning a handle shares the underlying link: a relink performed through
/// any [`RelinkableHandle`] built on the same link is seen by every clone.
pub struct Handle<T: ?Sized> {
    link: Rc<Link<T>>,
}

impl<T: ?Sized + AsObservable + 'static> Handle<T> {
    /// Create a handle to `subject`, forwarding its notifications.
    pub fn new(subject: Rc<T>) -> Self {
        Self::with_registration(subject, true)
    }

    /// Create a handle to `subject`.
    ///
    /// With `register_as_observer == false` the handle does not forward the
    /// subject's notifications (relinks are still notified).
    pub fn with_registration(subject: Rc<T>, register_as_observer: bool) -> Self {
        Self {
            link: Link::new(Some(subject), register_as_observer),
        }
    }

    /// Create an empty handle.
    pub fn null() -> Self {
        Self {
            link: Link::new(None, true),
        }
    }

    /// Return `true` if no subject is bound.
    pub fn is_empty(&self) -> bool {
        self.link.current.borrow().is_none()
    }

    /// The subject currently bound.
    ///
    /// Fails with [`Error::EmptyHandle`] if the handle is empty.
    pub fn current_link(&self) -> Result<Rc<T>> {
        self.get().ok_or(Error::EmptyHandle)
    }

    /// The subject currently bound, if any.
    pub fn get(&self) -> Option<Rc<T>> {
        self.link.current.borrow().clone()
    }

    /// The handle as a notification source, for observers of the handle.
    pub fn as_observable(&self) -> Rc<dyn Observable> {
        self.link.clone()
    }

    /// Whether `self` and `other` share the same link.
    pub fn shares_link_with(&self, other: &Handle<T>) -> bool {
        Rc::ptr_eq(&self.link, &other.link)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            link: Rc::clone(&self.link),
        }
    }
}

impl<T: ?Sized + AsObservable + 'static> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.link.current.borrow() {
            Some(v) => write!(f, "Handle({:?})", v),
            None => write!(f, "Handle(null)"),
        }
    }
}

/// A [`Handle`] whose subject can be rebound at runtime.
#[derive(Clone)]
pub struct RelinkableHandle<T: ?Sized> {
    handle: Handle<T>,
}

impl<T: ?Sized + AsObservable + 'static> RelinkableHandle<T> {
    /// Create a relinkable handle bound to `subject`.
    pub fn new(subject: Rc<T>) -> Self {
        Self {
            handle: Handle::new(subject),
        }
    }

    /// Create an empty relinkable handle.
    pub fn null() -> Self {
        Self {
            handle: Handle::null(),
        }
    }

    /// Rebind to `subject`, forwarding its notifications from now on.
    ///
    /// Emits one notification unless `subject` is already bound.
    pub fn link_to(&self, subject: Rc<T>) -> Result<()> {
        self.link_to_with(Some(subject), true, false)
    }

    /// Rebind with explicit options.
    ///
    /// The old subject's subscription is dropped, the new one's is taken
    /// (if `register_as_observer`), and one notification is emitted iff the
    /// binding changed or `force_notify` is set.  Relinking to the same
    /// subject keeps the existing subscription.
    pub fn link_to_with(
        &self,
        subject: Option<Rc<T>>,
        register_as_observer: bool,
        force_notify: bool,
    ) -> Result<()> {
        self.handle
            .link
            .link_to(subject, register_as_observer, force_notify)
    }

    /// Unbind the handle; notifies iff a subject was bound.
    pub fn reset(&self) -> Result<()> {
        self.link_to_with(None, true, false)
    }

    /// A plain handle sharing this handle's link.
    pub fn handle(&self) -> Handle<T> {
        self.handle.clone()
    }
}

impl<T: ?Sized + AsObservable + 'static> Default for RelinkableHandle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Deref for RelinkableHandle<T> {
    type Target = Handle<T>;

    fn deref(&self) -> &Handle<T> {
        &self.handle
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for RelinkableHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relinkable{:?}", self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::observable_value::ObservableValue;

    type Value = ObservableValue<f64>;

    struct Counter {
        observer: ObserverImpl,
        count: Cell<u32>,
    }

    impl Observer for Counter {
        fn observer(&self) -> &ObserverImpl {
            &self.observer
        }

        fn update(&self) -> Result<()> {
            self.count.set(self.count.get() + 1);
            Ok(())
        }
    }

    fn watch<T: ?Sized + AsObservable + 'static>(h: &Handle<T>) -> Rc<Counter> {
        let c = Rc::new_cyclic(|this: &Weak<Counter>| Counter {
            observer: ObserverImpl::new(this.clone()),
            count: Cell::new(0),
        });
        c.register_with(h.as_observable());
        c
    }

    #[test]
    fn empty_handle() {
        let h: Handle<Value> = Handle::null();
        assert!(h.is_empty());
        assert_eq!(h.current_link().unwrap_err(), Error::EmptyHandle);
        assert!(h.get().is_none());
    }

    #[test]
    fn handle_forwards_subject_notifications() {
        let v = Rc::new(Value::new(1.0));
        let h = Handle::new(v.clone());
        let c = watch(&h);
        v.set(2.0).unwrap();
        assert_eq!(c.count.get(), 1);
        assert_eq!(h.current_link().unwrap().value(), 2.0);
    }

    #[test]
    fn unregistered_handle_does_not_forward() {
        let v = Rc::new(Value::new(1.0));
        let h = Handle::with_registration(v.clone(), false);
        let c = watch(&h);
        v.set(2.0).unwrap();
        assert_eq!(c.count.get(), 0);
        assert_eq!(v.observer_count(), 0);
    }

    #[test]
    fn relink_moves_subscription_and_notifies_once() {
        let a = Rc::new(Value::new(1.0));
        let b = Rc::new(Value::new(2.0));
        let rh = RelinkableHandle::new(a.clone());
        let c = watch(&rh);

        rh.link_to(b.clone()).unwrap();
        assert_eq!(c.count.get(), 1);
        assert_eq!(a.observer_count(), 0);
        assert_eq!(b.observer_count(), 1);

        // the old subject no longer reaches observers of the handle
        a.set(10.0).unwrap();
        assert_eq!(c.count.get(), 1);
        b.set(20.0).unwrap();
        assert_eq!(c.count.get(), 2);
    }

    #[test]
    fn relink_to_same_subject_is_silent_unless_forced() {
        let a = Rc::new(Value::new(1.0));
        let rh = RelinkableHandle::new(a.clone());
        let c = watch(&rh);

        rh.link_to(a.clone()).unwrap();
        assert_eq!(c.count.get(), 0);

        rh.link_to_with(Some(a.clone()), true, true).unwrap();
        assert_eq!(c.count.get(), 1);
        assert_eq!(a.observer_count(), 1);
    }

    #[test]
    fn copies_share_the_link() {
        let a = Rc::new(Value::new(1.0));
        let b = Rc::new(Value::new(2.0));
        let rh = RelinkableHandle::new(a);
        let h = rh.handle();
        let h2 = h.clone();
        assert!(h.shares_link_with(&h2));

        rh.link_to(b).unwrap();
        assert_eq!(h.current_link().unwrap().value(), 2.0);
        assert_eq!(h2.current_link().unwrap().value(), 2.0);
    }

    #[test]
    fn reset_unlinks() {
        let a = Rc::new(Value::new(1.0));
        let rh = RelinkableHandle::new(a.clone());
        let c = watch(&rh);
        rh.reset().unwrap();
        assert!(rh.is_empty());
        assert_eq!(c.count.get(), 1);
        assert_eq!(a.observer_count(), 0);
        rh.reset().unwrap();
        assert_eq!(c.count.get(), 1);
    }

    #[test]
    fn handles_to_trait_objects() {
        let v: Rc<dyn Observable> = Rc::new(Value::new(1.0));
        let h: Handle<dyn Observable> = Handle::new(v);
        assert!(!h.is_empty());
    }
}
