//! Observer / Observable pattern (translates `ql/patterns/observable.hpp`).
//!
//! QuantLib's core notification mechanism:
//! * An **Observable** notifies registered **Observer**s whenever it changes
//!   state.  The notification carries no payload.
//! * Observers react in [`Observer::update`].
//!
//! The relation is kept in two side tables keyed by stable identities:
//! the observer owns shared references (`Rc`) to the observables it listens
//! to, the observable keeps only weak back-references to its observers.
//! Both tables are ordered maps, so a notification pass visits observers in
//! registration order.
//!
//! The graph is single-threaded: registration, notification and
//! recalculation all happen through `&self` using `Cell`/`RefCell`.

use crate::errors::Result;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stable identity of an observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservableId(u64);

/// Stable identity of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

// ── Traits ───────────────────────────────────────────────────────────────────

/// An object that can notify interested parties when it changes.
///
/// Implementors embed an [`ObservableImpl`] and return it from
/// [`observable`](Observable::observable); the provided methods do the rest.
pub trait Observable {
    /// The embedded observer list.
    fn observable(&self) -> &ObservableImpl;

    /// Notify all currently registered observers that this object changed.
    ///
    /// The first error raised by an observer aborts the remaining deliveries
    /// of this pass and is returned to the caller.
    fn notify_observers(&self) -> Result<()> {
        self.observable().notify()
    }

    /// Number of observers currently registered.
    fn observer_count(&self) -> usize {
        self.observable().len()
    }

    /// Whether `observer` is registered with this observable.
    fn has_observer(&self, observer: &dyn Observer) -> bool {
        self.observable().contains(observer.observer().id())
    }
}

/// An object that reacts to changes in [`Observable`]s it subscribed to.
///
/// Implementors embed an [`ObserverImpl`], which must be created with a weak
/// reference to the enclosing `Rc` (see [`Rc::new_cyclic`]).
pub trait Observer {
    /// The embedded subscription list.
    fn observer(&self) -> &ObserverImpl;

    /// Called by every observable this observer is registered with when that
    /// observable changes state.
    fn update(&self) -> Result<()>;

    /// Subscribe to `observable`.  Returns `false` if already subscribed.
    fn register_with(&self, observable: Rc<dyn Observable>) -> bool {
        self.observer().register_with(observable)
    }

    /// Drop the subscription to `observable`.  Returns `false` if there was
    /// none.
    fn unregister_with(&self, observable: &dyn Observable) -> bool {
        self.observer().unregister_with(observable)
    }

    /// Drop every subscription.
    fn unregister_with_all(&self) {
        self.observer().unregister_with_all();
    }

    /// Whether this observer is subscribed to `observable`.
    fn is_registered_with(&self, observable: &dyn Observable) -> bool {
        self.observer().is_registered_with(observable)
    }
}

/// Conversion of a shared observable into the type-erased form stored in
/// subscription tables.
///
/// Blanket-implemented for every sized [`Observable`]; traits such as
/// `Quote` or `YieldTermStructure` list it as a supertrait so that
/// `Rc<dyn Quote>` can be subscribed to as well.
pub trait AsObservable {
    /// Erase the concrete type.
    fn as_observable(self: Rc<Self>) -> Rc<dyn Observable>;
}

impl<T: Observable + 'static> AsObservable for T {
    fn as_observable(self: Rc<Self>) -> Rc<dyn Observable> {
        self
    }
}

impl AsObservable for dyn Observable {
    fn as_observable(self: Rc<Self>) -> Rc<dyn Observable> {
        self
    }
}

// ── ObservableImpl ───────────────────────────────────────────────────────────

/// The observer list embedded in every observable (equivalent to
/// `Observable`'s private state in QuantLib).
pub struct ObservableImpl {
    id: ObservableId,
    observers: RefCell<BTreeMap<ObserverId, Weak<dyn Observer>>>,
}

impl Default for ObservableImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableImpl {
    /// Create a new, empty observer list with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: ObservableId(next_id()),
            observers: RefCell::new(BTreeMap::new()),
        }
    }

    /// Identity of the owning observable.
    pub fn id(&self) -> ObservableId {
        self.id
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.borrow().is_empty()
    }

    /// Whether the observer with identity `id` is registered.
    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers.borrow().contains_key(&id)
    }

    fn attach(&self, id: ObserverId, observer: Weak<dyn Observer>) {
        self.observers.borrow_mut().entry(id).or_insert(observer);
    }

    fn detach(&self, id: ObserverId) {
        self.observers.borrow_mut().remove(&id);
    }

    /// Deliver one update to every observer registered at the time of the
    /// call.
    ///
    /// The pass iterates over a snapshot: observers added by a callback do
    /// not receive this notification, observers removed by a callback before
    /// their turn are skipped, and observers that died are pruned.
    pub fn notify(&self) -> Result<()> {
        let snapshot: Vec<(ObserverId, Weak<dyn Observer>)> = self
            .observers
            .borrow()
            .iter()
            .map(|(id, o)| (*id, o.clone()))
            .collect();
        if snapshot.is_empty() {
            return Ok(());
        }
        if !ObservableSettings::updates_enabled() {
            ObservableSettings::defer(&snapshot);
            return Ok(());
        }
        tracing::trace!(
            observable = self.id.0,
            observers = snapshot.len(),
            "notifying observers"
        );
        for (id, weak) in snapshot {
            if !self.contains(id) {
                continue;
            }
            match weak.upgrade() {
                Some(observer) => observer.update()?,
                None => self.detach(id),
            }
        }
        Ok(())
    }
}

impl Drop for ObservableImpl {
    fn drop(&mut self) {
        // Tell surviving observers to forget this source; no notification.
        let observers = std::mem::take(self.observers.get_mut());
        for observer in observers.values().filter_map(Weak::upgrade) {
            observer.observer().forget(self.id);
        }
    }
}

impl fmt::Debug for ObservableImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableImpl")
            .field("id", &self.id.0)
            .field("observers", &self.len())
            .finish()
    }
}

// ── ObserverImpl ─────────────────────────────────────────────────────────────

/// The subscription list embedded in every observer.
///
/// Holds shared references to the observables it listens to, so an observer
/// keeps its sources alive.  Dropping it unregisters from all of them.
pub struct ObserverImpl {
    id: ObserverId,
    this: Weak<dyn Observer>,
    observables: RefCell<BTreeMap<ObservableId, Rc<dyn Observable>>>,
}

impl ObserverImpl {
    /// Create an empty subscription list for the observer behind `this`.
    ///
    /// ```
    /// use std::rc::{Rc, Weak};
    /// use ql_core::patterns::observable::{Observer, ObserverImpl};
    ///
    /// struct Sink { observer: ObserverImpl }
    ///
    /// impl Observer for Sink {
    ///     fn observer(&self) -> &ObserverImpl { &self.observer }
    ///     fn update(&self) -> ql_core::Result<()> { Ok(()) }
    /// }
    ///
    /// let sink = Rc::new_cyclic(|this: &Weak<Sink>| Sink {
    ///     observer: ObserverImpl::new(this.clone()),
    /// });
    /// assert_eq!(sink.observer().len(), 0);
    /// ```
    pub fn new(this: Weak<dyn Observer>) -> Self {
        Self {
            id: ObserverId(next_id()),
            this,
            observables: RefCell::new(BTreeMap::new()),
        }
    }

    /// Identity of the owning observer.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Number of observables subscribed to.
    pub fn len(&self) -> usize {
        self.observables.borrow().len()
    }

    /// Whether there is no subscription.
    pub fn is_empty(&self) -> bool {
        self.observables.borrow().is_empty()
    }

    /// Subscribe to `observable`; idempotent.
    pub fn register_with(&self, observable: Rc<dyn Observable>) -> bool {
        let key = observable.observable().id();
        {
            let mut observables = self.observables.borrow_mut();
            if observables.contains_key(&key) {
                return false;
            }
            observables.insert(key, Rc::clone(&observable));
        }
        observable.observable().attach(self.id, self.this.clone());
        true
    }

    /// Drop the subscription to `observable`; idempotent.
    pub fn unregister_with(&self, observable: &dyn Observable) -> bool {
        let key = observable.observable().id();
        let removed = self.observables.borrow_mut().remove(&key);
        match removed {
            Some(source) => {
                source.observable().detach(self.id);
                true
            }
            None => false,
        }
    }

    /// Drop every subscription.
    pub fn unregister_with_all(&self) {
        let observables = std::mem::take(&mut *self.observables.borrow_mut());
        for source in observables.values() {
            source.observable().detach(self.id);
        }
    }

    /// Whether this observer is subscribed to `observable`.
    pub fn is_registered_with(&self, observable: &dyn Observable) -> bool {
        self.observables
            .borrow()
            .contains_key(&observable.observable().id())
    }

    fn forget(&self, id: ObservableId) {
        let removed = self.observables.borrow_mut().remove(&id);
        drop(removed);
    }
}

impl Drop for ObserverImpl {
    fn drop(&mut self) {
        self.unregister_with_all();
    }
}

impl fmt::Debug for ObserverImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverImpl")
            .field("id", &self.id.0)
            .field("observables", &self.len())
            .finish()
    }
}

// ── ObservableSettings ───────────────────────────────────────────────────────

struct UpdateState {
    enabled: Cell<bool>,
    deferred: Cell<bool>,
    pending: RefCell<BTreeMap<ObserverId, Weak<dyn Observer>>>,
}

thread_local! {
    static UPDATES: UpdateState = UpdateState {
        enabled: Cell::new(true),
        deferred: Cell::new(false),
        pending: RefCell::new(BTreeMap::new()),
    };
}

/// Global switch for notifications (translates `ObservableSettings`).
///
/// While updates are disabled no observer is called.  If they were disabled
/// in deferred mode, every observer that would have been notified is
/// remembered once and receives a single update when updates are enabled
/// again.
pub struct ObservableSettings;

impl ObservableSettings {
    /// Stop delivering notifications.
    pub fn disable_updates(deferred: bool) {
        UPDATES.with(|u| {
            u.enabled.set(false);
            u.deferred.set(deferred);
        });
    }

    /// Resume delivering notifications, flushing deferred ones.
    pub fn enable_updates() -> Result<()> {
        let pending = UPDATES.with(|u| {
            u.enabled.set(true);
            u.deferred.set(false);
            std::mem::take(&mut *u.pending.borrow_mut())
        });
        if !pending.is_empty() {
            tracing::debug!(observers = pending.len(), "flushing deferred updates");
        }
        for observer in pending.values().filter_map(Weak::upgrade) {
            observer.update()?;
        }
        Ok(())
    }

    /// Whether notifications are currently delivered.
    pub fn updates_enabled() -> bool {
        UPDATES.with(|u| u.enabled.get())
    }

    /// Whether suppressed notifications are being collected.
    pub fn updates_deferred() -> bool {
        UPDATES.with(|u| u.deferred.get())
    }

    fn defer(observers: &[(ObserverId, Weak<dyn Observer>)]) {
        UPDATES.with(|u| {
            if u.deferred.get() {
                let mut pending = u.pending.borrow_mut();
                for (id, o) in observers {
                    pending.entry(*id).or_insert_with(|| o.clone());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    struct Source {
        observable: ObservableImpl,
    }

    impl Source {
        fn new() -> Rc<Self> {
            Rc::new(Source {
                observable: ObservableImpl::new(),
            })
        }
    }

    impl Observable for Source {
        fn observable(&self) -> &ObservableImpl {
            &self.observable
        }
    }

    struct Counter {
        observer: ObserverImpl,
        count: Cell<u32>,
        on_update: RefCell<Option<Box<dyn Fn() -> Result<()>>>>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new_cyclic(|this: &Weak<Self>| Counter {
                observer: ObserverImpl::new(this.clone()),
                count: Cell::new(0),
                on_update: RefCell::new(None),
            })
        }
    }

    impl Observer for Counter {
        fn observer(&self) -> &ObserverImpl {
            &self.observer
        }

        fn update(&self) -> Result<()> {
            self.count.set(self.count.get() + 1);
            match &*self.on_update.borrow() {
                Some(f) => f(),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn register_and_notify() {
        let source = Source::new();
        let obs = Counter::new();
        assert!(obs.register_with(source.clone()));
        source.notify_observers().unwrap();
        source.notify_observers().unwrap();
        assert_eq!(obs.count.get(), 2);
    }

    #[test]
    fn registration_is_idempotent_and_symmetric() {
        let source = Source::new();
        let obs = Counter::new();
        assert!(obs.register_with(source.clone()));
        assert!(!obs.register_with(source.clone()));
        assert_eq!(source.observer_count(), 1);
        assert!(source.has_observer(&*obs));
        assert!(obs.is_registered_with(&*source));

        source.notify_observers().unwrap();
        assert_eq!(obs.count.get(), 1);

        assert!(obs.unregister_with(&*source));
        assert!(!obs.unregister_with(&*source));
        assert!(!source.has_observer(&*obs));
        assert!(!obs.is_registered_with(&*source));
        source.notify_observers().unwrap();
        assert_eq!(obs.count.get(), 1);
    }

    #[test]
    fn unregister_with_all() {
        let s1 = Source::new();
        let s2 = Source::new();
        let obs = Counter::new();
        obs.register_with(s1.clone());
        obs.register_with(s2.clone());
        assert_eq!(obs.observer().len(), 2);
        obs.unregister_with_all();
        assert!(obs.observer().is_empty());
        assert_eq!(s1.observer_count(), 0);
        assert_eq!(s2.observer_count(), 0);
    }

    #[test]
    fn dropped_observer_leaves_membership() {
        let source = Source::new();
        {
            let obs = Counter::new();
            obs.register_with(source.clone());
            assert_eq!(source.observer_count(), 1);
        }
        assert_eq!(source.observer_count(), 0);
        source.notify_observers().unwrap();
    }

    #[test]
    fn observer_keeps_source_alive() {
        let obs = Counter::new();
        let source = Source::new();
        let weak = Rc::downgrade(&source);
        obs.register_with(source);
        assert!(weak.upgrade().is_some());
        obs.unregister_with_all();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn observer_dropped_mid_pass_is_skipped() {
        let source = Source::new();
        let first = Counter::new();
        let second = Counter::new();
        first.register_with(source.clone());
        second.register_with(source.clone());
        assert_eq!(source.observer_count(), 2);

        let visits = Rc::new(Cell::new(0));
        let seen = visits.clone();
        second.on_update.replace(Some(Box::new(move || {
            seen.set(seen.get() + 1);
            Ok(())
        })));
        let gone = Rc::downgrade(&second);
        let slot = Rc::new(RefCell::new(Some(second)));
        let held = slot.clone();
        first.on_update.replace(Some(Box::new(move || {
            held.borrow_mut().take();
            Ok(())
        })));

        source.notify_observers().unwrap();
        assert_eq!(first.count.get(), 1);
        assert!(gone.upgrade().is_none());
        assert_eq!(visits.get(), 0);
        assert_eq!(source.observer_count(), 1);

        source.notify_observers().unwrap();
        assert_eq!(first.count.get(), 2);
    }

    #[test]
    fn releasing_a_source_keeps_tables_consistent() {
        let obs = Counter::new();
        let kept = Source::new();
        let released = Source::new();
        let weak = Rc::downgrade(&released);
        obs.register_with(kept.clone());
        obs.register_with(released.clone());
        drop(released);

        // the subscription still owns the source
        let source = weak.upgrade().unwrap();
        assert_eq!(obs.observer().len(), 2);
        source.notify_observers().unwrap();
        assert_eq!(obs.count.get(), 1);
        drop(source);

        obs.unregister_with(&*weak.upgrade().unwrap());
        assert!(weak.upgrade().is_none());
        assert_eq!(obs.observer().len(), 1);
        assert!(obs.is_registered_with(&*kept));
        assert_eq!(kept.observer_count(), 1);
    }

    #[test]
    fn observers_added_during_notify_wait_for_next_pass() {
        let source = Source::new();
        let first = Counter::new();
        let late = Counter::new();
        first.register_with(source.clone());
        {
            let late = Rc::downgrade(&late);
            let source: Rc<dyn Observable> = source.clone();
            *first.on_update.borrow_mut() = Some(Box::new(move || {
                if let Some(late) = late.upgrade() {
                    late.register_with(source.clone());
                }
                Ok(())
            }));
        }
        source.notify_observers().unwrap();
        assert_eq!(late.count.get(), 0);
        source.notify_observers().unwrap();
        assert_eq!(late.count.get(), 1);
        assert_eq!(first.count.get(), 2);
    }

    #[test]
    fn observers_removed_during_notify_are_skipped() {
        let source = Source::new();
        let first = Counter::new();
        let second = Counter::new();
        first.register_with(source.clone());
        second.register_with(source.clone());
        {
            let second = Rc::downgrade(&second);
            let source = Rc::downgrade(&source);
            *first.on_update.borrow_mut() = Some(Box::new(move || {
                if let (Some(second), Some(source)) = (second.upgrade(), source.upgrade()) {
                    second.unregister_with(&*source);
                }
                Ok(())
            }));
        }
        source.notify_observers().unwrap();
        assert_eq!(first.count.get(), 1);
        assert_eq!(second.count.get(), 0);
    }

    #[test]
    fn failing_observer_aborts_the_pass() {
        let source = Source::new();
        let failing = Counter::new();
        let after = Counter::new();
        failing.register_with(source.clone());
        after.register_with(source.clone());
        *failing.on_update.borrow_mut() =
            Some(Box::new(|| Err(Error::Numeric("boom".into()))));

        let err = source.notify_observers().unwrap_err();
        assert_eq!(err, Error::Numeric("boom".into()));
        assert_eq!(after.count.get(), 0);
        // membership untouched
        assert_eq!(source.observer_count(), 2);
    }

    #[test]
    fn deferred_updates_are_delivered_once() {
        let s1 = Source::new();
        let s2 = Source::new();
        let obs = Counter::new();
        obs.register_with(s1.clone());
        obs.register_with(s2.clone());

        ObservableSettings::disable_updates(true);
        assert!(!ObservableSettings::updates_enabled());
        assert!(ObservableSettings::updates_deferred());
        s1.notify_observers().unwrap();
        s2.notify_observers().unwrap();
        s1.notify_observers().unwrap();
        assert_eq!(obs.count.get(), 0);

        ObservableSettings::enable_updates().unwrap();
        assert_eq!(obs.count.get(), 1);
        assert!(ObservableSettings::updates_enabled());
    }

    #[test]
    fn disabled_updates_are_dropped() {
        let source = Source::new();
        let obs = Counter::new();
        obs.register_with(source.clone());

        ObservableSettings::disable_updates(false);
        source.notify_observers().unwrap();
        ObservableSettings::enable_updates().unwrap();
        assert_eq!(obs.count.get(), 0);
    }
}
