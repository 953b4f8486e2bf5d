//! Global library settings (translates `ql/settings.hpp`).
//!
//! [`Settings`] holds the **evaluation date** (the date at which all
//! calculations are performed) and a few date-sensitivity policy flags.
//! The object graph is single-threaded, so there is one instance per
//! thread, reached through [`Settings::instance`].
//!
//! The evaluation date is an [`ObservableValue`]: term structures whose
//! reference date follows it register with
//! [`Settings::evaluation_date_observable`] and are notified when it moves.
//! The flags are plain values and never notify.
//!
//! The date is stored as a serial number (days since 1899-12-30); `ql-time`
//! layers the `Date` API on top.  `None` means "today".

use crate::errors::Result;
use crate::patterns::observable::Observable;
use crate::patterns::observable_value::ObservableValue;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Per-thread settings used by the library.
pub struct Settings {
    evaluation_date: Rc<ObservableValue<Option<i32>>>,
    include_reference_date_events: Cell<bool>,
    include_todays_cashflows: Cell<Option<bool>>,
    enforces_todays_historic_fixings: Cell<bool>,
}

thread_local! {
    static INSTANCE: Rc<Settings> = Rc::new(Settings::new());
}

impl Settings {
    fn new() -> Self {
        Self {
            evaluation_date: Rc::new(ObservableValue::new(None)),
            include_reference_date_events: Cell::new(false),
            include_todays_cashflows: Cell::new(None),
            enforces_todays_historic_fixings: Cell::new(false),
        }
    }

    /// The settings of the current thread.
    pub fn instance() -> Rc<Settings> {
        INSTANCE.with(Rc::clone)
    }

    // ── Evaluation date ──────────────────────────────────────────────────────

    /// The evaluation date serial, or `None` if it follows the system clock.
    pub fn evaluation_date_serial(&self) -> Option<i32> {
        self.evaluation_date.value()
    }

    /// Set (or with `None`, clear) the evaluation date.
    ///
    /// Observers of the evaluation date are notified iff the stored value
    /// changes.
    pub fn set_evaluation_date_serial(&self, serial: Option<i32>) -> Result<()> {
        let old = self.evaluation_date.value();
        if old != serial {
            tracing::debug!(?old, new = ?serial, "evaluation date changed");
        }
        self.evaluation_date.set_if_changed(serial)?;
        Ok(())
    }

    /// Clear the evaluation date, so that it follows the system clock again.
    pub fn reset_evaluation_date(&self) -> Result<()> {
        self.set_evaluation_date_serial(None)
    }

    /// The notification source for evaluation-date changes.
    pub fn evaluation_date_observable(&self) -> Rc<dyn Observable> {
        self.evaluation_date.clone()
    }

    // ── Policy flags ─────────────────────────────────────────────────────────

    /// Whether an event falling on the reference date counts as occurred.
    pub fn include_reference_date_events(&self) -> bool {
        self.include_reference_date_events.get()
    }

    /// See [`include_reference_date_events`](Self::include_reference_date_events).
    pub fn set_include_reference_date_events(&self, value: bool) {
        self.include_reference_date_events.set(value);
    }

    /// Whether cash flows paid today contribute to NPV (`None`: use the
    /// reference-date rule).
    pub fn include_todays_cashflows(&self) -> Option<bool> {
        self.include_todays_cashflows.get()
    }

    /// See [`include_todays_cashflows`](Self::include_todays_cashflows).
    pub fn set_include_todays_cashflows(&self, value: Option<bool>) {
        self.include_todays_cashflows.set(value);
    }

    /// Whether today's fixings must come from the historical store.
    pub fn enforces_todays_historic_fixings(&self) -> bool {
        self.enforces_todays_historic_fixings.get()
    }

    /// See [`enforces_todays_historic_fixings`](Self::enforces_todays_historic_fixings).
    pub fn set_enforces_todays_historic_fixings(&self, value: bool) {
        self.enforces_todays_historic_fixings.set(value);
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("evaluation_date", &self.evaluation_date_serial())
            .field(
                "include_reference_date_events",
                &self.include_reference_date_events(),
            )
            .field("include_todays_cashflows", &self.include_todays_cashflows())
            .field(
                "enforces_todays_historic_fixings",
                &self.enforces_todays_historic_fixings(),
            )
            .finish()
    }
}

/// Snapshot of the current thread's [`Settings`], restored on drop.
///
/// Restoring the evaluation date notifies its observers only if the date
/// actually changed while the guard was alive.
///
/// ```
/// use ql_core::settings::{SavedSettings, Settings};
///
/// let settings = Settings::instance();
/// {
///     let _saved = SavedSettings::new();
///     settings.set_evaluation_date_serial(Some(45_458)).unwrap();
///     settings.set_include_reference_date_events(true);
/// }
/// assert_eq!(settings.evaluation_date_serial(), None);
/// assert!(!settings.include_reference_date_events());
/// ```
#[must_use = "settings are restored when the guard is dropped"]
pub struct SavedSettings {
    evaluation_date: Option<i32>,
    include_reference_date_events: bool,
    include_todays_cashflows: Option<bool>,
    enforces_todays_historic_fixings: bool,
}

impl SavedSettings {
    /// Snapshot the current thread's settings.
    pub fn new() -> Self {
        let s = Settings::instance();
        Self {
            evaluation_date: s.evaluation_date_serial(),
            include_reference_date_events: s.include_reference_date_events(),
            include_todays_cashflows: s.include_todays_cashflows(),
            enforces_todays_historic_fixings: s.enforces_todays_historic_fixings(),
        }
    }
}

impl Default for SavedSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SavedSettings {
    fn drop(&mut self) {
        let s = Settings::instance();
        s.set_include_reference_date_events(self.include_reference_date_events);
        s.set_include_todays_cashflows(self.include_todays_cashflows);
        s.set_enforces_todays_historic_fixings(self.enforces_todays_historic_fixings);
        if let Err(e) = s.set_evaluation_date_serial(self.evaluation_date) {
            tracing::warn!(error = %e, "observer failed while restoring the evaluation date");
        }
    }
}

impl fmt::Debug for SavedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedSettings")
            .field("evaluation_date", &self.evaluation_date)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::observable::{Observer, ObserverImpl};
    use std::rc::Weak;

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

    fn counter() -> Rc<Counter> {
        Rc::new_cyclic(|this: &Weak<Counter>| Counter {
            observer: ObserverImpl::new(this.clone()),
            count: Cell::new(0),
        })
    }

    #[test]
    fn evaluation_date_notifies_on_change_only() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        let obs = counter();
        obs.register_with(settings.evaluation_date_observable());

        settings.set_evaluation_date_serial(Some(45_458)).unwrap();
        assert_eq!(obs.count.get(), 1);
        settings.set_evaluation_date_serial(Some(45_458)).unwrap();
        assert_eq!(obs.count.get(), 1);
        settings.set_evaluation_date_serial(Some(45_823)).unwrap();
        assert_eq!(obs.count.get(), 2);
        assert_eq!(settings.evaluation_date_serial(), Some(45_823));
    }

    #[test]
    fn flags_do_not_notify() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        let obs = counter();
        obs.register_with(settings.evaluation_date_observable());

        settings.set_include_reference_date_events(true);
        settings.set_include_todays_cashflows(Some(false));
        settings.set_enforces_todays_historic_fixings(true);
        assert_eq!(obs.count.get(), 0);
        assert!(settings.include_reference_date_events());
        assert_eq!(settings.include_todays_cashflows(), Some(false));
        assert!(settings.enforces_todays_historic_fixings());
    }

    #[test]
    fn saved_settings_restore_and_notify() {
        let settings = Settings::instance();
        let obs = counter();
        obs.register_with(settings.evaluation_date_observable());
        {
            let _saved = SavedSettings::new();
            settings.set_evaluation_date_serial(Some(46_000)).unwrap();
            settings.set_include_todays_cashflows(Some(true));
        }
        assert_eq!(settings.evaluation_date_serial(), None);
        assert_eq!(settings.include_todays_cashflows(), None);
        // one for the change, one for the restore
        assert_eq!(obs.count.get(), 2);

        {
            let _saved = SavedSettings::new();
        }
        assert_eq!(obs.count.get(), 2);
    }

    #[test]
    fn one_instance_per_thread() {
        let _saved = SavedSettings::new();
        Settings::instance()
            .set_evaluation_date_serial(Some(45_000))
            .unwrap();
        let other = std::thread::spawn(|| Settings::instance().evaluation_date_serial())
            .join()
            .unwrap();
        assert_eq!(other, None);
        assert!(Rc::ptr_eq(&Settings::instance(), &Settings::instance()));
    }
}
