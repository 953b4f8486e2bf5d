//! `TermStructure`: base trait for all term structures
//! (translates `ql/termstructure.hpp` and `ql/patterns/extrapolator.hpp`).
//!
//! Every term structure has a **reference date** (where time zero sits on
//! its axis), a **day counter** mapping dates to times, a **calendar**, and
//! a **maximum date**.  The reference date comes from one of three modes:
//!
//! | mode | reference date | observes the evaluation date |
//! |------|----------------|------------------------------|
//! | [`ReferenceDate::Fixed`] | the given date | no |
//! | [`ReferenceDate::FollowEvaluationDate`] | the evaluation date, read on demand | yes |
//! | [`ReferenceDate::SettlementDays`] | evaluation date + n business days | yes |
//!
//! The shared state lives in [`TermStructureCore`], which concrete curves
//! embed; the trait supplies the date/time conversions and range checks.

use ql_core::ensure;
use ql_core::errors::{Error, Result};
use ql_core::patterns::observable::{
    AsObservable, Observable, ObservableImpl, Observer, ObserverImpl,
};
use ql_core::settings::Settings;
use ql_core::Time;
use ql_time::{Calendar, Date, DayCounter, EvaluationDate};
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// How a term structure determines its reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceDate {
    /// A fixed date that never changes.
    Fixed(Date),
    /// Always the current evaluation date.
    FollowEvaluationDate,
    /// The evaluation date advanced by this many business days on the
    /// term structure's calendar.
    SettlementDays(u32),
}

impl ReferenceDate {
    /// Whether the reference date moves with the evaluation date.
    pub fn is_moving(&self) -> bool {
        !matches!(self, ReferenceDate::Fixed(_))
    }
}

/// State shared by every term structure.
///
/// Holds the observer/observable halves, the reference-date policy and its
/// cache, the calendar, the day counter, and the extrapolation flag.
pub struct TermStructureCore {
    reference: ReferenceDate,
    calendar: Rc<dyn Calendar>,
    day_counter: Rc<dyn DayCounter>,
    cached_reference: Cell<Option<Date>>,
    extrapolate: Cell<bool>,
    observable: ObservableImpl,
    observer: ObserverImpl,
}

impl TermStructureCore {
    /// Create the core of the term structure that `this` points to.
    ///
    /// Moving modes subscribe to the evaluation date right away.
    pub fn new(
        this: Weak<dyn Observer>,
        reference: ReferenceDate,
        calendar: Rc<dyn Calendar>,
        day_counter: Rc<dyn DayCounter>,
    ) -> Self {
        let core = Self {
            reference,
            calendar,
            day_counter,
            cached_reference: Cell::new(None),
            extrapolate: Cell::new(false),
            observable: ObservableImpl::new(),
            observer: ObserverImpl::new(this),
        };
        if reference.is_moving() {
            core.observer
                .register_with(Settings::instance().evaluation_date_observable());
        }
        core
    }

    /// The embedded observer list.
    pub fn observable(&self) -> &ObservableImpl {
        &self.observable
    }

    /// The embedded subscription list.
    pub fn observer(&self) -> &ObserverImpl {
        &self.observer
    }

    /// The reference-date policy.
    pub fn reference_mode(&self) -> ReferenceDate {
        self.reference
    }

    /// The current reference date.
    pub fn reference_date(&self) -> Result<Date> {
        match self.reference {
            ReferenceDate::Fixed(date) => Ok(date),
            ReferenceDate::FollowEvaluationDate => Ok(Settings::instance().evaluation_date()),
            ReferenceDate::SettlementDays(days) => {
                if let Some(date) = self.cached_reference.get() {
                    return Ok(date);
                }
                let today = Settings::instance().evaluation_date();
                let offset = i32::try_from(days)
                    .map_err(|_| Error::OutOfRange(format!("{days} settlement days")))?;
                let date = self.calendar.advance_business_days(today, offset)?;
                self.cached_reference.set(Some(date));
                Ok(date)
            }
        }
    }

    /// Drop the cached reference date; called on every update.
    pub fn refresh(&self) {
        self.cached_reference.set(None);
    }

    /// The calendar.
    pub fn calendar(&self) -> &dyn Calendar {
        &*self.calendar
    }

    /// The day counter.
    pub fn day_counter(&self) -> &dyn DayCounter {
        &*self.day_counter
    }
}

impl fmt::Debug for TermStructureCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermStructureCore")
            .field("reference", &self.reference)
            .field("calendar", &self.calendar.name())
            .field("day_counter", &self.day_counter.name())
            .field("extrapolate", &self.extrapolate.get())
            .finish()
    }
}

/// Base trait for all term structures.
///
/// Corresponds to `QuantLib::TermStructure`.  Implementors embed a
/// [`TermStructureCore`], forward [`Observable`]/[`Observer`] to it, and
/// call [`TermStructureCore::refresh`] from their `update` before
/// re-notifying.
pub trait TermStructure: Observable + Observer + AsObservable + fmt::Debug {
    /// The embedded shared state.
    fn core(&self) -> &TermStructureCore;

    /// The latest date for which the curve can return values.
    fn max_date(&self) -> Date;

    /// The date at which time is zero.
    fn reference_date(&self) -> Result<Date> {
        self.core().reference_date()
    }

    /// The day counter used for date → time conversions.
    fn day_counter(&self) -> &dyn DayCounter {
        self.core().day_counter()
    }

    /// The calendar used for date adjustments.
    fn calendar(&self) -> &dyn Calendar {
        self.core().calendar()
    }

    /// The settlement offset, if the reference date is derived from one.
    fn settlement_days(&self) -> Option<u32> {
        match self.core().reference_mode() {
            ReferenceDate::SettlementDays(days) => Some(days),
            ReferenceDate::FollowEvaluationDate => Some(0),
            ReferenceDate::Fixed(_) => None,
        }
    }

    /// The latest time for which the curve can return values.
    fn max_time(&self) -> Result<Time> {
        self.time_from_reference(self.max_date())
    }

    /// Year fraction from the reference date to `date`.
    ///
    /// Fails with [`Error::OutOfRange`] if `date` precedes the reference
    /// date.
    fn time_from_reference(&self, date: Date) -> Result<Time> {
        let reference = self.reference_date()?;
        ensure!(
            date >= reference,
            Error::OutOfRange(format!("date ({date}) before reference date ({reference})"))
        );
        Ok(self.day_counter().year_fraction(reference, date))
    }

    /// Check that `date` is covered, allowing dates past the maximum when
    /// `extrapolate` is set or extrapolation is enabled.
    fn check_range(&self, date: Date, extrapolate: bool) -> Result<()> {
        let reference = self.reference_date()?;
        ensure!(
            date >= reference,
            Error::OutOfRange(format!("date ({date}) before reference date ({reference})"))
        );
        let max = self.max_date();
        ensure!(
            extrapolate || self.allows_extrapolation() || date <= max,
            Error::OutOfRange(format!("date ({date}) is past max curve date ({max})"))
        );
        Ok(())
    }

    /// Time version of [`check_range`](Self::check_range).
    fn check_range_time(&self, t: Time, extrapolate: bool) -> Result<()> {
        ensure!(t >= 0.0, Error::OutOfRange(format!("negative time ({t}) given")));
        if !(extrapolate || self.allows_extrapolation()) {
            let max = self.max_time()?;
            // tolerance for round-off at the last pillar
            ensure!(
                t <= max + 1e-12 * max.abs().max(1.0),
                Error::OutOfRange(format!("time ({t}) is past max curve time ({max})"))
            );
        }
        Ok(())
    }

    /// Allow values past the maximum date.
    fn enable_extrapolation(&self) {
        self.core().extrapolate.set(true);
    }

    /// Forbid values past the maximum date.
    fn disable_extrapolation(&self) {
        self.core().extrapolate.set(false);
    }

    /// Whether values past the maximum date are allowed.
    fn allows_extrapolation(&self) -> bool {
        self.core().extrapolate.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::settings::SavedSettings;
    use ql_time::{Actual365Fixed, NullCalendar, WeekendsOnly};

    /// A bare term structure covering five years.
    #[derive(Debug)]
    struct Bare {
        core: TermStructureCore,
        updates: Cell<u32>,
    }

    impl Bare {
        fn new(reference: ReferenceDate, calendar: Rc<dyn Calendar>) -> Rc<Self> {
            Rc::new_cyclic(|this: &Weak<Self>| {
                let this: Weak<dyn Observer> = this.clone();
                Bare {
                    core: TermStructureCore::new(
                        this,
                        reference,
                        calendar,
                        Rc::new(Actual365Fixed),
                    ),
                    updates: Cell::new(0),
                }
            })
        }
    }

    impl Observable for Bare {
        fn observable(&self) -> &ObservableImpl {
            self.core.observable()
        }
    }

    impl Observer for Bare {
        fn observer(&self) -> &ObserverImpl {
            self.core.observer()
        }

        fn update(&self) -> Result<()> {
            self.updates.set(self.updates.get() + 1);
            self.core.refresh();
            self.notify_observers()
        }
    }

    impl TermStructure for Bare {
        fn core(&self) -> &TermStructureCore {
            &self.core
        }

        fn max_date(&self) -> Date {
            self.reference_date()
                .and_then(|d| d.add_years(5))
                .unwrap_or(Date::MAX)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn fixed_reference_ignores_evaluation_date() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        settings.set_evaluation_date(date(2024, 6, 14)).unwrap();

        let ts = Bare::new(ReferenceDate::Fixed(date(2024, 1, 2)), Rc::new(NullCalendar));
        settings.set_evaluation_date(date(2024, 6, 17)).unwrap();
        assert_eq!(ts.updates.get(), 0);
        assert_eq!(ts.reference_date().unwrap(), date(2024, 1, 2));
        assert_eq!(ts.settlement_days(), None);
    }

    #[test]
    fn moving_reference_follows_evaluation_date() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        settings.set_evaluation_date(date(2024, 6, 14)).unwrap();

        let ts = Bare::new(ReferenceDate::FollowEvaluationDate, Rc::new(NullCalendar));
        assert_eq!(ts.reference_date().unwrap(), date(2024, 6, 14));
        settings.set_evaluation_date(date(2024, 6, 20)).unwrap();
        assert_eq!(ts.updates.get(), 1);
        assert_eq!(ts.reference_date().unwrap(), date(2024, 6, 20));
    }

    #[test]
    fn settlement_days_roll_on_calendar() {
        let _saved = SavedSettings::new();
        let settings = Settings::instance();
        // Friday
        settings.set_evaluation_date(date(2024, 6, 14)).unwrap();

        let ts = Bare::new(ReferenceDate::SettlementDays(2), Rc::new(WeekendsOnly));
        assert_eq!(ts.reference_date().unwrap(), date(2024, 6, 18));
        assert_eq!(ts.settlement_days(), Some(2));

        settings.set_evaluation_date(date(2024, 6, 18)).unwrap();
        assert_eq!(ts.reference_date().unwrap(), date(2024, 6, 20));
    }

    #[test]
    fn oversized_settlement_offset_is_out_of_range() {
        let _saved = SavedSettings::new();
        Settings::instance().set_evaluation_date(date(2024, 6, 14)).unwrap();
        let ts = Bare::new(ReferenceDate::SettlementDays(u32::MAX), Rc::new(WeekendsOnly));
        assert!(matches!(ts.reference_date(), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn time_from_reference_rejects_earlier_dates() {
        let ts = Bare::new(ReferenceDate::Fixed(date(2024, 6, 15)), Rc::new(NullCalendar));
        assert_eq!(ts.time_from_reference(date(2025, 6, 15)).unwrap(), 1.0);
        assert!(matches!(
            ts.time_from_reference(date(2024, 6, 14)),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn extrapolation_flag_controls_range_checks() {
        let ts = Bare::new(ReferenceDate::Fixed(date(2024, 6, 15)), Rc::new(NullCalendar));
        let far = date(2035, 1, 1);
        assert!(ts.check_range(date(2026, 1, 1), false).is_ok());
        assert!(matches!(ts.check_range(far, false), Err(Error::OutOfRange(_))));
        assert!(ts.check_range(far, true).is_ok());
        assert!(ts.check_range_time(3.0, false).is_ok());
        assert!(ts.check_range_time(-0.1, true).is_err());

        ts.enable_extrapolation();
        assert!(ts.allows_extrapolation());
        assert!(ts.check_range(far, false).is_ok());
        assert!(ts.check_range_time(20.0, false).is_ok());
        ts.disable_extrapolation();
        assert!(ts.check_range_time(20.0, false).is_err());
    }
}
