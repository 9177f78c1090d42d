//! Zoom level and anchor date of the calendar, as a pure transition function.
//!
//! [ViewState::apply] never performs I/O. A successful transition comes back marked as
//! transitioning; the caller animates, loads and renders, then calls [ViewState::settle].

use chrono::{Datelike, Days, NaiveDate};

use crate::time::{add_months, with_month, with_year};

/// Years offered on the year view: the current one and those before it.
pub const ROLLING_YEARS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomLevel {
    Year,
    Month,
    Day,
    Time,
}

impl ZoomLevel {
    pub fn outer(self) -> Option<Self> {
        match self {
            ZoomLevel::Year => None,
            ZoomLevel::Month => Some(ZoomLevel::Year),
            ZoomLevel::Day => Some(ZoomLevel::Month),
            ZoomLevel::Time => Some(ZoomLevel::Day),
        }
    }
}

/// The grid cell picked when zooming in. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Year(i32),
    Month(u32),
    Day(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ZoomIn(Selection),
    ZoomOut,
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub zoom: ZoomLevel,
    pub anchor: NaiveDate,
    pub transitioning: bool,
    /// Last year of the rolling window, fixed when the session opens.
    pub current_year: i32,
}

impl ViewState {
    /// Sessions open on the intraday view of `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            zoom: ZoomLevel::Time,
            anchor: today,
            transitioning: false,
            current_year: today.year(),
        }
    }

    /// Whether `year` is one of the cells on the year view.
    pub fn offers_year(&self, year: i32) -> bool {
        (self.current_year - ROLLING_YEARS + 1..=self.current_year).contains(&year)
    }

    /// The state `action` leads to, or `None` when it is ignored: a transition is already
    /// in flight, the move does not exist at this level, or the selection is out of range.
    pub fn apply(&self, action: Action) -> Option<ViewState> {
        if self.transitioning {
            return None;
        }

        let (zoom, anchor) = match (self.zoom, action) {
            (ZoomLevel::Year, Action::ZoomIn(Selection::Year(year))) if self.offers_year(year) => {
                (ZoomLevel::Month, with_year(self.anchor, year)?)
            }
            (ZoomLevel::Month, Action::ZoomIn(Selection::Month(month))) => {
                (ZoomLevel::Day, with_month(self.anchor, month)?)
            }
            (ZoomLevel::Day, Action::ZoomIn(Selection::Day(day))) => {
                (ZoomLevel::Time, self.anchor.with_day(day)?)
            }
            (_, Action::ZoomIn(_)) => return None,

            (zoom, Action::ZoomOut) => (zoom.outer()?, self.anchor),

            (zoom, Action::Previous) => (zoom, self.step(zoom, -1)?),
            (zoom, Action::Next) => (zoom, self.step(zoom, 1)?),
        };

        Some(ViewState {
            zoom,
            anchor,
            transitioning: true,
            current_year: self.current_year,
        })
    }

    /// The transition has been rendered; accept input again.
    pub fn settle(&mut self) {
        self.transitioning = false;
    }

    fn step(&self, zoom: ZoomLevel, direction: i32) -> Option<NaiveDate> {
        match zoom {
            ZoomLevel::Year => None,
            ZoomLevel::Month => with_year(self.anchor, self.anchor.year() + direction),
            ZoomLevel::Day => add_months(self.anchor, direction),
            ZoomLevel::Time if direction < 0 => self.anchor.checked_sub_days(Days::new(1)),
            ZoomLevel::Time => self.anchor.checked_add_days(Days::new(1)),
        }
    }
}
