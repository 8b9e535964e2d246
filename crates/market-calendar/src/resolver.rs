//! Reference date resolution.

use chrono::{Days, Months, NaiveDate};
use market_core::dates::start_of_year;
use market_core::{
    Clock, DateSlot, FrameReader, Query, ReferenceDateSet, Result, TableRef, TabularSource,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default number of distinct sessions fetched per resolution.
pub const DEFAULT_DEPTH: usize = 20;

/// How the week and month slots are picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookbackMode {
    /// Nearest session to today minus one week / one month.
    #[default]
    Calendar,
    /// Positional: `week` is the session at index `week` of the fetched list
    /// (newest first) and `month` is the oldest fetched session.
    SessionIndex {
        /// Index of the week session in the newest-first list.
        week: usize,
    },
}

/// Resolves [`ReferenceDateSet`]s against a table's trading calendar.
#[derive(Debug, Clone)]
pub struct CalendarResolver {
    clock: Arc<dyn Clock>,
    depth: usize,
    mode: LookbackMode,
}

impl CalendarResolver {
    /// Creates a resolver using `clock` for "today".
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            depth: DEFAULT_DEPTH,
            mode: LookbackMode::Calendar,
        }
    }

    /// Sets how many distinct sessions are fetched.
    #[must_use]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the look-back mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: LookbackMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the configured depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns today's date according to the injected clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Resolves every slot for `table`, keyed on `column`.
    ///
    /// The four offset lookups run concurrently. A slot whose lookup finds no
    /// session holds today's date and is listed in
    /// [`ReferenceDateSet::degraded`]; an empty table degrades every slot.
    #[instrument(skip(self, source), fields(table = %table, mode = ?self.mode))]
    pub async fn resolve(
        &self,
        source: &dyn TabularSource,
        table: &TableRef,
        column: &'static str,
    ) -> Result<ReferenceDateSet> {
        let today = self.clock.today();
        let sessions = self.session_dates(source, table, column).await?;

        let (Some(&latest), Some(&oldest)) = (sessions.first(), sessions.last()) else {
            warn!(%today, "Table has no sessions, every reference date falls back to today");
            let mut set = ReferenceDateSet::uniform(today);
            set.degraded = DateSlot::ALL.to_vec();
            return Ok(set);
        };
        let previous = sessions.get(1).copied().unwrap_or(latest);

        let week_target = today.checked_sub_days(Days::new(7)).unwrap_or(today);
        let month_target = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        let year_target = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        let year_start_target = start_of_year(today).unwrap_or(today);

        let (week, month, year, year_start) = match self.mode {
            LookbackMode::Calendar => futures::try_join!(
                self.nearest(source, table, column, week_target),
                self.nearest(source, table, column, month_target),
                self.nearest(source, table, column, year_target),
                self.nearest(source, table, column, year_start_target),
            )?,
            LookbackMode::SessionIndex { week } => {
                let (year, year_start) = futures::try_join!(
                    self.nearest(source, table, column, year_target),
                    self.nearest(source, table, column, year_start_target),
                )?;
                let week = sessions.get(week).copied().unwrap_or(oldest);
                (Some(week), Some(oldest), year, year_start)
            }
        };

        let mut degraded = Vec::new();
        let mut settle = |slot: DateSlot, found: Option<NaiveDate>| {
            found.unwrap_or_else(|| {
                warn!(?slot, %today, "No session found, falling back to today");
                degraded.push(slot);
                today
            })
        };
        let week = settle(DateSlot::Week, week);
        let month = settle(DateSlot::Month, month);
        let year = settle(DateSlot::Year, year);
        let year_start = settle(DateSlot::YearStart, year_start);
        let set = ReferenceDateSet {
            latest,
            previous,
            week,
            month,
            year,
            year_start,
            degraded,
        };
        debug!(
            latest = %set.latest,
            previous = %set.previous,
            week = %set.week,
            month = %set.month,
            year = %set.year,
            year_start = %set.year_start,
            "Resolved reference dates"
        );
        Ok(set)
    }

    /// Returns up to `depth` distinct session dates of `table`, newest first.
    pub async fn session_dates(
        &self,
        source: &dyn TabularSource,
        table: &TableRef,
        column: &'static str,
    ) -> Result<Vec<NaiveDate>> {
        let df = source
            .query(&Query::distinct_dates(table, column, self.depth))
            .await?;
        Ok(FrameReader::new(&df).date(column)?.into_iter().flatten().collect())
    }

    /// Returns the session of `table` closest to `target`, if any.
    pub async fn nearest(
        &self,
        source: &dyn TabularSource,
        table: &TableRef,
        column: &'static str,
        target: NaiveDate,
    ) -> Result<Option<NaiveDate>> {
        let df = source
            .query(&Query::nearest_date(table, column, target))
            .await?;
        Ok(FrameReader::new(&df)
            .date(column)?
            .into_iter()
            .flatten()
            .next())
    }
}
