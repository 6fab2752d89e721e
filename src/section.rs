use chrono::NaiveDate;
use tokio::sync::watch;

/// Inclusive calendar range picked in a date-range article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Last-write-wins slot broadcast to every article of one section.
#[derive(Debug)]
pub struct SharedSlot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> SharedSlot<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn value(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn set_value(&self, value: T) {
        self.tx.send_replace(Some(value));
    }
}

impl<T: Clone> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the articles of one section render. Created fresh
/// for every render and dropped with it.
#[derive(Debug, Default)]
pub struct SectionContext {
    pub date_range: SharedSlot<DateRange>,
}
