use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter for `LocalStore::query`.
///
/// A date range takes precedence over an exact date; with neither, every
/// record matches. `limit` is applied after ordering by timestamp.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub exact_date: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on(date: NaiveDate) -> Self {
        Self {
            exact_date: Some(date),
            ..Self::default()
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            date_range: Some((start, end)),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}
