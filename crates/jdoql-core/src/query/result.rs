use derive_more::{Deref, IntoIterator};

///
/// QueryResult
///
/// Rows of one execution plus the handle `close` releases. Reads like a
/// slice; closing a handle never invalidates the rows already returned.
///

#[derive(Clone, Debug, Deref, IntoIterator, PartialEq)]
pub struct QueryResult<R> {
    id: u64,

    #[deref]
    #[into_iterator(owned, ref)]
    rows: Vec<R>,
}

impl<R> QueryResult<R> {
    pub(crate) const fn new(id: u64, rows: Vec<R>) -> Self {
        Self { id, rows }
    }

    /// Handle id, unique within the query that produced it.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}
