//! Change Streams
//!
//! Turns a one-shot query into a stream that yields the current result
//! first and re-runs the query after every write to the watched table.

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::domain::DomainResult;
use super::db::{DbState, Table};

/// Stream of query results for `table`
///
/// Writes that land while a query is running are coalesced into a single
/// re-run. The stream ends only when it is dropped.
pub fn observe<T, F, Fut>(db: &DbState, table: Table, query: F) -> BoxStream<'static, DomainResult<T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = DomainResult<T>> + Send + 'static,
{
    let rx: watch::Receiver<u64> = db.subscribe(table);

    stream::unfold((rx, query, true), |(mut rx, query, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let _ = rx.borrow_and_update();
        let value = query().await;
        Some((value, (rx, query, false)))
    })
    .boxed()
}
