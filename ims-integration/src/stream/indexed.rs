use derive_more::Constructor;
use futures::Stream;
use pin_project::pin_project;
use std::{
    pin::Pin,
    task::{Context, Poll},
};

/// Resolves an externally-keyed item (eg/ an external security identifier) to its internal,
/// indexed counterpart — used by Feed Normalizers (§4.2) to resolve `external -> internal`
/// identifiers against the Reference Store.
pub trait Indexer {
    type Unindexed;
    type Indexed;
    type Error;
    fn index(&self, item: Self::Unindexed) -> Result<Self::Indexed, Self::Error>;
}

#[derive(Debug, Constructor)]
#[pin_project]
pub struct IndexedStream<Indexer, Stream> {
    #[pin]
    pub stream: Stream,
    pub indexer: Indexer,
}

impl<Index, St> Stream for IndexedStream<Index, St>
where
    Index: Indexer<Unindexed = St::Item>,
    St: Stream,
{
    type Item = Result<Index::Indexed, Index::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.stream.poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(this.indexer.index(item))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
