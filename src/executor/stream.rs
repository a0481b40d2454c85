//! Async entity stream
//!
//! Wraps a cursor as a forward-only `Stream`. Each poll advances the
//! cursor by one element; nothing is fetched ahead of demand.

use std::pin::Pin;

use futures_util::stream::{self, Stream};

use crate::entity::FromRow;

use super::cursor::QueryCursor;
use super::errors::ExecutorResult;

/// Boxed stream of typed entities
pub type EntityStream<T> = Pin<Box<dyn Stream<Item = ExecutorResult<T>> + Send>>;

/// Turns a cursor into a stream of `T`.
///
/// The stream ends after the first error.
pub fn entity_stream<T>(cursor: QueryCursor) -> EntityStream<T>
where
    T: FromRow + Send + 'static,
{
    Box::pin(stream::unfold(Some(cursor), |cursor| async move {
        let mut cursor = cursor?;
        match cursor.next_as::<T>().await {
            Ok(Some(item)) => Some((Ok(item), Some(cursor))),
            Ok(None) => None,
            Err(err) => Some((Err(err), None)),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeValue, Record};
    use crate::codec::ScalarKind;
    use crate::compiler::QueryCompiler;
    use crate::entity::Row;
    use crate::executor::{CursorSettings, NoRetry, Page, StatementRequest, StoreClient, StoreFuture};
    use crate::mapping::{EntityMapping, PropertyMapping};
    use crate::observability::Diagnostics;
    use crate::query::QueryModel;
    use futures_util::StreamExt;
    use std::sync::Arc;

    struct OnePage;

    impl StoreClient for OnePage {
        fn execute(&self, _request: StatementRequest) -> StoreFuture<'_> {
            Box::pin(async {
                Ok(Page::last(vec![
                    Record::new().with("Name", AttributeValue::String("a".into())),
                    Record::new().with("Name", AttributeValue::Bool(true)),
                    Record::new().with("Name", AttributeValue::String("c".into())),
                ]))
            })
        }
    }

    fn cursor() -> QueryCursor {
        let mapping = EntityMapping::new("Tag", "tags")
            .with_property(PropertyMapping::new("Name", ScalarKind::String));
        let model = QueryModel::from_mapping(&mapping).unwrap();
        QueryCursor::new(
            Arc::new(QueryCompiler::default().compile(&model).unwrap()),
            Arc::new(OnePage),
            Arc::new(NoRetry),
            Diagnostics::disabled(),
            CursorSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_stream_stops_after_first_error() {
        let items: Vec<ExecutorResult<Row>> = entity_stream::<Row>(cursor()).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
