use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, TransactionTrait,
};

use crate::{
    entities::movie,
    error::AppResult,
    models::{MovieQuery, NewMovie},
};

// 15 bound parameters per row keeps each statement well under SQLite's limit.
const INSERT_CHUNK: usize = 500;

const MAX_BOUND: u64 = i64::MAX as u64;

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends every movie in one transaction. Either all rows are stored or
    /// none are.
    pub async fn insert_batch(&self, movies: Vec<NewMovie>) -> AppResult<usize> {
        let total = movies.len();
        if total == 0 {
            return Ok(0);
        }

        let txn = self.db.begin().await?;

        let mut rows = movies.into_iter().map(movie::ActiveModel::from);
        loop {
            let chunk: Vec<_> = rows.by_ref().take(INSERT_CHUNK).collect();
            if chunk.is_empty() {
                break;
            }
            movie::Entity::insert_many(chunk).exec(&txn).await?;
        }

        txn.commit().await?;

        Ok(total)
    }

    /// Returns the filtered total and the requested page.
    pub async fn list(&self, query: &MovieQuery) -> AppResult<(u64, Vec<movie::Model>)> {
        let select = movie::Entity::find()
            .apply_if(query.filter.original_language.clone(), |q, lang| {
                q.filter(movie::Column::OriginalLanguage.eq(lang))
            })
            .order_by(query.sort_by.column(), query.sort_order.as_order())
            .order_by_asc(movie::Column::Id);

        let total = select.clone().count(&self.db).await?;

        // SQLite binds LIMIT and OFFSET as i64.
        let limit = query.per_page.clamp(1, MAX_BOUND);
        let offset = query.page.saturating_sub(1).checked_mul(limit).filter(|&o| o < total);
        let Some(offset) = offset else {
            return Ok((total, Vec::new()));
        };

        let movies = select.offset(offset).limit(limit).all(&self.db).await?;

        Ok((total, movies))
    }

    #[cfg(test)]
    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{MovieFilter, SortField, SortOrder},
        test_support::temp_store,
    };

    fn movie(title: &str, lang: Option<&str>, date: Option<&str>) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            original_language: lang.map(str::to_string),
            release_date: date.map(|d| d.parse().unwrap()),
            ..Default::default()
        }
    }

    fn query(page: u64, per_page: u64) -> MovieQuery {
        MovieQuery {
            filter: MovieFilter::default(),
            sort_by: SortField::Title,
            sort_order: SortOrder::Asc,
            page,
            per_page,
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (store, _dir) = temp_store().await;
        assert_eq!(store.insert_batch(Vec::new()).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let (store, _dir) = temp_store().await;
        let batch = vec![movie("B", None, None), movie("A", None, None), movie("C", None, None)];
        assert_eq!(store.insert_batch(batch).await.unwrap(), 3);

        let (total, rows) = store.list(&query(1, 10)).await.unwrap();
        assert_eq!(total, 3);
        let titles: Vec<_> = rows.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);

        let mut ids: Vec<_> = rows.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn batches_larger_than_one_chunk_are_stored() {
        let (store, _dir) = temp_store().await;
        let batch =
            (0..INSERT_CHUNK + 7).map(|i| movie(&format!("m{i:04}"), None, None)).collect();
        store.insert_batch(batch).await.unwrap();
        assert_eq!(store.count().await.unwrap(), (INSERT_CHUNK + 7) as u64);
    }

    #[tokio::test]
    async fn list_filters_orders_and_pages() {
        let (store, _dir) = temp_store().await;
        store
            .insert_batch(vec![
                movie("One", Some("en"), Some("2001-01-01")),
                movie("Two", Some("fr"), Some("2002-01-01")),
                movie("Three", Some("en"), Some("2003-01-01")),
                movie("Four", Some("en"), None),
            ])
            .await
            .unwrap();

        let mut q = query(1, 2);
        q.filter.original_language = Some("en".to_string());
        q.sort_by = SortField::ReleaseDate;
        q.sort_order = SortOrder::Desc;

        let (total, rows) = store.list(&q).await.unwrap();
        assert_eq!(total, 3);
        let titles: Vec<_> = rows.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Three", "One"]);

        q.page = 2;
        let (_, rows) = store.list(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Four");

        q.page = 9;
        let (total, rows) = store.list(&q).await.unwrap();
        assert_eq!(total, 3);
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn pages_beyond_any_offset_are_empty() {
        let (store, _dir) = temp_store().await;
        store.insert_batch(vec![movie("One", None, None), movie("Two", None, None)]).await.unwrap();

        let cases = [(1_000_000_000_000_000_000, 10), (u64::MAX, u64::MAX), (2, u64::MAX)];
        for (page, per_page) in cases {
            let (total, rows) = store.list(&query(page, per_page)).await.unwrap();
            assert_eq!(total, 2);
            assert!(rows.is_empty(), "page {page} of {per_page}");
        }

        let (total, rows) = store.list(&query(1, u64::MAX)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 2);
    }
}
