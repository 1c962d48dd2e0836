use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::domain::location::LocationSummary;
use crate::domain::opening_hours::OpenStatus;
use crate::domain::search::{Pagination, SearchFilter};
use crate::usecase::cache::TtlCache;
use crate::usecase::contracts::LocationRepository;
use crate::usecase::error::UsecaseError;

/// Cached store result: one page of rows plus the total match count.
pub type SearchCache = TtlCache<String, (Vec<LocationSummary>, i64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub summary: LocationSummary,
    pub open_status: OpenStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub pagination: Pagination,
    pub total: i64,
}

pub struct SearchUseCase<L>
where
    L: LocationRepository,
{
    location_repository: L,
    cache: SearchCache,
    timezone: Tz,
}

impl<L> SearchUseCase<L>
where
    L: LocationRepository,
{
    pub fn new(location_repository: L, cache: SearchCache, timezone: Tz) -> Self {
        Self {
            location_repository,
            cache,
            timezone,
        }
    }

    pub async fn search(&self, filter: SearchFilter, pagination: Pagination) -> Result<SearchPage, UsecaseError> {
        self.search_at(filter, pagination, Utc::now()).await
    }

    /// Open-now can not be expressed in SQL, so it is applied to the full
    /// ordered match set and the page is cut afterwards; the total is the
    /// number of open matches. Other searches page and count in the store
    /// and are cached.
    #[tracing::instrument(skip(self, filter), fields(open_now = filter.open_now, page = pagination.page, per_page = pagination.per_page))]
    pub async fn search_at(
        &self,
        filter: SearchFilter,
        pagination: Pagination,
        now: DateTime<Utc>,
    ) -> Result<SearchPage, UsecaseError> {
        tracing::debug!(?filter, "searching locations");
        metrics::counter!("location_searches_total", "open_now" => filter.open_now.to_string()).increment(1);

        if filter.open_now {
            let rows = self.location_repository.search(&filter, None).await?;
            let open: Vec<SearchHit> = rows
                .into_iter()
                .map(|summary| self.hit(summary, now))
                .filter(|hit| hit.open_status == OpenStatus::Open)
                .collect();

            let total = open.len() as i64;
            let hits = pagination.slice(open);

            tracing::debug!(total, returned = hits.len(), "open-now search completed");
            return Ok(SearchPage {
                hits,
                pagination,
                total,
            });
        }

        let key = filter.cache_key(&pagination);
        let (rows, total) = match self.cache.get(&key) {
            Some(cached) => cached,
            None => {
                let rows = self.location_repository.search(&filter, Some(pagination)).await?;
                let total = self.location_repository.count(&filter).await?;
                self.cache.insert(key, (rows.clone(), total));
                (rows, total)
            }
        };

        let hits: Vec<SearchHit> = rows.into_iter().map(|summary| self.hit(summary, now)).collect();

        tracing::debug!(total, returned = hits.len(), "search completed");
        Ok(SearchPage {
            hits,
            pagination,
            total,
        })
    }

    fn hit(&self, summary: LocationSummary, now: DateTime<Utc>) -> SearchHit {
        let open_status = summary.location.hours().status_at(self.timezone, now);
        SearchHit {
            summary,
            open_status,
        }
    }
}
