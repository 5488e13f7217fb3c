use serde::Serialize;

use crate::api::controller::Controller;
use crate::api::pipeline::{Exchange, Flow, Step};
use crate::api::request::CrudRequest;
use crate::error::CrudResult;
use crate::model::{Document, Message, Query};

/// Upper bound for the `limit` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Paging metadata exposed to the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paging {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
    pub total: u64,
    pub pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Paging {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let pages = total.div_ceil(limit).max(1);
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
            total,
            pages,
            has_previous: page > 1,
            has_next: page < pages,
        }
    }

    /// A single page holding every record.
    pub fn unpaged(total: u64) -> Self {
        Self::new(1, total.max(1), total)
    }

    /// Page bounds from `?page=` and `?limit=`, falling back to the default size.
    pub fn requested(request: &CrudRequest, default_limit: u64) -> (u64, u64) {
        let param = |name: &str| {
            request
                .query
                .get(name)
                .and_then(|value| value.parse::<u64>().ok())
        };
        let page = param("page").unwrap_or(1).max(1);
        let limit = param("limit")
            .unwrap_or(default_limit)
            .clamp(1, MAX_PAGE_SIZE.max(default_limit));
        (page, limit)
    }
}

/// Fetches the current page of the list and attaches items and paging
/// metadata to the context before the list handler runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginate;

impl Paginate {
    async fn fetch(
        &self,
        controller: &Controller,
        request: &CrudRequest,
        query: Query,
        no_pagination: bool,
        page_size: u64,
    ) -> CrudResult<(Vec<Document>, Paging)> {
        let entity = controller.entity();
        let query = (!query.is_empty()).then_some(query);

        if no_pagination {
            let items = entity.read(query).await?;
            let paging = Paging::unpaged(items.len() as u64);
            return Ok((items, paging));
        }

        let (page, limit) = Paging::requested(request, page_size);
        let total = entity.count(query.clone()).await?;
        let paging = Paging::new(page, limit, total);
        let items = entity.read_limit(query, paging.skip, paging.limit).await?;
        Ok((items, paging))
    }
}

#[async_trait::async_trait]
impl Step for Paginate {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let opts = exchange.context.options();
        let (no_pagination, page_size) = (opts.no_pagination, opts.page_size);
        let query = controller.list_query(opts, &exchange.request);

        let fetched = self
            .fetch(controller, &exchange.request, query, no_pagination, page_size)
            .await;
        let context = match fetched {
            Ok((items, paging)) => {
                let items = items.into_iter().map(|doc| controller.sanitize(doc)).collect();
                exchange.context.with_items(items, paging)
            }
            Err(err) => {
                log::warn!("Failed to paginate {}: {}", exchange.request.path, err);
                exchange
                    .context
                    .with_items(Vec::new(), Paging::new(1, page_size, 0))
                    .with_error(Message::from(&err))
            }
        };
        Flow::Next(Exchange { context, ..exchange })
    }
}
