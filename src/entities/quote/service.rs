//! Quote requests

use super::model::{Quote, QuoteInput, QuoteLine, QuoteStatus, QuoteStatusUpdate};
use crate::core::code::CodeGenerator;
use crate::core::error::ApiError;
use crate::core::query::{ListParams, PaginationMeta};
use crate::entities::client::Client;
use crate::entities::product::service::{ProductService, with_line_products};
use crate::notify::Notifier;
use crate::storage::{Filter, FindOptions, Record, Repository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
const NOT_FOUND: &str = "Devis non trouvé";

/// Query string of `GET /quotes`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub statut: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuotePage {
    pub quotes: Vec<Value>,
    pub pagination: PaginationMeta,
}

#[derive(Clone)]
pub struct QuoteService {
    quotes: Arc<dyn Repository<Quote>>,
    products: ProductService,
    codes: Arc<CodeGenerator>,
    notifier: Notifier,
}

impl QuoteService {
    pub fn new(
        quotes: Arc<dyn Repository<Quote>>,
        products: ProductService,
        codes: Arc<CodeGenerator>,
        notifier: Notifier,
    ) -> Self {
        Self {
            quotes,
            products,
            codes,
            notifier,
        }
    }

    pub async fn create(&self, input: QuoteInput) -> Result<Value, ApiError> {
        let mut lines = Vec::with_capacity(input.produits.len());
        for item in input.produits {
            let product_id = item
                .produit_id
                .ok_or_else(|| ApiError::validation("ID produit manquant"))?;
            let product = self.products.find(&product_id).await.map_err(|e| match e {
                ApiError::NotFound(_) => {
                    ApiError::not_found(format!("Produit {} non trouvé", product_id))
                }
                other => other,
            })?;

            lines.push(QuoteLine {
                product_id: product.id,
                quantity: item.quantite.unwrap_or(1),
                requirements: item.besoins_specifiques.unwrap_or_default(),
            });
        }

        let quote = Quote::new(
            Client::from(input.client),
            lines,
            input.notes.unwrap_or_default(),
            Utc::now(),
        );
        let quote = self
            .codes
            .insert_with_code(quote, self.quotes.as_ref())
            .await?;
        tracing::info!(
            code = quote.code.as_deref().unwrap_or_default(),
            lines = quote.lines.len(),
            "quote requested"
        );

        self.notifier.quote_confirmation(&quote).await;
        self.populate(&quote).await
    }

    pub async fn list(&self, query: &QuoteQuery) -> Result<QuotePage, ApiError> {
        let mut filter = Filter::new();
        if let Some(status) = query.statut.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.eq("statut", status);
        }

        let page = query.list.page();
        let limit = query.list.limit(DEFAULT_PAGE_SIZE);
        let options = FindOptions::page(
            query.list.sort(Quote::sortable_fields()),
            query.list.skip(DEFAULT_PAGE_SIZE),
            limit,
        );

        let total = self.quotes.count(&filter).await?;
        let quotes = self.quotes.find_many(&filter, &options).await?;

        let ids: Vec<Uuid> = quotes
            .iter()
            .flat_map(|q| q.lines.iter().map(|l| l.product_id))
            .collect();
        let summaries = self.products.summaries(ids).await?;
        let quotes = quotes
            .iter()
            .map(|quote| with_line_products(quote, &summaries))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuotePage {
            quotes,
            pagination: PaginationMeta::new(page, limit, total),
        })
    }

    pub async fn get(&self, id: &Uuid) -> Result<Value, ApiError> {
        let quote = self.find(id).await?;
        self.populate(&quote).await
    }

    /// Set the status, and replace the notes when given
    pub async fn update_status(
        &self,
        id: &Uuid,
        update: QuoteStatusUpdate,
    ) -> Result<Value, ApiError> {
        let status = update
            .statut
            .as_deref()
            .and_then(QuoteStatus::parse)
            .ok_or_else(|| ApiError::bad_request("Statut invalide"))?;

        let mut quote = self.find(id).await?;
        quote.status = status;
        if let Some(notes) = update.notes {
            quote.notes = notes;
        }
        quote.updated_at = Utc::now();

        let quote = self
            .quotes
            .update_by_id(id, quote)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(
            code = quote.code.as_deref().unwrap_or_default(),
            statut = status.as_str(),
            "quote status changed"
        );
        self.populate(&quote).await
    }

    async fn find(&self, id: &Uuid) -> Result<Quote, ApiError> {
        self.quotes
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    async fn populate(&self, quote: &Quote) -> Result<Value, ApiError> {
        let ids: Vec<Uuid> = quote.lines.iter().map(|l| l.product_id).collect();
        let summaries = self.products.summaries(ids).await?;
        with_line_products(quote, &summaries)
    }
}
