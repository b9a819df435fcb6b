//! Order placement and back-office follow-up

use super::model::{Order, OrderInput, OrderLine, OrderStatus};
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
const NOT_FOUND: &str = "Commande non trouvée";
const INVALID_STATUS: &str = "Statut invalide";

/// Query string of `GET /orders`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub statut: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Value>,
    pub pagination: PaginationMeta,
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn Repository<Order>>,
    products: ProductService,
    codes: Arc<CodeGenerator>,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn Repository<Order>>,
        products: ProductService,
        codes: Arc<CodeGenerator>,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders,
            products,
            codes,
            notifier,
        }
    }

    /// Place an order at current catalog prices
    pub async fn create(&self, input: OrderInput) -> Result<Value, ApiError> {
        let mut lines = Vec::with_capacity(input.produits.len());
        for item in input.produits {
            let product_id = item
                .produit_id
                .ok_or_else(|| ApiError::validation("ID produit manquant"))?;
            let quantity = item.quantite.unwrap_or(1);

            let product = self
                .products
                .find(&product_id)
                .await
                .map_err(|e| match e {
                    ApiError::NotFound(_) => {
                        ApiError::not_found(format!("Produit {} non trouvé", product_id))
                    }
                    other => other,
                })?;

            if product.stock < i64::from(quantity) {
                return Err(ApiError::bad_request(format!(
                    "Stock insuffisant pour {}",
                    product.name
                )));
            }

            lines.push(OrderLine {
                product_id: product.id,
                quantity,
                unit_price: product.price,
                customization: item.personnalisation.unwrap_or_default(),
            });
        }

        let order = Order::new(
            Client::from(input.client),
            lines,
            input.instructions.unwrap_or_default(),
            Utc::now(),
        );
        let order = self
            .codes
            .insert_with_code(order, self.orders.as_ref())
            .await?;
        tracing::info!(
            code = order.code.as_deref().unwrap_or_default(),
            total = order.total,
            "order placed"
        );

        self.notifier.order_confirmation(&order).await;
        self.populate(&order).await
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<OrderPage, ApiError> {
        let mut filter = Filter::new();
        if let Some(status) = query.statut.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.eq("statut", status);
        }

        let page = query.list.page();
        let limit = query.list.limit(DEFAULT_PAGE_SIZE);
        let options = FindOptions::page(
            query.list.sort(Order::sortable_fields()),
            query.list.skip(DEFAULT_PAGE_SIZE),
            limit,
        );

        let total = self.orders.count(&filter).await?;
        let orders = self.orders.find_many(&filter, &options).await?;

        let ids: Vec<Uuid> = orders
            .iter()
            .flat_map(|o| o.lines.iter().map(|l| l.product_id))
            .collect();
        let summaries = self.products.summaries(ids).await?;
        let orders = orders
            .iter()
            .map(|order| with_line_products(order, &summaries))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderPage {
            orders,
            pagination: PaginationMeta::new(page, limit, total),
        })
    }

    pub async fn get(&self, id: &Uuid) -> Result<Value, ApiError> {
        let order = self.find(id).await?;
        self.populate(&order).await
    }

    /// Move an order to `status` and tell the customer
    pub async fn update_status(&self, id: &Uuid, status: Option<&str>) -> Result<Value, ApiError> {
        let status = status
            .and_then(OrderStatus::parse)
            .ok_or_else(|| ApiError::bad_request(INVALID_STATUS))?;

        let mut order = self.find(id).await?;
        order.status = status;
        order.updated_at = Utc::now();

        let order = self
            .orders
            .update_by_id(id, order)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(
            code = order.code.as_deref().unwrap_or_default(),
            statut = status.as_str(),
            "order status changed"
        );

        self.notifier.order_status(&order).await;
        self.populate(&order).await
    }

    async fn find(&self, id: &Uuid) -> Result<Order, ApiError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    async fn populate(&self, order: &Order) -> Result<Value, ApiError> {
        let ids: Vec<Uuid> = order.lines.iter().map(|l| l.product_id).collect();
        let summaries = self.products.summaries(ids).await?;
        with_line_products(order, &summaries)
    }
}
