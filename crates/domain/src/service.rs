//! Restaurant service: one lock per restaurant, snapshot after every change.

use std::time::Instant;

use chrono::NaiveDate;
use common::{MenuItemId, OrderId};
use snapshot_store::{SaveOptions, Snapshot, SnapshotStore, Version};
use tokio::sync::Mutex;

use crate::catalog::{MenuItem, MenuItemUpdate, NewMenuItem};
use crate::error::DomainError;
use crate::ledger::IngredientStock;
use crate::order::{Order, OrderStatus};
use crate::reports::{PopularItem, Summary};
use crate::restaurant::{Restaurant, RestaurantError};

struct ServiceState {
    restaurant: Restaurant,
    version: Version,
}

/// Service owning one restaurant and its persistence gateway.
///
/// All operations are serialized behind a single mutex, which is what makes
/// the check-then-commit order placement safe with concurrent callers.
/// Mutations are applied in memory first and then persisted; if persisting
/// fails the in-memory change is rolled back and
/// [`DomainError::Persistence`] is returned.
pub struct RestaurantService<S: SnapshotStore> {
    store: S,
    state: Mutex<ServiceState>,
}

impl<S: SnapshotStore> RestaurantService<S> {
    /// Creates a service over an empty restaurant.
    ///
    /// The store is expected to be empty too; use [`Self::load`] to resume.
    pub fn new(store: S) -> Self {
        Self::with_restaurant(store, Restaurant::new(), Version::initial())
    }

    /// Resumes from the store's latest snapshot, or starts empty.
    #[tracing::instrument(skip(store))]
    pub async fn load(store: S) -> Result<Self, DomainError> {
        let (restaurant, version) = match store.load_snapshot().await? {
            Some(snapshot) => {
                let version = snapshot.version;
                let mut restaurant: Restaurant = snapshot.into_state()?;
                restaurant.refresh_availability();
                tracing::info!(%version, "restaurant restored from snapshot");
                (restaurant, version)
            }
            None => {
                tracing::info!("no snapshot found, starting empty");
                (Restaurant::new(), Version::initial())
            }
        };
        Ok(Self::with_restaurant(store, restaurant, version))
    }

    fn with_restaurant(store: S, restaurant: Restaurant, version: Version) -> Self {
        Self {
            store,
            state: Mutex::new(ServiceState {
                restaurant,
                version,
            }),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the version of the last persisted snapshot.
    pub async fn version(&self) -> Version {
        self.state.lock().await.version
    }

    /// Runs a read-only query against the current state.
    pub async fn read<T>(&self, query: impl FnOnce(&Restaurant) -> T) -> T {
        let state = self.state.lock().await;
        query(&state.restaurant)
    }

    /// Runs a mutation, then persists a snapshot of the result.
    ///
    /// Every call, successful or not, lands in `command_duration_seconds`.
    async fn execute<T, F>(&self, command: &'static str, mutation: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut Restaurant) -> Result<T, RestaurantError>,
    {
        let started = Instant::now();
        let result = self.apply_and_persist(command, mutation).await;
        metrics::histogram!(
            "command_duration_seconds",
            "command" => command,
            "outcome" => command_outcome(&result)
        )
        .record(started.elapsed().as_secs_f64());
        result
    }

    async fn apply_and_persist<T, F>(
        &self,
        command: &'static str,
        mutation: F,
    ) -> Result<T, DomainError>
    where
        F: FnOnce(&mut Restaurant) -> Result<T, RestaurantError>,
    {
        let mut state = self.state.lock().await;
        let backup = state.restaurant.clone();

        let output = match mutation(&mut state.restaurant) {
            Ok(output) => output,
            Err(e) => {
                metrics::counter!("commands_rejected_total", "command" => command).increment(1);
                tracing::info!(command, error = %e, "command rejected");
                return Err(e.into());
            }
        };

        let current = state.version;
        let saved = match Snapshot::from_state(current.next(), &state.restaurant) {
            Ok(snapshot) => {
                self.store
                    .save_snapshot(snapshot, SaveOptions::expect_version(current))
                    .await
                    .map_err(DomainError::from)
            }
            Err(e) => Err(e.into()),
        };

        match saved {
            Ok(version) => state.version = version,
            Err(e) => {
                state.restaurant = backup;
                metrics::counter!("snapshot_save_failures_total").increment(1);
                tracing::warn!(command, error = %e, "snapshot failed, change rolled back");
                return Err(e);
            }
        }
        Ok(output)
    }
}

/// Metric label: `ok`, `rejected` (domain refusal) or `failed` (persistence).
fn command_outcome<T>(result: &Result<T, DomainError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DomainError::Restaurant(_)) => "rejected",
        Err(_) => "failed",
    }
}

// Commands
impl<S: SnapshotStore> RestaurantService<S> {
    #[tracing::instrument(skip(self))]
    pub async fn register_ingredient(
        &self,
        name: &str,
        quantity: f64,
        unit: &str,
        reorder_level: f64,
    ) -> Result<(), DomainError> {
        self.execute("register_ingredient", |r| {
            r.register_ingredient(name, quantity, unit, reorder_level)
        })
        .await
    }

    /// Adds stock and returns the new quantity.
    #[tracing::instrument(skip(self))]
    pub async fn restock(&self, name: &str, amount: f64) -> Result<f64, DomainError> {
        let quantity = self.execute("restock", |r| r.restock(name, amount)).await?;
        metrics::counter!("restocks_total").increment(1);
        Ok(quantity)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItemId, DomainError> {
        self.execute("add_menu_item", |r| r.add_menu_item(item)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_menu_item(
        &self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<(), DomainError> {
        self.execute("update_menu_item", |r| r.update_menu_item(id, update))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_menu_item(&self, id: MenuItemId) -> Result<MenuItem, DomainError> {
        self.execute("remove_menu_item", |r| r.remove_menu_item(id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        customer_name: &str,
        table_number: u32,
    ) -> Result<OrderId, DomainError> {
        self.execute("create_order", |r| r.create_order(customer_name, table_number))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_order_line(
        &self,
        order_id: OrderId,
        menu_item_id: MenuItemId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        self.execute("add_order_line", |r| {
            r.add_order_line(order_id, menu_item_id, quantity)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_order_line(
        &self,
        order_id: OrderId,
        menu_item_id: MenuItemId,
    ) -> Result<(), DomainError> {
        self.execute("remove_order_line", |r| {
            r.remove_order_line(order_id, menu_item_id)
        })
        .await
    }

    /// Places a pending order, consuming its ingredients atomically.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        match self.execute("place_order", |r| r.place_order(order_id)).await {
            Ok(()) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(%order_id, "order placed");
                Ok(())
            }
            Err(e) => {
                if let Some(RestaurantError::InsufficientIngredients { .. }) = e.as_restaurant() {
                    metrics::counter!("orders_rejected_total").increment(1);
                }
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn advance_order_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<(), DomainError> {
        self.execute("advance_order_status", |r| {
            r.advance_order_status(order_id, target)
        })
        .await
    }
}

// Queries
impl<S: SnapshotStore> RestaurantService<S> {
    pub async fn low_stock_alerts(&self) -> Vec<IngredientStock> {
        self.read(|r| r.low_stock_alerts().into_iter().cloned().collect())
            .await
    }

    pub async fn items_by_category(&self) -> Vec<(String, Vec<MenuItem>)> {
        self.read(|r| {
            r.items_by_category()
                .into_iter()
                .map(|(category, items)| {
                    (category.to_string(), items.into_iter().cloned().collect())
                })
                .collect()
        })
        .await
    }

    pub async fn ingredient(&self, name: &str) -> Option<IngredientStock> {
        self.read(|r| r.ledger().get(name).cloned()).await
    }

    pub async fn menu_item(&self, id: MenuItemId) -> Option<MenuItem> {
        self.read(|r| r.catalog().get(id).cloned()).await
    }

    /// Menu items currently marked available, in catalog order.
    pub async fn available_items(&self) -> Vec<MenuItem> {
        self.read(|r| r.catalog().available_items().cloned().collect())
            .await
    }

    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.read(|r| r.order(id).cloned()).await
    }

    pub async fn active_orders(&self) -> Vec<Order> {
        self.read(|r| r.active_orders().into_iter().cloned().collect())
            .await
    }

    pub async fn order_history(&self) -> Vec<Order> {
        self.read(|r| r.order_history().into_iter().cloned().collect())
            .await
    }

    pub async fn summary(&self) -> Summary {
        self.read(Restaurant::summary).await
    }

    pub async fn sales_on(&self, date: NaiveDate) -> crate::Money {
        self.read(|r| r.sales_on(date)).await
    }

    pub async fn popular_items(&self, limit: usize) -> Vec<PopularItem> {
        self.read(|r| r.popular_items(limit)).await
    }
}
