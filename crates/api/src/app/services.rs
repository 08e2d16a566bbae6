use std::sync::Arc;

use inventario_core::ProductId;
use inventario_infra::{AppConfig, ProductStore, StoreError};
use inventario_products::{ActionKind, Product, ProductAction};

/// Response shaping switches (see `AppConfig`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseOptions {
    pub read_envelope: bool,
    pub expose_db_errors: bool,
}

impl From<&AppConfig> for ResponseOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            read_envelope: config.read_envelope,
            expose_db_errors: config.expose_db_errors,
        }
    }
}

/// What executing one action produced.
#[derive(Debug)]
pub enum ActionOutcome {
    Created(ProductId),
    Listed(Vec<Product>),
    Updated,
    Deleted,
    /// The statement ran but matched no row (update/delete only).
    NoRowsAffected(ActionKind),
    Failed { kind: ActionKind, error: StoreError },
}

/// Per-process services shared by every request.
///
/// Holds no product state: each request goes straight to the store.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn ProductStore>,
    options: ResponseOptions,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductStore>, options: ResponseOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> ResponseOptions {
        self.options
    }

    /// Run exactly one statement for `action`. Never retries.
    pub async fn execute(&self, action: ProductAction) -> ActionOutcome {
        let kind = action.kind();
        let result = match action {
            ProductAction::Create(product) => self.store.insert(&product).await.map(ActionOutcome::Created),
            ProductAction::Read => self.store.list().await.map(ActionOutcome::Listed),
            ProductAction::Update(update) => self
                .store
                .update(&update)
                .await
                .map(|affected| affected_outcome(kind, affected, ActionOutcome::Updated)),
            ProductAction::Delete(id) => self
                .store
                .delete(id)
                .await
                .map(|affected| affected_outcome(kind, affected, ActionOutcome::Deleted)),
        };

        match result {
            Ok(outcome) => {
                tracing::info!(action = %kind, outcome = outcome_label(&outcome), "action executed");
                outcome
            }
            Err(error) => {
                if error.is_unique_violation() {
                    tracing::info!(action = %kind, error = %error, "action rejected by unique constraint");
                } else {
                    tracing::error!(action = %kind, backend = self.store.backend(), error = %error, "action failed");
                }
                ActionOutcome::Failed { kind, error }
            }
        }
    }
}

fn affected_outcome(kind: ActionKind, affected: u64, done: ActionOutcome) -> ActionOutcome {
    if affected == 0 {
        ActionOutcome::NoRowsAffected(kind)
    } else {
        done
    }
}

fn outcome_label(outcome: &ActionOutcome) -> &'static str {
    match outcome {
        ActionOutcome::Created(_) => "created",
        ActionOutcome::Listed(_) => "listed",
        ActionOutcome::Updated => "updated",
        ActionOutcome::Deleted => "deleted",
        ActionOutcome::NoRowsAffected(_) => "no_rows_affected",
        ActionOutcome::Failed { .. } => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventario_infra::product_store::SqliteProductStore;
    use inventario_products::{NewProduct, Price, ProductFields, ProductUpdate};

    fn fields(nombre: &str) -> ProductFields {
        ProductFields {
            nombre: nombre.to_string(),
            descripcion: "desc".to_string(),
            categoria: "cat".to_string(),
            precio: Price::new(1.5).unwrap(),
            stock: 0,
            proveedor: "prov".to_string(),
            activo: true,
        }
    }

    async fn services() -> AppServices {
        let store = SqliteProductStore::in_memory().await.unwrap();
        AppServices::new(Arc::new(store), ResponseOptions::default())
    }

    #[tokio::test]
    async fn zero_affected_rows_is_reported_per_action() {
        let svc = services().await;
        let missing = ProductId::new(999).unwrap();

        let outcome = svc
            .execute(ProductAction::Update(ProductUpdate { id: missing, fields: fields("x") }))
            .await;
        assert!(matches!(outcome, ActionOutcome::NoRowsAffected(ActionKind::Update)));

        let outcome = svc.execute(ProductAction::Delete(missing)).await;
        assert!(matches!(outcome, ActionOutcome::NoRowsAffected(ActionKind::Delete)));
    }

    #[tokio::test]
    async fn duplicate_create_fails_with_unique_violation() {
        let svc = services().await;
        let p = NewProduct { codigo_barras: "dup".to_string(), fields: fields("a") };

        assert!(matches!(svc.execute(ProductAction::Create(p.clone())).await, ActionOutcome::Created(_)));
        match svc.execute(ProductAction::Create(p)).await {
            ActionOutcome::Failed { kind, error } => {
                assert_eq!(kind, ActionKind::Create);
                assert!(error.is_unique_violation());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
