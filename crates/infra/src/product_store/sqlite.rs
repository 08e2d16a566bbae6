//! SQLite-backed product store (default backend; `sqlite::memory:` for dev/tests).

use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use inventario_core::ProductId;
use inventario_products::{NewProduct, Product, ProductUpdate};

use super::{map_sqlx_error, ProductStore, StoreError};
use crate::config::DatabaseConfig;

#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `config.url`.
    ///
    /// An in-memory database lives only as long as its connection, so in-memory
    /// URLs get a single connection that is never recycled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| map_sqlx_error("connect", e))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
        pool_options = if is_in_memory(&config.url) {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool))
    }

    /// Fresh, empty in-memory store with the schema in place.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect(&DatabaseConfig::in_memory()).await?;
        store.ensure_schema().await?;
        Ok(store)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_product", e);

    let id: i64 = row.try_get("id").map_err(decode)?;
    Ok(Product {
        id: ProductId::new(id).map_err(|e| StoreError::database("decode_product", e.to_string()))?,
        nombre: row.try_get("nombre").map_err(decode)?,
        descripcion: row.try_get("descripcion").map_err(decode)?,
        codigo_barras: row.try_get("codigo_barras").map_err(decode)?,
        categoria: row.try_get("categoria").map_err(decode)?,
        precio: row.try_get::<f64, _>("precio").map_err(decode)?,
        stock: row.try_get::<i32, _>("stock").map_err(decode)?,
        proveedor: row.try_get("proveedor").map_err(decode)?,
        fecha_ingreso: row.try_get::<NaiveDateTime, _>("fecha_ingreso").map_err(decode)?,
        activo: row.try_get::<bool, _>("activo").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl ProductStore for SqliteProductStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS productos (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                nombre         TEXT     NOT NULL,
                descripcion    TEXT     NOT NULL,
                codigo_barras  TEXT     NOT NULL UNIQUE,
                categoria      TEXT     NOT NULL,
                precio         REAL     NOT NULL,
                stock          INTEGER  NOT NULL DEFAULT 0,
                proveedor      TEXT     NOT NULL,
                fecha_ingreso  DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                activo         INTEGER  NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(codigo_barras = %product.codigo_barras), err)]
    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        let f = &product.fields;
        let result = sqlx::query(
            r#"
            INSERT INTO productos (
                nombre, descripcion, codigo_barras, categoria, precio, stock, proveedor, activo
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&f.nombre)
        .bind(&f.descripcion)
        .bind(&product.codigo_barras)
        .bind(&f.categoria)
        .bind(f.precio.get())
        .bind(f.stock)
        .bind(&f.proveedor)
        .bind(f.activo)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        ProductId::new(result.last_insert_rowid())
            .map_err(|e| StoreError::database("insert", e.to_string()))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, nombre, descripcion, codigo_barras, categoria,
                precio, stock, proveedor, fecha_ingreso, activo
            FROM productos
            ORDER BY nombre ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, update), fields(id = %update.id), err)]
    async fn update(&self, update: &ProductUpdate) -> Result<u64, StoreError> {
        let f = &update.fields;
        let result = sqlx::query(
            r#"
            UPDATE productos
            SET nombre = ?1, descripcion = ?2, categoria = ?3, precio = ?4,
                stock = ?5, proveedor = ?6, activo = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&f.nombre)
        .bind(&f.descripcion)
        .bind(&f.categoria)
        .bind(f.precio.get())
        .bind(f.stock)
        .bind(&f.proveedor)
        .bind(f.activo)
        .bind(update.id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: ProductId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM productos WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
