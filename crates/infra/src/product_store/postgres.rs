//! Postgres-backed product store.
//!
//! `precio` is stored as `NUMERIC(10,2)` and crosses the wire as `float8` (bound with
//! an explicit cast, read back with `precio::float8`). `activo` is a `SMALLINT` 0/1.

use chrono::NaiveDateTime;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use inventario_core::ProductId;
use inventario_products::{NewProduct, Product, ProductUpdate};

use super::{map_sqlx_error, ProductStore, StoreError};
use crate::config::DatabaseConfig;

#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool))
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
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
        activo: row.try_get::<i16, _>("activo").map_err(decode)? != 0,
    })
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS productos (
                id             BIGSERIAL     PRIMARY KEY,
                nombre         TEXT          NOT NULL,
                descripcion    TEXT          NOT NULL,
                codigo_barras  TEXT          NOT NULL,
                categoria      TEXT          NOT NULL,
                precio         NUMERIC(10,2) NOT NULL,
                stock          INTEGER       NOT NULL DEFAULT 0,
                proveedor      TEXT          NOT NULL,
                fecha_ingreso  TIMESTAMP     NOT NULL DEFAULT CURRENT_TIMESTAMP,
                activo         SMALLINT      NOT NULL DEFAULT 1,
                CONSTRAINT productos_codigo_barras_key UNIQUE (codigo_barras)
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
        let row = sqlx::query(
            r#"
            INSERT INTO productos (
                nombre, descripcion, codigo_barras, categoria, precio, stock, proveedor, activo
            )
            VALUES ($1, $2, $3, $4, $5::float8, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&f.nombre)
        .bind(&f.descripcion)
        .bind(&product.codigo_barras)
        .bind(&f.categoria)
        .bind(f.precio.get())
        .bind(f.stock)
        .bind(&f.proveedor)
        .bind(i16::from(f.activo))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("insert", e))?;
        ProductId::new(id).map_err(|e| StoreError::database("insert", e.to_string()))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, nombre, descripcion, codigo_barras, categoria,
                precio::float8 AS precio, stock, proveedor, fecha_ingreso, activo
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
            SET nombre = $1, descripcion = $2, categoria = $3, precio = $4::float8,
                stock = $5, proveedor = $6, activo = $7
            WHERE id = $8
            "#,
        )
        .bind(&f.nombre)
        .bind(&f.descripcion)
        .bind(&f.categoria)
        .bind(f.precio.get())
        .bind(f.stock)
        .bind(&f.proveedor)
        .bind(i16::from(f.activo))
        .bind(update.id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: ProductId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM productos WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
