use chrono::NaiveDateTime;
use serde_json::{json, Value};

use inventario_products::{product::format_fixed2, Product};

/// `fecha_ingreso` wire format (the SQL `DATETIME` text form).
pub const FECHA_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Envelope status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// `{ "status": ..., "message": ..., "data": ... }`
pub fn envelope(status: Status, message: impl Into<String>, data: Value) -> Value {
    json!({
        "status": status.as_str(),
        "message": message.into(),
        "data": data,
    })
}

pub fn product_to_json(p: Product) -> Value {
    json!({
        "id": p.id.get(),
        "nombre": p.nombre,
        "descripcion": p.descripcion,
        "codigo_barras": p.codigo_barras,
        "categoria": p.categoria,
        "precio": format_fixed2(p.precio),
        "stock": p.stock,
        "proveedor": p.proveedor,
        "fecha_ingreso": format_fecha(&p.fecha_ingreso),
        "activo": u8::from(p.activo),
    })
}

pub fn products_to_json(products: Vec<Product>) -> Value {
    Value::Array(products.into_iter().map(product_to_json).collect())
}

fn format_fecha(ts: &NaiveDateTime) -> String {
    ts.format(FECHA_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inventario_core::ProductId;

    fn sample() -> Product {
        Product {
            id: ProductId::new(1).unwrap(),
            nombre: "Martillo".into(),
            descripcion: "Martillo de carpintero".into(),
            codigo_barras: "7790001".into(),
            categoria: "Herramientas".into(),
            precio: 10.5,
            stock: 4,
            proveedor: "Ferreteria Sur".into(),
            fecha_ingreso: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(8, 5, 0)
                .unwrap(),
            activo: false,
        }
    }

    #[test]
    fn product_json_formats_price_date_and_flag() {
        let v = product_to_json(sample());
        assert_eq!(v["precio"], "10.50");
        assert_eq!(v["fecha_ingreso"], "2024-03-09 08:05:00");
        assert_eq!(v["activo"], 0);
        assert_eq!(v["id"], 1);
        assert_eq!(v["stock"], 4);
    }

    #[test]
    fn envelope_has_null_data_by_default() {
        let v = envelope(Status::Error, "boom", Value::Null);
        assert_eq!(v, json!({"status": "error", "message": "boom", "data": null}));
    }
}
