//! Per-target record schemas and the uniform form contracts they map onto
//!
//! Each adapter returns clients, products and orders in its own shape:
//! differing id fields (`_id`, `id`, `ClienteId`, `cliente_id`), casing
//! (PascalCase on MS SQL), decimals encoded as strings (MySQL) and nested
//! order documents (Neo4j). The structs below describe those shapes as-is;
//! `services::mapping` converts between them and the forms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// UNIFORM FORMS
// =============================================================================

/// Free-form client preference, `texto` holds comma-separated values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferencia {
    pub categoria: String,
    pub texto: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClienteForm {
    pub nombre: String,
    pub email: String,
    pub genero: String,
    pub pais: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferencias: Vec<Preferencia>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductoForm {
    pub nombre: String,
    pub categoria: String,
    /// Target-specific product code (Mongo code, SKU, alternate code...)
    pub codigo: String,
    #[serde(
        rename = "categoriasAdicionales",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub categorias_adicionales: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenItemForm {
    pub producto_id: String,
    pub cantidad: u32,
    pub precio_unit: f64,
    /// Discount percentage, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descuento_pct: Option<f64>,
}

impl OrdenItemForm {
    pub fn subtotal(&self) -> f64 {
        self.cantidad as f64 * self.precio_unit
    }

    pub fn discount(&self) -> f64 {
        self.subtotal() * (self.descuento_pct.unwrap_or(0.0) / 100.0)
    }

    pub fn total(&self) -> f64 {
        self.subtotal() - self.discount()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenForm {
    pub cliente_id: String,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    pub items: Vec<OrdenItemForm>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

impl OrdenForm {
    /// Order total with per-item percentage discounts applied
    pub fn computed_total(&self) -> f64 {
        self.items.iter().map(OrdenItemForm::total).sum()
    }
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Numeric column that some adapters encode as a string (MySQL DECIMAL)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    /// Numeric value; unparseable text yields `None`
    pub fn value(&self) -> Option<f64> {
        match self {
            Decimal::Number(n) => Some(*n),
            Decimal::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Identifier that may arrive as a JSON string or number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// MONGO
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoCliente {
    #[serde(alias = "_id")]
    pub id: String,
    pub nombre: String,
    pub email: String,
    pub genero: String,
    pub pais: String,
    #[serde(default)]
    pub preferencias: Vec<Preferencia>,
    #[serde(default)]
    pub creado: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equivalencias {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoProducto {
    #[serde(alias = "_id", default)]
    pub id: Option<String>,
    pub codigo_mongo: String,
    pub nombre: String,
    pub categoria: String,
    #[serde(default)]
    pub equivalencias: Option<Equivalencias>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoOrdenItem {
    pub producto_id: String,
    pub cantidad: u32,
    pub precio_unit: f64,
    #[serde(default)]
    pub descuento_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoOrden {
    #[serde(alias = "_id", default)]
    pub id: Option<String>,
    pub cliente_id: String,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    #[serde(default)]
    pub total: Option<f64>,
    pub items: Vec<MongoOrdenItem>,
    #[serde(default)]
    pub metadatos: Option<serde_json::Value>,
}

// =============================================================================
// MS SQL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MssqlCliente {
    #[serde(default)]
    pub cliente_id: Option<i64>,
    pub nombre: String,
    pub email: String,
    pub genero: String,
    pub pais: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MssqlProducto {
    #[serde(default)]
    pub producto_id: Option<i64>,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub nombre: String,
    pub categoria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MssqlOrdenItem {
    pub producto_id: i64,
    pub cantidad: u32,
    pub precio_unit: f64,
    #[serde(default)]
    pub descuento_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MssqlOrden {
    #[serde(default)]
    pub orden_id: Option<i64>,
    pub cliente_id: i64,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<MssqlOrdenItem>,
}

// =============================================================================
// MYSQL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlCliente {
    #[serde(alias = "id", default)]
    pub cliente_id: Option<i64>,
    pub nombre: String,
    pub email: String,
    pub genero: String,
    pub pais: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlProducto {
    #[serde(default)]
    pub producto_id: Option<i64>,
    pub codigo_alt: String,
    pub nombre: String,
    pub categoria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlOrdenItem {
    pub producto_codigo_alt: String,
    pub cantidad: Decimal,
    pub precio_unit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlOrden {
    #[serde(default)]
    pub orden_id: Option<i64>,
    pub cliente_id: i64,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<MysqlOrdenItem>,
}

// =============================================================================
// SUPABASE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseCliente {
    #[serde(default)]
    pub id: Option<String>,
    pub nombre: String,
    pub email: String,
    pub genero: String,
    pub pais: String,
    #[serde(alias = "created", default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseProducto {
    #[serde(default)]
    pub id: Option<String>,
    pub sku: String,
    pub nombre: String,
    pub categoria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseOrdenItem {
    pub producto_id: String,
    pub cantidad: u32,
    pub precio_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseOrden {
    #[serde(default)]
    pub id: Option<String>,
    pub cliente_id: String,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<SupabaseOrdenItem>,
}

// =============================================================================
// NEO4J
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jCliente {
    pub id: RecordId,
    pub nombre: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub genero: Option<String>,
    #[serde(default)]
    pub pais: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jProducto {
    pub id: RecordId,
    pub nombre: String,
    #[serde(default)]
    pub categoria: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jOrdenItem {
    pub producto: Neo4jProducto,
    pub cantidad: u32,
    pub precio_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jOrdenHeader {
    pub id: RecordId,
    pub fecha: String,
    pub canal: String,
    pub moneda: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jOrden {
    pub cliente: Neo4jCliente,
    pub orden: Neo4jOrdenHeader,
    #[serde(default)]
    pub items: Vec<Neo4jOrdenItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cantidad: u32, precio_unit: f64, descuento_pct: Option<f64>) -> OrdenItemForm {
        OrdenItemForm {
            producto_id: "p1".to_string(),
            cantidad,
            precio_unit,
            descuento_pct,
        }
    }

    #[test]
    fn test_item_total_applies_percentage_discount() {
        let i = item(2, 50.0, Some(10.0));
        assert_eq!(i.subtotal(), 100.0);
        assert!((i.discount() - 10.0).abs() < 1e-9);
        assert!((i.total() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_computed_total_sums_items() {
        let orden = OrdenForm {
            cliente_id: "c1".to_string(),
            fecha: "2024-05-01".to_string(),
            canal: "WEB".to_string(),
            moneda: "USD".to_string(),
            items: vec![item(1, 10.0, None), item(3, 5.0, Some(20.0))],
            total: 0.0,
            descripcion: None,
        };
        assert!((orden.computed_total() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_decimal_accepts_text_and_numbers() {
        let d: Decimal = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(d.value(), Some(12.5));
        let d: Decimal = serde_json::from_str("3").unwrap();
        assert_eq!(d.value(), Some(3.0));
        assert_eq!(Decimal::Text("n/a".to_string()).value(), None);
    }

    #[test]
    fn test_mssql_cliente_reads_pascal_case() {
        let json = r#"{"ClienteId":4,"Nombre":"Ana","Email":"ana@x.com","Genero":"Femenino","Pais":"CR"}"#;
        let c: MssqlCliente = serde_json::from_str(json).unwrap();
        assert_eq!(c.cliente_id, Some(4));
        assert_eq!(c.nombre, "Ana");
    }

    #[test]
    fn test_mongo_producto_accepts_underscore_id() {
        let json = r#"{"_id":"66a1","codigo_mongo":"MN-1","nombre":"Café","categoria":"Bebidas"}"#;
        let p: MongoProducto = serde_json::from_str(json).unwrap();
        assert_eq!(p.id.as_deref(), Some("66a1"));
        assert!(p.equivalencias.is_none());
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Int(12).to_string(), "12");
        assert_eq!(RecordId::Text("C-9".to_string()).to_string(), "C-9");
    }
}
