//! Field mapping between per-database records and the uniform forms
//!
//! Reading: `*Record::parse` decodes an adapter's JSON into its typed shape,
//! `to_form` flattens it into the form every screen works with.
//! Writing: `*_payload` turns a form into the create payload the target's
//! adapter expects.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::MappingError;
use crate::types::{
    ClienteForm, Decimal, Equivalencias, MongoCliente, MongoOrden, MongoProducto, MssqlCliente,
    MssqlOrden, MssqlProducto, MysqlCliente, MysqlOrden, MysqlProducto, Neo4jCliente, Neo4jOrden,
    Neo4jProducto, OrdenForm, OrdenItemForm, Preferencia, ProductoForm, SupabaseCliente,
    SupabaseOrden, SupabaseProducto, TargetDatabase,
};

fn decode<T: DeserializeOwned>(
    entity: &'static str,
    target: TargetDatabase,
    value: Value,
) -> Result<T, MappingError> {
    serde_json::from_value(value).map_err(|source| MappingError::InvalidRecord {
        entity,
        target,
        source,
    })
}

fn numeric_id(field: &'static str, target: TargetDatabase, value: &str) -> Result<i64, MappingError> {
    value.trim().parse().map_err(|_| MappingError::NonNumericId {
        field,
        target,
        value: value.to_string(),
    })
}

fn quantity(field: &'static str, value: &Decimal) -> Result<u32, MappingError> {
    let invalid = || MappingError::InvalidNumber {
        field,
        value: match value {
            Decimal::Number(n) => n.to_string(),
            Decimal::Text(s) => s.clone(),
        },
    };
    let n = value.value().ok_or_else(invalid)?;
    if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(n as u32)
}

fn amount(field: &'static str, value: &Decimal) -> Result<f64, MappingError> {
    value.value().ok_or_else(|| MappingError::InvalidNumber {
        field,
        value: match value {
            Decimal::Number(n) => n.to_string(),
            Decimal::Text(s) => s.clone(),
        },
    })
}

/// MySQL DECIMAL columns travel as two-decimal strings
fn decimal_text(value: f64) -> String {
    format!("{:.2}", value)
}

/// Mongo stores preferences as `{categoria: [values...]}`
pub fn preferencias_to_dict(preferencias: &[Preferencia]) -> Map<String, Value> {
    preferencias
        .iter()
        .map(|p| {
            let values = p
                .texto
                .split(',')
                .map(|v| Value::String(v.trim().to_string()))
                .collect();
            (p.categoria.clone(), Value::Array(values))
        })
        .collect()
}

// =============================================================================
// CLIENTES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ClienteRecord {
    Mongo(MongoCliente),
    Mssql(MssqlCliente),
    Mysql(MysqlCliente),
    Supabase(SupabaseCliente),
    Neo4j(Neo4jCliente),
}

impl ClienteRecord {
    pub fn parse(target: TargetDatabase, value: Value) -> Result<Self, MappingError> {
        const ENTITY: &str = "cliente";
        Ok(match target {
            TargetDatabase::Mongo => Self::Mongo(decode(ENTITY, target, value)?),
            TargetDatabase::Mssql => Self::Mssql(decode(ENTITY, target, value)?),
            TargetDatabase::Mysql => Self::Mysql(decode(ENTITY, target, value)?),
            TargetDatabase::Supabase => Self::Supabase(decode(ENTITY, target, value)?),
            TargetDatabase::Neo4j => Self::Neo4j(decode(ENTITY, target, value)?),
        })
    }

    pub fn id(&self) -> Option<String> {
        match self {
            Self::Mongo(c) => Some(c.id.clone()),
            Self::Mssql(c) => c.cliente_id.map(|id| id.to_string()),
            Self::Mysql(c) => c.cliente_id.map(|id| id.to_string()),
            Self::Supabase(c) => c.id.clone(),
            Self::Neo4j(c) => Some(c.id.to_string()),
        }
    }

    pub fn to_form(&self) -> ClienteForm {
        match self {
            Self::Mongo(c) => ClienteForm {
                nombre: c.nombre.clone(),
                email: c.email.clone(),
                genero: c.genero.clone(),
                pais: c.pais.clone(),
                preferencias: c.preferencias.clone(),
            },
            Self::Mssql(c) => ClienteForm {
                nombre: c.nombre.clone(),
                email: c.email.clone(),
                genero: c.genero.clone(),
                pais: c.pais.clone(),
                preferencias: Vec::new(),
            },
            Self::Mysql(c) => ClienteForm {
                nombre: c.nombre.clone(),
                email: c.email.clone(),
                genero: c.genero.clone(),
                pais: c.pais.clone(),
                preferencias: Vec::new(),
            },
            Self::Supabase(c) => ClienteForm {
                nombre: c.nombre.clone(),
                email: c.email.clone(),
                genero: c.genero.clone(),
                pais: c.pais.clone(),
                preferencias: Vec::new(),
            },
            Self::Neo4j(c) => ClienteForm {
                nombre: c.nombre.clone(),
                email: c.email.clone().unwrap_or_default(),
                genero: c.genero.clone().unwrap_or_default(),
                pais: c.pais.clone().unwrap_or_default(),
                preferencias: Vec::new(),
            },
        }
    }
}

pub fn cliente_payload(target: TargetDatabase, form: &ClienteForm) -> Value {
    match target {
        TargetDatabase::Mongo => {
            let mut payload = json!({
                "nombre": form.nombre,
                "email": form.email,
                "genero": form.genero,
                "pais": form.pais,
            });
            if !form.preferencias.is_empty() {
                payload["preferencias"] = Value::Object(preferencias_to_dict(&form.preferencias));
            }
            payload
        }
        TargetDatabase::Mssql => json!({
            "Nombre": form.nombre,
            "Email": form.email,
            "Genero": form.genero,
            "Pais": form.pais,
        }),
        TargetDatabase::Mysql | TargetDatabase::Supabase | TargetDatabase::Neo4j => json!({
            "nombre": form.nombre,
            "email": form.email,
            "genero": form.genero,
            "pais": form.pais,
        }),
    }
}

// =============================================================================
// PRODUCTOS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ProductoRecord {
    Mongo(MongoProducto),
    Mssql(MssqlProducto),
    Mysql(MysqlProducto),
    Supabase(SupabaseProducto),
    Neo4j(Neo4jProducto),
}

impl ProductoRecord {
    pub fn parse(target: TargetDatabase, value: Value) -> Result<Self, MappingError> {
        const ENTITY: &str = "producto";
        Ok(match target {
            TargetDatabase::Mongo => Self::Mongo(decode(ENTITY, target, value)?),
            TargetDatabase::Mssql => Self::Mssql(decode(ENTITY, target, value)?),
            TargetDatabase::Mysql => Self::Mysql(decode(ENTITY, target, value)?),
            TargetDatabase::Supabase => Self::Supabase(decode(ENTITY, target, value)?),
            TargetDatabase::Neo4j => Self::Neo4j(decode(ENTITY, target, value)?),
        })
    }

    pub fn id(&self) -> Option<String> {
        match self {
            Self::Mongo(p) => p.id.clone(),
            Self::Mssql(p) => p.producto_id.map(|id| id.to_string()),
            Self::Mysql(p) => p.producto_id.map(|id| id.to_string()),
            Self::Supabase(p) => p.id.clone(),
            Self::Neo4j(p) => Some(p.id.to_string()),
        }
    }

    /// Target-specific product code
    pub fn codigo(&self) -> String {
        match self {
            Self::Mongo(p) => p.codigo_mongo.clone(),
            Self::Mssql(p) => p.sku.clone(),
            Self::Mysql(p) => p.codigo_alt.clone(),
            Self::Supabase(p) => p.sku.clone(),
            Self::Neo4j(p) => p.id.to_string(),
        }
    }

    pub fn to_form(&self) -> ProductoForm {
        let (nombre, categoria) = match self {
            Self::Mongo(p) => (&p.nombre, p.categoria.clone()),
            Self::Mssql(p) => (&p.nombre, p.categoria.clone()),
            Self::Mysql(p) => (&p.nombre, p.categoria.clone()),
            Self::Supabase(p) => (&p.nombre, p.categoria.clone()),
            Self::Neo4j(p) => (&p.nombre, p.categoria.clone().unwrap_or_default()),
        };

        let mut categorias_adicionales = std::collections::BTreeMap::new();
        if let Self::Mongo(MongoProducto { equivalencias: Some(eq), .. }) = self {
            if let Some(sku) = &eq.sku {
                categorias_adicionales.insert("sku".to_string(), sku.clone());
            }
            if let Some(codigo_alt) = &eq.codigo_alt {
                categorias_adicionales.insert("codigo_alt".to_string(), codigo_alt.clone());
            }
        }

        ProductoForm {
            nombre: nombre.clone(),
            categoria,
            codigo: self.codigo(),
            categorias_adicionales,
        }
    }
}

pub fn producto_payload(target: TargetDatabase, form: &ProductoForm) -> Value {
    match target {
        TargetDatabase::Mongo => {
            let mut payload = json!({
                "nombre": form.nombre,
                "codigo_mongo": form.codigo,
                "categoria": form.categoria,
            });
            let equivalencias = Equivalencias {
                sku: form.categorias_adicionales.get("sku").cloned(),
                codigo_alt: form.categorias_adicionales.get("codigo_alt").cloned(),
            };
            if equivalencias != Equivalencias::default() {
                payload["equivalencias"] = json!(equivalencias);
            }
            payload
        }
        TargetDatabase::Mssql => json!({
            "Nombre": form.nombre,
            "Categoria": form.categoria,
            "SKU": form.codigo,
        }),
        TargetDatabase::Mysql => json!({
            "nombre": form.nombre,
            "categoria": form.categoria,
            "codigo_alt": form.codigo,
        }),
        TargetDatabase::Supabase => json!({
            "nombre": form.nombre,
            "categoria": form.categoria,
            "sku": form.codigo,
        }),
        TargetDatabase::Neo4j => json!({
            "id": form.codigo,
            "nombre": form.nombre,
            "categoria": form.categoria,
        }),
    }
}

// =============================================================================
// ORDENES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OrdenRecord {
    Mongo(MongoOrden),
    Mssql(MssqlOrden),
    Mysql(MysqlOrden),
    Supabase(SupabaseOrden),
    Neo4j(Neo4jOrden),
}

impl OrdenRecord {
    pub fn parse(target: TargetDatabase, value: Value) -> Result<Self, MappingError> {
        const ENTITY: &str = "orden";
        Ok(match target {
            TargetDatabase::Mongo => Self::Mongo(decode(ENTITY, target, value)?),
            TargetDatabase::Mssql => Self::Mssql(decode(ENTITY, target, value)?),
            TargetDatabase::Mysql => Self::Mysql(decode(ENTITY, target, value)?),
            TargetDatabase::Supabase => Self::Supabase(decode(ENTITY, target, value)?),
            TargetDatabase::Neo4j => Self::Neo4j(decode(ENTITY, target, value)?),
        })
    }

    pub fn id(&self) -> Option<String> {
        match self {
            Self::Mongo(o) => o.id.clone(),
            Self::Mssql(o) => o.orden_id.map(|id| id.to_string()),
            Self::Mysql(o) => o.orden_id.map(|id| id.to_string()),
            Self::Supabase(o) => o.id.clone(),
            Self::Neo4j(o) => Some(o.orden.id.to_string()),
        }
    }

    /// Fails only for MySQL rows whose decimal strings do not parse
    pub fn to_form(&self) -> Result<OrdenForm, MappingError> {
        let form = match self {
            Self::Mongo(o) => OrdenForm {
                cliente_id: o.cliente_id.clone(),
                fecha: o.fecha.clone(),
                canal: o.canal.clone(),
                moneda: o.moneda.clone(),
                items: o
                    .items
                    .iter()
                    .map(|i| OrdenItemForm {
                        producto_id: i.producto_id.clone(),
                        cantidad: i.cantidad,
                        precio_unit: i.precio_unit,
                        descuento_pct: i.descuento_pct,
                    })
                    .collect(),
                total: o.total.unwrap_or_default(),
                descripcion: o.metadatos.as_ref().map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            },
            Self::Mssql(o) => OrdenForm {
                cliente_id: o.cliente_id.to_string(),
                fecha: o.fecha.clone(),
                canal: o.canal.clone(),
                moneda: o.moneda.clone(),
                items: o
                    .items
                    .iter()
                    .map(|i| OrdenItemForm {
                        producto_id: i.producto_id.to_string(),
                        cantidad: i.cantidad,
                        precio_unit: i.precio_unit,
                        descuento_pct: i.descuento_pct,
                    })
                    .collect(),
                total: o.total,
                descripcion: None,
            },
            Self::Mysql(o) => {
                let items = o
                    .items
                    .iter()
                    .map(|i| {
                        Ok(OrdenItemForm {
                            producto_id: i.producto_codigo_alt.clone(),
                            cantidad: quantity("cantidad", &i.cantidad)?,
                            precio_unit: amount("precio_unit", &i.precio_unit)?,
                            descuento_pct: None,
                        })
                    })
                    .collect::<Result<Vec<_>, MappingError>>()?;
                OrdenForm {
                    cliente_id: o.cliente_id.to_string(),
                    fecha: o.fecha.clone(),
                    canal: o.canal.clone(),
                    moneda: o.moneda.clone(),
                    items,
                    total: amount("total", &o.total)?,
                    descripcion: None,
                }
            }
            Self::Supabase(o) => OrdenForm {
                cliente_id: o.cliente_id.clone(),
                fecha: o.fecha.clone(),
                canal: o.canal.clone(),
                moneda: o.moneda.clone(),
                items: o
                    .items
                    .iter()
                    .map(|i| OrdenItemForm {
                        producto_id: i.producto_id.clone(),
                        cantidad: i.cantidad,
                        precio_unit: i.precio_unit,
                        descuento_pct: None,
                    })
                    .collect(),
                total: o.total,
                descripcion: None,
            },
            Self::Neo4j(o) => OrdenForm {
                cliente_id: o.cliente.id.to_string(),
                fecha: o.orden.fecha.clone(),
                canal: o.orden.canal.clone(),
                moneda: o.orden.moneda.clone(),
                items: o
                    .items
                    .iter()
                    .map(|i| OrdenItemForm {
                        producto_id: i.producto.id.to_string(),
                        cantidad: i.cantidad,
                        precio_unit: i.precio_unit,
                        descuento_pct: None,
                    })
                    .collect(),
                total: o.orden.total,
                descripcion: None,
            },
        };
        Ok(form)
    }
}

/// Order total sent to the backend: recomputed from the items when there
/// are any, otherwise the form's own figure
fn payload_total(form: &OrdenForm) -> f64 {
    if form.items.is_empty() {
        form.total
    } else {
        form.computed_total()
    }
}

pub fn orden_payload(target: TargetDatabase, form: &OrdenForm) -> Result<Value, MappingError> {
    let total = payload_total(form);

    let payload = match target {
        TargetDatabase::Mongo => {
            let items: Vec<Value> = form
                .items
                .iter()
                .map(|i| {
                    let mut item = json!({
                        "producto_id": i.producto_id,
                        "cantidad": i.cantidad,
                        "precio_unit": i.precio_unit,
                    });
                    if let Some(pct) = i.descuento_pct {
                        item["descuento_pct"] = json!(pct);
                    }
                    item
                })
                .collect();
            let mut payload = json!({
                "cliente_id": form.cliente_id,
                "fecha": form.fecha,
                "canal": form.canal,
                "moneda": form.moneda,
                "total": total,
                "items": items,
            });
            if let Some(descripcion) = &form.descripcion {
                payload["metadatos"] = json!(descripcion);
            }
            payload
        }
        TargetDatabase::Mssql => {
            let items = form
                .items
                .iter()
                .map(|i| {
                    Ok(json!({
                        "ProductoId": numeric_id("ProductoId", target, &i.producto_id)?,
                        "Cantidad": i.cantidad,
                        "PrecioUnit": i.precio_unit,
                        "DescuentoPct": i.descuento_pct.unwrap_or(0.0),
                    }))
                })
                .collect::<Result<Vec<_>, MappingError>>()?;
            json!({
                "ClienteId": numeric_id("ClienteId", target, &form.cliente_id)?,
                "Fecha": form.fecha,
                "Canal": form.canal,
                "Moneda": form.moneda,
                "Total": total,
                "Items": items,
            })
        }
        TargetDatabase::Mysql => {
            let items: Vec<Value> = form
                .items
                .iter()
                .map(|i| {
                    json!({
                        "producto_codigo_alt": i.producto_id,
                        "cantidad": i.cantidad.to_string(),
                        "precio_unit": decimal_text(i.precio_unit),
                    })
                })
                .collect();
            json!({
                "cliente_id": numeric_id("cliente_id", target, &form.cliente_id)?,
                "fecha": form.fecha,
                "canal": form.canal,
                "moneda": form.moneda,
                "total": decimal_text(total),
                "items": items,
            })
        }
        TargetDatabase::Supabase | TargetDatabase::Neo4j => {
            let items: Vec<Value> = form
                .items
                .iter()
                .map(|i| {
                    json!({
                        "producto_id": i.producto_id,
                        "cantidad": i.cantidad,
                        "precio_unit": i.precio_unit,
                    })
                })
                .collect();
            json!({
                "cliente_id": form.cliente_id,
                "fecha": form.fecha,
                "canal": form.canal,
                "moneda": form.moneda,
                "total": total,
                "items": items,
            })
        }
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn orden_form(cliente_id: &str, producto_id: &str) -> OrdenForm {
        OrdenForm {
            cliente_id: cliente_id.to_string(),
            fecha: "2024-05-01".to_string(),
            canal: "WEB".to_string(),
            moneda: "USD".to_string(),
            items: vec![OrdenItemForm {
                producto_id: producto_id.to_string(),
                cantidad: 2,
                precio_unit: 50.0,
                descuento_pct: Some(10.0),
            }],
            total: 0.0,
            descripcion: Some("regalo".to_string()),
        }
    }

    #[test]
    fn test_client_ids_per_target() {
        let mongo = ClienteRecord::parse(
            TargetDatabase::Mongo,
            json!({"_id": "66a1", "nombre": "Ana", "email": "a@x.com", "genero": "Femenino", "pais": "CR"}),
        )
        .unwrap();
        assert_eq!(mongo.id().as_deref(), Some("66a1"));

        let mssql = ClienteRecord::parse(
            TargetDatabase::Mssql,
            json!({"ClienteId": 7, "Nombre": "Ana", "Email": "a@x.com", "Genero": "Femenino", "Pais": "CR"}),
        )
        .unwrap();
        assert_eq!(mssql.id().as_deref(), Some("7"));

        let mysql = ClienteRecord::parse(
            TargetDatabase::Mysql,
            json!({"id": 9, "nombre": "Ana", "email": "a@x.com", "genero": "Femenino", "pais": "CR"}),
        )
        .unwrap();
        assert_eq!(mysql.id().as_deref(), Some("9"));

        let neo = ClienteRecord::parse(TargetDatabase::Neo4j, json!({"id": "C-1", "nombre": "Ana"})).unwrap();
        assert_eq!(neo.id().as_deref(), Some("C-1"));
        assert_eq!(neo.to_form().email, "");
    }

    #[test]
    fn test_wrong_shape_is_reported_with_target() {
        let err = ClienteRecord::parse(TargetDatabase::Mssql, json!({"nombre": "Ana"})).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidRecord { entity: "cliente", target: TargetDatabase::Mssql, .. }
        ));
    }

    #[test]
    fn test_mongo_preferences_become_dict_of_lists() {
        let form = ClienteForm {
            nombre: "Ana".to_string(),
            email: "a@x.com".to_string(),
            genero: "Femenino".to_string(),
            pais: "CR".to_string(),
            preferencias: vec![Preferencia {
                categoria: "musica".to_string(),
                texto: "rock, jazz".to_string(),
            }],
        };

        let payload = cliente_payload(TargetDatabase::Mongo, &form);
        assert_eq!(payload["preferencias"], json!({"musica": ["rock", "jazz"]}));

        let payload = cliente_payload(TargetDatabase::Mssql, &form);
        assert_eq!(payload["Nombre"], "Ana");
        assert!(payload.get("preferencias").is_none());
    }

    #[test]
    fn test_product_code_field_per_target() {
        let form = ProductoForm {
            nombre: "Café".to_string(),
            categoria: "Bebidas".to_string(),
            codigo: "X-1".to_string(),
            categorias_adicionales: Default::default(),
        };

        assert_eq!(producto_payload(TargetDatabase::Mongo, &form)["codigo_mongo"], "X-1");
        assert_eq!(producto_payload(TargetDatabase::Mssql, &form)["SKU"], "X-1");
        assert_eq!(producto_payload(TargetDatabase::Mysql, &form)["codigo_alt"], "X-1");
        assert_eq!(producto_payload(TargetDatabase::Supabase, &form)["sku"], "X-1");
        assert_eq!(producto_payload(TargetDatabase::Neo4j, &form)["id"], "X-1");
        assert!(producto_payload(TargetDatabase::Mongo, &form).get("equivalencias").is_none());
    }

    #[test]
    fn test_mongo_equivalencias_survive_round_trip() {
        let record = ProductoRecord::parse(
            TargetDatabase::Mongo,
            json!({
                "_id": "p1",
                "codigo_mongo": "MN-1",
                "nombre": "Café",
                "categoria": "Bebidas",
                "equivalencias": {"sku": "SKU-1"}
            }),
        )
        .unwrap();
        let form = record.to_form();
        assert_eq!(form.codigo, "MN-1");
        assert_eq!(form.categorias_adicionales.get("sku").map(String::as_str), Some("SKU-1"));

        let payload = producto_payload(TargetDatabase::Mongo, &form);
        assert_eq!(payload["equivalencias"], json!({"sku": "SKU-1"}));
    }

    #[test]
    fn test_mysql_order_decimals_are_parsed() {
        let record = OrdenRecord::parse(
            TargetDatabase::Mysql,
            json!({
                "orden_id": 3,
                "cliente_id": 9,
                "fecha": "2024-05-01",
                "canal": "TIENDA",
                "moneda": "CRC",
                "total": "150.50",
                "items": [{"producto_codigo_alt": "ALT-1", "cantidad": "3", "precio_unit": "50.1667"}]
            }),
        )
        .unwrap();
        let form = record.to_form().unwrap();
        assert_eq!(record.id().as_deref(), Some("3"));
        assert_eq!(form.cliente_id, "9");
        assert_eq!(form.total, 150.5);
        assert_eq!(form.items[0].cantidad, 3);
        assert_eq!(form.items[0].producto_id, "ALT-1");
    }

    #[test]
    fn test_mysql_order_with_bad_decimal_fails() {
        let record = OrdenRecord::parse(
            TargetDatabase::Mysql,
            json!({
                "cliente_id": 9,
                "fecha": "2024-05-01",
                "canal": "WEB",
                "moneda": "USD",
                "total": "n/a",
                "items": []
            }),
        )
        .unwrap();
        assert!(matches!(
            record.to_form(),
            Err(MappingError::InvalidNumber { field: "total", .. })
        ));
    }

    #[test]
    fn test_neo4j_nested_order_flattens() {
        let record = OrdenRecord::parse(
            TargetDatabase::Neo4j,
            json!({
                "cliente": {"id": 12, "nombre": "Ana"},
                "orden": {"id": "O-5", "fecha": "2024-05-01", "canal": "APP", "moneda": "USD", "total": 20.0},
                "items": [{"producto": {"id": "P-1", "nombre": "Café"}, "cantidad": 2, "precio_unit": 10.0}]
            }),
        )
        .unwrap();
        assert_eq!(record.id().as_deref(), Some("O-5"));
        let form = record.to_form().unwrap();
        assert_eq!(form.cliente_id, "12");
        assert_eq!(form.items[0].producto_id, "P-1");
        if let OrdenRecord::Neo4j(o) = &record {
            assert_eq!(o.cliente.id, RecordId::Int(12));
        }
    }

    #[test]
    fn test_relational_order_ids_must_be_numeric() {
        let payload = orden_payload(TargetDatabase::Mssql, &orden_form("42", "7")).unwrap();
        assert_eq!(payload["ClienteId"], 42);
        assert_eq!(payload["Items"][0]["ProductoId"], 7);
        assert_eq!(payload["Items"][0]["DescuentoPct"], 10.0);

        let err = orden_payload(TargetDatabase::Mssql, &orden_form("abc", "7")).unwrap_err();
        assert!(matches!(
            err,
            MappingError::NonNumericId { field: "ClienteId", target: TargetDatabase::Mssql, .. }
        ));

        let err = orden_payload(TargetDatabase::Mysql, &orden_form("c-1", "ALT-1")).unwrap_err();
        assert!(err.to_string().contains("cliente_id must be numeric"));
    }

    #[test]
    fn test_order_payload_totals_apply_discount() {
        let payload = orden_payload(TargetDatabase::Mongo, &orden_form("c1", "p1")).unwrap();
        assert_eq!(payload["total"], 90.0);
        assert_eq!(payload["metadatos"], "regalo");
        assert_eq!(payload["items"][0]["descuento_pct"], 10.0);

        let payload = orden_payload(TargetDatabase::Mysql, &orden_form("5", "ALT-1")).unwrap();
        assert_eq!(payload["total"], "90.00");
        assert_eq!(payload["items"][0]["precio_unit"], "50.00");
        assert_eq!(payload["items"][0]["producto_codigo_alt"], "ALT-1");
    }

    #[test]
    fn test_order_without_items_keeps_given_total() {
        let mut form = orden_form("c1", "p1");
        form.items.clear();
        form.total = 33.0;
        let payload = orden_payload(TargetDatabase::Supabase, &form).unwrap();
        assert_eq!(payload["total"], 33.0);
        assert_eq!(payload["items"], json!([]));
    }
}
