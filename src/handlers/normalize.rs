//! Record normalization: adapter JSON in, uniform forms out, and the
//! reverse direction from forms to each target's create payload

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cli::Entity;
use crate::services::mapping::{
    cliente_payload, orden_payload, producto_payload, ClienteRecord, OrdenRecord, ProductoRecord,
};
use crate::types::{ClienteForm, OrdenForm, ProductoForm, TargetDatabase};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord<T> {
    pub id: Option<String>,
    pub form: T,
}

/// Adapters answer list endpoints either with a bare array or `{"data": [...]}`
fn records_from(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("Expected an array of records or an object with a \"data\" array"),
        },
        _ => bail!("Expected an array of records or an object with a \"data\" array"),
    }
}

fn normalize_with<R, T>(
    records: Vec<Value>,
    parse: impl Fn(Value) -> Result<R>,
    convert: impl Fn(&R) -> Result<(Option<String>, T)>,
) -> Result<Vec<NormalizedRecord<T>>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let record = parse(value).with_context(|| format!("Record {}", i + 1))?;
            let (id, form) = convert(&record).with_context(|| format!("Record {}", i + 1))?;
            Ok(NormalizedRecord { id, form })
        })
        .collect()
}

/// Normalize every record in `document` and return the result as JSON
pub fn normalize(target: TargetDatabase, entity: Entity, document: Value) -> Result<Value> {
    let records = records_from(document)?;

    let normalized = match entity {
        Entity::Clientes => serde_json::to_value(normalize_with(
            records,
            |v| Ok(ClienteRecord::parse(target, v)?),
            |r| Ok((r.id(), r.to_form())),
        )?)?,
        Entity::Productos => serde_json::to_value(normalize_with(
            records,
            |v| Ok(ProductoRecord::parse(target, v)?),
            |r| Ok((r.id(), r.to_form())),
        )?)?,
        Entity::Ordenes => serde_json::to_value(normalize_with(
            records,
            |v| Ok(OrdenRecord::parse(target, v)?),
            |r| Ok((r.id(), r.to_form()?)),
        )?)?,
    };
    Ok(normalized)
}

fn payloads_with<F: DeserializeOwned>(
    records: Vec<Value>,
    build: impl Fn(&F) -> Result<Value>,
) -> Result<Vec<Value>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let form: F = serde_json::from_value(value).with_context(|| format!("Form {}", i + 1))?;
            build(&form).with_context(|| format!("Form {}", i + 1))
        })
        .collect()
}

/// Map uniform forms to the create payload `target` expects
pub fn payloads(target: TargetDatabase, entity: Entity, document: Value) -> Result<Value> {
    // A single form may be given bare
    let forms = if document.is_object() && document.get("data").is_none() {
        vec![document]
    } else {
        records_from(document)?
    };

    let built = match entity {
        Entity::Clientes => payloads_with::<ClienteForm>(forms, |f| Ok(cliente_payload(target, f)))?,
        Entity::Productos => payloads_with::<ProductoForm>(forms, |f| Ok(producto_payload(target, f)))?,
        Entity::Ordenes => payloads_with::<OrdenForm>(forms, |f| Ok(orden_payload(target, f)?))?,
    };
    Ok(Value::Array(built))
}

fn read_document(file: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", file.display()))
}

pub fn handle_normalize(target: TargetDatabase, entity: Entity, file: &Path) -> Result<()> {
    let normalized = normalize(target, entity, read_document(file)?)?;
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

pub fn handle_payload(target: TargetDatabase, entity: Entity, file: &Path) -> Result<()> {
    let built = payloads(target, entity, read_document(file)?)?;
    println!("{}", serde_json::to_string_pretty(&built)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_data_envelope() {
        let document = json!({
            "data": [{"ProductoId": 3, "SKU": "SKU-3", "Nombre": "Té", "Categoria": "Bebidas"}],
            "total": 1
        });
        let out = normalize(TargetDatabase::Mssql, Entity::Productos, document).unwrap();
        assert_eq!(out[0]["id"], "3");
        assert_eq!(out[0]["form"]["codigo"], "SKU-3");
    }

    #[test]
    fn test_accepts_bare_array() {
        let document = json!([
            {"id": "u-1", "nombre": "Ana", "email": "a@x.com", "genero": "Femenino", "pais": "CR", "created": "2024-01-01"}
        ]);
        let out = normalize(TargetDatabase::Supabase, Entity::Clientes, document).unwrap();
        assert_eq!(out[0]["id"], "u-1");
        assert_eq!(out[0]["form"]["nombre"], "Ana");
    }

    #[test]
    fn test_bad_record_names_its_position() {
        let document = json!([
            {"id": 1, "nombre": "Ana", "email": "a@x.com", "genero": "Femenino", "pais": "CR"},
            {"nombre": "Sin email"}
        ]);
        let err = normalize(TargetDatabase::Mysql, Entity::Clientes, document).unwrap_err();
        assert!(format!("{:#}", err).starts_with("Record 2"));
    }

    #[test]
    fn test_rejects_scalar_document() {
        assert!(normalize(TargetDatabase::Mongo, Entity::Ordenes, json!(42)).is_err());
        assert!(normalize(TargetDatabase::Mongo, Entity::Ordenes, json!({"items": []})).is_err());
    }

    #[test]
    fn test_order_form_becomes_mysql_payload_with_discounted_total() {
        let form = json!({
            "cliente_id": "12",
            "fecha": "2024-05-01",
            "canal": "WEB",
            "moneda": "CRC",
            "items": [
                {"producto_id": "ALT-1", "cantidad": 3, "precio_unit": 10.0, "descuento_pct": 50.0},
                {"producto_id": "ALT-2", "cantidad": 1, "precio_unit": 4.5}
            ],
            "total": 0.0
        });
        let out = payloads(TargetDatabase::Mysql, Entity::Ordenes, form).unwrap();
        assert_eq!(out.as_array().unwrap().len(), 1);
        assert_eq!(out[0]["cliente_id"], 12);
        assert_eq!(out[0]["total"], "19.50");
        assert_eq!(out[0]["items"][1]["precio_unit"], "4.50");
    }

    #[test]
    fn test_payload_accepts_array_of_client_forms() {
        let forms = json!([
            {
                "nombre": "Ana", "email": "a@x.com", "genero": "Femenino", "pais": "CR",
                "preferencias": [{"categoria": "deportes", "texto": "futbol, tenis"}]
            },
            {"nombre": "Luis", "email": "l@x.com", "genero": "Masculino", "pais": "PA"}
        ]);
        let out = payloads(TargetDatabase::Mongo, Entity::Clientes, forms).unwrap();
        assert_eq!(out[0]["preferencias"]["deportes"], json!(["futbol", "tenis"]));
        assert_eq!(out[1]["nombre"], "Luis");
    }

    #[test]
    fn test_payload_rejects_non_numeric_relational_id() {
        let form = json!({
            "cliente_id": "abc", "fecha": "2024-05-01", "canal": "WEB", "moneda": "USD",
            "items": [], "total": 5.0
        });
        let err = payloads(TargetDatabase::Mssql, Entity::Ordenes, form).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.starts_with("Form 1"));
        assert!(message.contains("must be numeric"));
    }

    #[test]
    fn test_payload_reports_malformed_form() {
        let err = payloads(TargetDatabase::Supabase, Entity::Productos, json!([{"nombre": "Té"}])).unwrap_err();
        assert!(format!("{:#}", err).starts_with("Form 1"));
    }
}
