//! Field-name normalization and record standardization.
//!
//! The two sources name the same logical fields differently (`nombre` vs
//! `customer_first_name`, `Nro. Documento` vs `dni`, varying casing and
//! accents). [`normalize_key`] collapses an arbitrary field name into a
//! stable token, and [`standardize_record`] maps those tokens through a
//! static synonym table into the canonical vocabulary so that the same
//! logical field from either source always lands on the same key.

use std::collections::HashMap;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Record;

/// Canonical field vocabulary, in display order.
pub const CANONICAL_FIELDS: &[&str] = &[
    "nombre",
    "apellido",
    "dni",
    "email",
    "celular",
    "fecha_nacimiento",
    "region",
    "permiso",
    "estado_permiso",
    "fecha_inicio_permiso",
    "fecha_creacion",
];

/// Raw synonym spellings and the canonical field each maps to. Entries are
/// run through [`normalize_key`] when the lookup table is built, so they can
/// be written the way they appear in the sources.
const SYNONYMS: &[(&str, &str)] = &[
    ("nombre", "nombre"),
    ("nombres", "nombre"),
    ("first name", "nombre"),
    ("customer_first_name", "nombre"),
    ("apellido", "apellido"),
    ("apellidos", "apellido"),
    ("last name", "apellido"),
    ("customer_last_name", "apellido"),
    ("dni", "dni"),
    ("documento", "dni"),
    ("nro. documento", "dni"),
    ("nro_documento", "dni"),
    ("numero de documento", "dni"),
    ("nro de documento", "dni"),
    ("email", "email"),
    ("e-mail", "email"),
    ("correo", "email"),
    ("correo electrónico", "email"),
    ("customer_email", "email"),
    ("celular", "celular"),
    ("teléfono", "celular"),
    ("telefono/celular", "celular"),
    ("customer_phone", "celular"),
    ("fecha_nacimiento", "fecha_nacimiento"),
    ("fecha de nacimiento", "fecha_nacimiento"),
    ("nacimiento", "fecha_nacimiento"),
    ("birth_date", "fecha_nacimiento"),
    ("region", "region"),
    ("región", "region"),
    ("zona", "region"),
    ("delegación", "region"),
    ("permiso", "permiso"),
    ("tipo de permiso", "permiso"),
    ("tipo_permiso", "permiso"),
    ("product_name", "permiso"),
    ("estado", "estado_permiso"),
    ("estado permiso", "estado_permiso"),
    ("estado del permiso", "estado_permiso"),
    ("status", "estado_permiso"),
    ("fecha_inicio_permiso", "fecha_inicio_permiso"),
    ("fecha de inicio", "fecha_inicio_permiso"),
    ("inicio del permiso", "fecha_inicio_permiso"),
    ("fecha_creacion", "fecha_creacion"),
    ("fecha de creación", "fecha_creacion"),
    ("fecha de carga", "fecha_creacion"),
    ("created_at", "fecha_creacion"),
];

/// Strips accents by decomposing to NFD and dropping combining marks.
pub fn fold_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lowercase + accent-stripped form used by the in-process matchers.
pub fn fold(s: &str) -> String {
    fold_accents(s).to_lowercase()
}

/// Converts an arbitrary source field name into a canonical token:
/// lowercase, accent-stripped, whitespace runs collapsed to `_`, and the
/// characters `.` `/` `(` `)` removed. Total — always produces a value.
pub fn normalize_key(raw: &str) -> String {
    let folded = fold(raw);
    let cleaned: String = folded
        .chars()
        .filter(|c| !matches!(c, '.' | '/' | '(' | ')'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

fn synonym_table() -> &'static HashMap<String, &'static str> {
    static TABLE: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        SYNONYMS
            .iter()
            .map(|(raw, canonical)| (normalize_key(raw), *canonical))
            .collect()
    })
}

/// Maps a raw record into the canonical vocabulary.
///
/// Each key is normalized and looked up in the synonym table; recognized
/// keys are emitted under their canonical field, everything else passes
/// through under the original key. If two raw keys map to the same
/// canonical field the later one in iteration order wins.
pub fn standardize_record(raw: Record) -> Record {
    let table = synonym_table();
    let mut out = Record::new();
    for (key, value) in raw {
        match table.get(&normalize_key(&key)) {
            Some(canonical) => {
                out.insert((*canonical).to_string(), value);
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

/// Renders a record value the way the matchers see it. Numbers keep their
/// plain representation; null and containers render empty.
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Fetches a record field as a display string, empty when absent.
pub fn field_str(record: &Record, field: &str) -> String {
    record.get(field).map(value_to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key_case_accent_separator() {
        // All spellings of the same field collapse to one token.
        assert_eq!(normalize_key("Nombre"), "nombre");
        assert_eq!(normalize_key("NOMBRE"), "nombre");
        assert_eq!(normalize_key("nombre "), "nombre");
        assert_eq!(normalize_key("Teléfono"), "telefono");
        assert_eq!(normalize_key("Nro. Documento"), "nro_documento");
        assert_eq!(normalize_key("Fecha de Nacimiento"), "fecha_de_nacimiento");
        assert_eq!(normalize_key("Telefono/Celular"), "telefonocelular");
        assert_eq!(normalize_key("Estado (actual)"), "estado_actual");
    }

    #[test]
    fn test_normalize_key_total() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("   "), "");
        assert_eq!(normalize_key("./()"), "");
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("María LÓPEZ"), "maria lopez");
        assert_eq!(fold("Pérez"), "perez");
    }

    #[test]
    fn test_standardize_relational_columns() {
        let mut raw = Record::new();
        raw.insert("customer_first_name".into(), json!("Maria"));
        raw.insert("customer_last_name".into(), json!("Lopez"));
        raw.insert("nro_documento".into(), json!("12345678"));
        raw.insert("status".into(), json!("paid"));

        let out = standardize_record(raw);
        assert_eq!(out.get("nombre"), Some(&json!("Maria")));
        assert_eq!(out.get("apellido"), Some(&json!("Lopez")));
        assert_eq!(out.get("dni"), Some(&json!("12345678")));
        assert_eq!(out.get("estado_permiso"), Some(&json!("paid")));
    }

    #[test]
    fn test_standardize_sheet_headers() {
        let mut raw = Record::new();
        raw.insert("Nombre".into(), json!("Juan"));
        raw.insert("Apellido".into(), json!("Pérez"));
        raw.insert("Nro. Documento".into(), json!(30123456));
        raw.insert("Teléfono".into(), json!("1155551234"));

        let out = standardize_record(raw);
        assert_eq!(out.get("nombre"), Some(&json!("Juan")));
        assert_eq!(out.get("apellido"), Some(&json!("Pérez")));
        assert_eq!(out.get("dni"), Some(&json!(30123456)));
        assert_eq!(out.get("celular"), Some(&json!("1155551234")));
    }

    #[test]
    fn test_unmapped_keys_pass_through() {
        let mut raw = Record::new();
        raw.insert("observaciones".into(), json!("sin novedad"));

        let out = standardize_record(raw);
        assert_eq!(out.get("observaciones"), Some(&json!("sin novedad")));
    }

    #[test]
    fn test_canonical_collision_last_write_wins() {
        let mut raw = Record::new();
        raw.insert("estado".into(), json!("Vigente"));
        raw.insert("status".into(), json!("paid"));

        let out = standardize_record(raw);
        // serde_json::Map iterates in key order; "status" comes after
        // "estado" and overwrites the shared canonical field.
        assert_eq!(out.get("estado_permiso"), Some(&json!("paid")));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("A123")), "A123");
        assert_eq!(value_to_string(&json!(12345678)), "12345678");
        assert_eq!(value_to_string(&json!(null)), "");
    }
}
