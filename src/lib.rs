pub mod cardinality;
pub mod category;
pub mod error;
pub mod format;
pub mod layout;
pub mod measure;
pub mod mermaid;
pub mod model;
pub mod sql;
pub mod validity;

use wasm_bindgen::prelude::*;

pub use cardinality::{Cardinality, Multiplicity, calculate_cardinality, parse_cardinality};
pub use category::{CategoryConfig, CategoryRule};
pub use error::{Error, Result};
pub use format::{detect_format, identify_valid_blocks, parse_schema, parse_schema_with, schema_to_format};
pub use layout::{LayoutAlgorithm, LayoutEngine, ViewMode, layout_schema};
pub use model::{Column, ColumnReference, DatabaseSchema, Format, Nullability, Table};
pub use validity::ValidityRange;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_format(format: Option<String>) -> Result<Option<Format>> {
    format.as_deref().map(str::parse).transpose()
}

fn schema_from_json(json: &str) -> std::result::Result<DatabaseSchema, String> {
    DatabaseSchema::from_json(json).map_err(|e| Error::from(e).to_string())
}

/// `"sql"`, `"mermaid"`, or undefined when neither is recognised.
#[wasm_bindgen(js_name = "detectFormat")]
pub fn detect_format_js(text: &str) -> Option<String> {
    detect_format(text).map(|f| f.to_string())
}

/// Parse to schema JSON; undefined when the text could not be parsed.
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema_js(text: &str, format: Option<String>) -> std::result::Result<Option<String>, String> {
    let format = parse_format(format).map_err(|e| e.to_string())?;
    parse_schema(text, format)
        .map(|schema| schema.to_json().map_err(|e| Error::from(e).to_string()))
        .transpose()
}

#[wasm_bindgen(js_name = "layoutSchema")]
pub fn layout_schema_js(
    schema_json: &str,
    algorithm: &str,
    view_mode: &str,
) -> std::result::Result<String, String> {
    let schema = schema_from_json(schema_json)?;
    let algorithm: LayoutAlgorithm = algorithm.parse().map_err(|e: Error| e.to_string())?;
    let mode: ViewMode = view_mode.parse().map_err(|e: Error| e.to_string())?;
    layout_schema(&schema, algorithm, mode)
        .to_json()
        .map_err(|e| Error::from(e).to_string())
}

/// Regenerate text in the format the schema was parsed from.
#[wasm_bindgen(js_name = "schemaToFormat")]
pub fn schema_to_format_js(schema_json: &str) -> std::result::Result<String, String> {
    Ok(schema_to_format(&schema_from_json(schema_json)?, None))
}

#[wasm_bindgen(js_name = "schemaToSql")]
pub fn schema_to_sql_js(schema_json: &str) -> std::result::Result<String, String> {
    Ok(sql::schema_to_sql(&schema_from_json(schema_json)?))
}

#[wasm_bindgen(js_name = "schemaToMermaid")]
pub fn schema_to_mermaid_js(schema_json: &str) -> std::result::Result<String, String> {
    Ok(mermaid::schema_to_mermaid(&schema_from_json(schema_json)?))
}

/// `Array<{start, end, isValid}>` covering the text, in UTF-16 offsets.
#[wasm_bindgen(js_name = "identifyValidBlocks")]
pub fn identify_valid_blocks_js(
    text: &str,
    format: Option<String>,
) -> std::result::Result<js_sys::Array, JsValue> {
    let format = parse_format(format).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let ranges = validity::to_utf16(text, &identify_valid_blocks(text, format));

    let array = js_sys::Array::new();
    for range in ranges {
        let object = js_sys::Object::new();
        js_sys::Reflect::set(&object, &"start".into(), &JsValue::from(range.start as u32))?;
        js_sys::Reflect::set(&object, &"end".into(), &JsValue::from(range.end as u32))?;
        js_sys::Reflect::set(&object, &"isValid".into(), &JsValue::from_bool(range.is_valid))?;
        array.push(&object);
    }
    Ok(array)
}
