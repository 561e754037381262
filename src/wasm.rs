use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::cluster::cluster_colors;
use crate::extract::extract_colors;

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

/// Dominant colors of an encoded image.
///
/// Returns an array of `{ hex, rgb: { r, g, b }, percentage }`, most frequent
/// first.
#[wasm_bindgen(js_name = extractColors)]
pub fn extract_colors_js(input: Vec<u8>, max_colors: usize) -> Result<Array, JsValue> {
    let colors = extract_colors(&input, max_colors).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let out = Array::new();
    for c in colors {
        let rgb = Object::new();
        set(&rgb, "r", &JsValue::from(c.rgb.r))?;
        set(&rgb, "g", &JsValue::from(c.rgb.g))?;
        set(&rgb, "b", &JsValue::from(c.rgb.b))?;

        let entry = Object::new();
        set(&entry, "hex", &JsValue::from_str(&c.hex))?;
        set(&entry, "rgb", &rgb)?;
        set(&entry, "percentage", &JsValue::from(c.percentage))?;
        out.push(&entry);
    }
    Ok(out)
}

/// Consensus colors across many palettes. Non-string or malformed entries in
/// `colors` are skipped.
#[wasm_bindgen(js_name = clusterColors)]
pub fn cluster_colors_js(colors: Array, top_k: usize) -> Result<Array, JsValue> {
    let hexes: Vec<Option<String>> = colors.iter().map(|v| v.as_string()).collect();
    let clusters = cluster_colors(hexes, top_k).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let out = Array::new();
    for c in clusters {
        let entry = Object::new();
        set(&entry, "hex", &JsValue::from_str(&c.hex))?;
        set(&entry, "count", &JsValue::from(c.count as f64))?;
        out.push(&entry);
    }
    Ok(out)
}
