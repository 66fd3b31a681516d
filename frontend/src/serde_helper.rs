//! JsValue <-> Rust 数据结构转换
//!
//! 跨窗口消息 (`postMessage`) 传递的是结构化克隆的 JS 对象，而不是 JSON 字符串。

use serde::{Serialize, de::DeserializeOwned};
use wasm_bindgen::JsValue;

/// Error type for serialization/deserialization operations
#[derive(Debug)]
pub struct Error(serde_wasm_bindgen::Error);

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Serde WASM Bindgen Error: {}", self.0)
    }
}

impl std::error::Error for Error {}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Error(e)
    }
}

/// Serialize a Rust data structure into a plain JS object
pub fn to_value<T: Serialize>(value: &T) -> Result<JsValue, Error> {
    // Maps become plain objects so the receiving window can read `data.type`
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_large_number_types_as_bigints(false)
        .serialize_maps_as_objects(true)
        .serialize_missing_as_null(true);
    value.serialize(&serializer).map_err(Error::from)
}

/// Deserialize a JsValue into a Rust data structure
pub fn from_value<T: DeserializeOwned>(value: JsValue) -> Result<T, Error> {
    serde_wasm_bindgen::from_value(value).map_err(Error::from)
}
