//! 审计值编解码
//! 字段值与存储文本之间的无损 JSON 编解码

use crate::error::AppError;
use serde::Serialize;
use serde_json::Value;

/// 编码字段值为存储文本
///
/// `None` 编码为真正的 SQL NULL 而不是字符串 "null"，
/// 以区分「没有旧值」和「值就是 null」两种情况。
pub fn encode<T: Serialize>(value: Option<&T>) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) => serde_json::to_string(v)
            .map(Some)
            .map_err(|e| AppError::Encode(e.to_string())),
    }
}

/// 解码存储文本为字段值，encode 的精确逆操作
pub fn decode(text: Option<&str>) -> Result<Option<Value>, AppError> {
    match text {
        None => Ok(None),
        Some(t) => serde_json::from_str(t)
            .map(Some)
            .map_err(|e| AppError::Encode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(value: Value) {
        let encoded = encode(Some(&value)).unwrap();
        let decoded = decode(encoded.as_deref()).unwrap();
        assert_eq!(decoded, Some(value));
    }

    #[test]
    fn test_none_round_trip() {
        assert_eq!(encode::<Value>(None).unwrap(), None);
        assert_eq!(decode(None).unwrap(), None);
    }

    #[test]
    fn test_explicit_null_is_not_sql_null() {
        // 显式 null 值编码为字符串 "null"，与 None 可区分
        let encoded = encode(Some(&Value::Null)).unwrap();
        assert_eq!(encoded, Some("null".to_string()));
        assert_eq!(decode(encoded.as_deref()).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_scalar_round_trips() {
        round_trip(json!(true));
        round_trip(json!(42));
        round_trip(json!(-7));
        round_trip(json!(3.5));
        round_trip(json!("Acme"));
        round_trip(json!(""));
        round_trip(json!("010-1111-2222"));
    }

    #[test]
    fn test_list_round_trip() {
        round_trip(json!([1, "two", null, [3.0, false]]));
    }

    #[test]
    fn test_nested_map_round_trip() {
        round_trip(json!({
            "id": 42,
            "name": "Website Revamp",
            "status": "active",
            "meta": { "tags": ["web", "design"], "archived": null }
        }));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(Some("{not json"));
        assert!(matches!(result, Err(AppError::Encode(_))));
    }

    #[test]
    fn test_encode_rejects_unserializable() {
        // 非字符串键的映射没有 JSON 文本表示
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], "value");
        let result = encode(Some(&bad));
        assert!(matches!(result, Err(AppError::Encode(_))));
    }
}
