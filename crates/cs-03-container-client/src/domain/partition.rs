//! Partition-key resolution for writes.

use serde_json::Value;

use super::errors::ContainerError;

/// Partition key for a record being written: the record's own
/// partition-key property, else the default.
///
/// A null property counts as absent. Any other non-string value is an
/// error; the default is not substituted for it.
pub fn resolve_write_partition_key(
    record: &Value,
    property: Option<&str>,
    default: Option<&str>,
) -> Result<String, ContainerError> {
    match property.and_then(|name| record.get(name).map(|value| (name, value))) {
        Some((_, Value::String(key))) => Ok(key.clone()),
        Some((_, Value::Null)) | None => default.map(str::to_string).ok_or_else(|| {
            ContainerError::MissingPartitionKey {
                property: property.unwrap_or("<unknown>").to_string(),
            }
        }),
        Some((name, other)) => Err(ContainerError::InvalidPartitionKey {
            property: name.to_string(),
            found: json_type(other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_value_wins() {
        let record = json!({"id": "1", "tenant": "acme"});
        let key = resolve_write_partition_key(&record, Some("tenant"), Some("default")).unwrap();
        assert_eq!(key, "acme");
    }

    #[test]
    fn test_default_used_when_record_lacks_key() {
        let record = json!({"id": "1"});
        let key = resolve_write_partition_key(&record, Some("tenant"), Some("default")).unwrap();
        assert_eq!(key, "default");
    }

    #[test]
    fn test_missing_everywhere() {
        let record = json!({"id": "1"});
        let err = resolve_write_partition_key(&record, Some("tenant"), None).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::MissingPartitionKey { property } if property == "tenant"
        ));
    }

    #[test]
    fn test_unknown_property_uses_default() {
        let record = json!({"id": "1", "tenant": "acme"});
        assert_eq!(
            resolve_write_partition_key(&record, None, Some("d")).unwrap(),
            "d"
        );
        assert!(resolve_write_partition_key(&record, None, None).is_err());
    }

    #[test]
    fn test_non_string_value_rejected_even_with_default() {
        let record = json!({"id": "1", "tenant": 42});
        let err = resolve_write_partition_key(&record, Some("tenant"), Some("default")).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::InvalidPartitionKey { property, found } if property == "tenant" && found == "a number"
        ));

        let record = json!({"id": "1", "tenant": {"region": "eu"}});
        assert!(matches!(
            resolve_write_partition_key(&record, Some("tenant"), None),
            Err(ContainerError::InvalidPartitionKey { found: "an object", .. })
        ));
    }

    #[test]
    fn test_null_value_uses_default() {
        let record = json!({"id": "1", "tenant": null});
        assert_eq!(
            resolve_write_partition_key(&record, Some("tenant"), Some("default")).unwrap(),
            "default"
        );
    }
}
