use albius_disk_types::AlbiusError;
use serde_json::Value;

/// Recipe arguments travel as `serde_json::Value`s — integers in particular
/// may arrive either as JSON numbers or as numeric strings, a limitation of
/// the original recipe format that both must be accepted (§4.5).
pub fn as_str(value: &Value) -> Result<&str, AlbiusError> {
    value.as_str().ok_or_else(|| AlbiusError::Decode {
        what: "setup argument",
        why: format!("expected a string, got {}", value),
    })
}

pub fn as_int(value: &Value) -> Result<i64, AlbiusError> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        return s.trim().parse().map_err(|_| AlbiusError::Decode {
            what: "setup argument",
            why: format!("expected an integer or numeric string, got {:?}", s),
        });
    }
    Err(AlbiusError::Decode { what: "setup argument", why: format!("expected an integer, got {}", value) })
}

pub fn get(params: &[Value], index: usize) -> Result<&Value, AlbiusError> {
    params.get(index).ok_or_else(|| AlbiusError::InvalidArgument {
        why: format!("missing argument at position {}", index),
    })
}

pub fn get_str(params: &[Value], index: usize) -> Result<&str, AlbiusError> {
    as_str(get(params, index)?)
}

pub fn get_str_opt(params: &[Value], index: usize) -> Option<&str> {
    params.get(index).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub fn get_int(params: &[Value], index: usize) -> Result<i64, AlbiusError> {
    as_int(get(params, index)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_number_and_numeric_string() {
        assert_eq!(as_int(&json!(42)).unwrap(), 42);
        assert_eq!(as_int(&json!("42")).unwrap(), 42);
    }

    #[test]
    fn rejects_non_numeric_string() {
        assert!(as_int(&json!("abc")).is_err());
    }

    #[test]
    fn missing_argument_is_invalid_argument() {
        let params: Vec<Value> = vec![json!("only one")];
        assert!(get_str(&params, 1).is_err());
    }
}
