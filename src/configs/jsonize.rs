use std::{fs, path::Path};

use serde_json::{Map, Value};

use crate::error::Result;

/// Normalizes a configuration value into plain interchange data.
///
/// `ndarray` serializes arrays as `{"v": 1, "dim": [...], "data": [...]}`
/// maps; this rewrites every such value into the equivalent nested JSON
/// lists so the persisted config is readable without the encoding.
/// Mappings and lists are rebuilt recursively, everything else passes
/// through. Applying it twice gives the same result as applying it
/// once, and finite values survive unchanged.
pub fn jsonize(value: &Value) -> Value {
    match value {
        Value::Object(map) => match decode_array(map) {
            Some(lists) => lists,
            None => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), jsonize(value)))
                    .collect(),
            ),
        },
        Value::Array(items) => Value::Array(items.iter().map(jsonize).collect()),
        other => other.clone(),
    }
}

/// Writes a configuration as UTF-8 JSON with 2-space indentation.
///
/// # Errors
/// Returns `Json` if encoding fails, `Io` if the write fails.
pub fn write_config(path: &Path, config: &Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(config)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

/// Reads back a persisted configuration.
///
/// # Errors
/// Returns `Io` if the file cannot be read, `Json` if it is not valid
/// JSON.
pub fn read_config(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Recognizes ndarray's serialized map form and rebuilds it as nested
/// lists. Returns `None` for anything that does not match exactly.
fn decode_array(map: &Map<String, Value>) -> Option<Value> {
    if map.len() != 3 {
        return None;
    }

    map.get("v")?.as_u64()?;
    let dim: Vec<usize> = map
        .get("dim")?
        .as_array()?
        .iter()
        .map(|d| d.as_u64().map(|d| d as usize))
        .collect::<Option<_>>()?;
    let data = map.get("data")?.as_array()?;

    if !data.iter().all(Value::is_number) {
        return None;
    }
    if dim.iter().product::<usize>() != data.len() {
        return None;
    }

    Some(nest(&dim, data))
}

fn nest(dim: &[usize], data: &[Value]) -> Value {
    match dim {
        [] | [_] => Value::Array(data.to_vec()),
        [first, rest @ ..] => {
            if *first == 0 {
                return Value::Array(Vec::new());
            }
            let stride = data.len() / first;
            Value::Array(data.chunks(stride).map(|chunk| nest(rest, chunk)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};
    use serde_json::json;

    use super::*;

    fn config_with_arrays() -> Value {
        json!({
            "model": {
                "arch": "feed_forward",
                "args": {
                    "hidden": [8, 4],
                    "input_means": serde_json::to_value(arr1(&[0.5f32, 1.5])).unwrap(),
                    "input_scale": serde_json::to_value(arr2(&[[1.0f32, 2.0], [3.0, 4.0]])).unwrap(),
                },
            },
            "onsetwise": true,
        })
    }

    #[test]
    fn arrays_become_nested_lists() {
        let converted = jsonize(&config_with_arrays());
        let args = &converted["model"]["args"];

        assert_eq!(args["input_means"], json!([0.5, 1.5]));
        assert_eq!(args["input_scale"], json!([[1.0, 2.0], [3.0, 4.0]]));
        // Untouched values pass through.
        assert_eq!(args["hidden"], json!([8, 4]));
        assert_eq!(converted["onsetwise"], json!(true));
    }

    #[test]
    fn jsonize_is_idempotent() {
        let once = jsonize(&config_with_arrays());
        let twice = jsonize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn non_array_maps_are_left_alone() {
        let value = json!({ "v": 1, "dim": [2], "data": ["not", "numbers"] });
        assert_eq!(jsonize(&value), value);

        let value = json!({ "v": 1, "dim": [3], "data": [1.0, 2.0] });
        assert_eq!(jsonize(&value), value, "dim/data length mismatch");
    }

    #[test]
    fn write_then_read_round_trips() {
        let converted = jsonize(&config_with_arrays());
        let path = std::env::temp_dir().join(format!(
            "expressive_training_config_{}.json",
            std::process::id()
        ));

        write_config(&path, &converted).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let read_back = read_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(read_back, converted);
        // 2-space indentation, as produced by the pretty writer.
        assert!(content.contains("\n  \"model\""));
    }
}
