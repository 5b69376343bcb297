use serde_json::{Number, Value};
use shard_info_sdk::InfoMap;

/// Parse the text reply of `INFO` into typed values.
///
/// Section headers (`# Server`) and blank lines are skipped. Every other
/// `key:value` line becomes an entry; values that look like `k=v,k=v` become
/// nested maps, numbers become JSON numbers. Repeated `module:` lines are
/// collected into a `modules` array.
#[must_use]
pub fn parse_info(text: &str) -> InfoMap {
    let mut info = InfoMap::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        // `cmdstat_host` carries colons in its key
        let (key, value) = if key == "cmdstat_host" {
            line.rsplit_once(':').unwrap_or((key, value))
        } else {
            (key, value)
        };

        if key == "module" {
            if let Value::Array(modules) = info
                .entry("modules")
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                modules.push(parse_value(value));
            }
        } else {
            info.insert(key.to_owned(), parse_value(value));
        }
    }
    info
}

fn parse_value(value: &str) -> Value {
    if !(value.contains(',') && value.contains('=')) {
        return parse_scalar(value);
    }
    let nested = value
        .split(',')
        .filter_map(|item| item.rsplit_once('='))
        .map(|(k, v)| (k.to_owned(), parse_scalar(v)))
        .collect();
    Value::Object(nested)
}

fn parse_scalar(value: &str) -> Value {
    let number = if value.contains('.') {
        value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
    } else {
        value
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| value.parse::<u64>().ok().map(Number::from))
    };
    number.map_or_else(|| Value::String(value.to_owned()), Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "# Server\r\n\
redis_version:7.2.4\r\n\
redis_mode:standalone\r\n\
process_id:4242\r\n\
\r\n\
# Stats\r\n\
instantaneous_ops_per_sec:117\r\n\
instantaneous_input_kbps:0.12\r\n\
used_memory_human:1.02M\r\n\
\r\n\
# Keyspace\r\n\
db0:keys=12,expires=0,avg_ttl=0\r\n\
module:name=search,ver=20811\r\n\
module:name=json,ver=20607\r\n";

    #[test]
    fn parses_scalars() {
        let info = parse_info(SAMPLE);

        assert_eq!(info["redis_version"], json!("7.2.4"));
        assert_eq!(info["redis_mode"], json!("standalone"));
        assert_eq!(info["process_id"], json!(4242));
        assert_eq!(info["instantaneous_ops_per_sec"], json!(117));
        assert_eq!(info["instantaneous_input_kbps"], json!(0.12));
        assert_eq!(info["used_memory_human"], json!("1.02M"));
    }

    #[test]
    fn skips_sections_and_blank_lines() {
        let info = parse_info(SAMPLE);
        assert!(info.keys().all(|k| !k.starts_with('#') && !k.is_empty()));
    }

    #[test]
    fn nests_key_value_lists() {
        let info = parse_info(SAMPLE);
        assert_eq!(info["db0"], json!({"keys": 12, "expires": 0, "avg_ttl": 0}));
    }

    #[test]
    fn collects_modules() {
        let info = parse_info(SAMPLE);
        assert_eq!(
            info["modules"],
            json!([
                {"name": "search", "ver": 20811},
                {"name": "json", "ver": 20607},
            ])
        );
        assert!(!info.contains_key("module"));
    }

    #[test]
    fn single_pair_stays_a_string() {
        let info = parse_info("executable:/usr/bin/redis-server\nmaster_link:a=b\n");
        assert_eq!(info["executable"], json!("/usr/bin/redis-server"));
        assert_eq!(info["master_link"], json!("a=b"));
    }

    #[test]
    fn cmdstat_host_splits_on_last_colon() {
        let info = parse_info("cmdstat_host:calls=1,usec=2\n");
        assert_eq!(info["cmdstat_host"], json!({"calls": 1, "usec": 2}));
    }

    #[test]
    fn empty_reply() {
        assert!(parse_info("").is_empty());
    }
}
