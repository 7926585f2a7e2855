// 覆写值与 URL 查询参数的编解码
//
// 查询字符串只能承载纯文本，这里负责保留覆写值的 JSON 类型：
// - 非字符串值写成 JSON 文本（true、42、{"a":1}）
// - 可能被误读成其他值的字符串加上引号（"42"）
// - 普通字符串原样写入，保持地址栏可读

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use url::Url;
use url::form_urlencoded;

// 解析参数值：优先按 JSON 解析，失败时视为普通字符串
pub fn decode_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

// 序列化覆写值，保证 decode_value(encode_value(v)) == v
//
// 限制：serde_json 解析时最多嵌套 127 层，更深的数组或对象解码时会退化为字符串。
pub fn encode_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => {
            // 空值在命名空间中表示移除，字符串本身能被解析的也要加引号
            if text.is_empty() || serde_json::from_str::<JsonValue>(text).is_ok() {
                value.to_string()
            } else {
                text.clone()
            }
        }
        other => other.to_string(),
    }
}

// 列出命名空间下的全部参数（已去掉前缀），保持地址中的顺序
pub fn scan_namespace(url: &Url, prefix: &str) -> Vec<(String, String)> {
    url.query_pairs()
        .filter_map(|(key, value)| {
            let flag_key = key.strip_prefix(prefix)?;
            Some((flag_key.to_string(), value.into_owned()))
        })
        .collect()
}

// 重写命名空间：移除所有带前缀的参数，再按 entries 逐个写入
//
// 命名空间之外的参数保持原始编码不变，片段（#...）同样保留。
pub fn rewrite_namespace(url: &Url, prefix: &str, entries: &BTreeMap<String, JsonValue>) -> Url {
    let query = url.query().unwrap_or("");
    let retained: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty() && !segment_in_namespace(segment, prefix))
        .collect();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (flag_key, value) in entries {
        serializer.append_pair(&format!("{prefix}{flag_key}"), &encode_value(value));
    }
    let namespace_query = serializer.finish();

    let mut segments: Vec<&str> = retained;
    if !namespace_query.is_empty() {
        segments.push(&namespace_query);
    }

    let mut rewritten = url.clone();
    if segments.is_empty() {
        rewritten.set_query(None);
    } else {
        rewritten.set_query(Some(&segments.join("&")));
    }
    rewritten
}

// 判断原始查询片段（key=value）的键是否属于命名空间
fn segment_in_namespace(segment: &str, prefix: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "ld_override_";

    fn url(href: &str) -> Url {
        Url::parse(href).unwrap()
    }

    #[test]
    fn test_decode_value_types() {
        assert_eq!(decode_value("true"), json!(true));
        assert_eq!(decode_value("42"), json!(42));
        assert_eq!(decode_value("\"x\""), json!("x"));
        assert_eq!(decode_value("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(decode_value("[1,2]"), json!([1, 2]));
        assert_eq!(decode_value("null"), JsonValue::Null);
    }

    #[test]
    fn test_decode_value_falls_back_to_string() {
        assert_eq!(decode_value("hello world"), json!("hello world"));
        assert_eq!(decode_value("{broken"), json!("{broken"));
        assert_eq!(decode_value(""), json!(""));
    }

    #[test]
    fn test_encode_value_plain_and_ambiguous_strings() {
        assert_eq!(encode_value(&json!("hello")), "hello");
        assert_eq!(encode_value(&json!("42")), "\"42\"");
        assert_eq!(encode_value(&json!("true")), "\"true\"");
        assert_eq!(encode_value(&json!("null")), "\"null\"");
        assert_eq!(encode_value(&json!("")), "\"\"");
    }

    #[test]
    fn test_encode_value_non_strings() {
        assert_eq!(encode_value(&json!(false)), "false");
        assert_eq!(encode_value(&json!(3.5)), "3.5");
        let object = json!({"a": [1, "b"]});
        assert_eq!(encode_value(&object), r#"{"a":[1,"b"]}"#);
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let values = vec![
            json!("42"),
            json!("true"),
            json!("\"quoted\""),
            json!("[1]"),
            json!(""),
            json!(" 7 "),
            json!("hello world"),
            json!("variant-b"),
            json!(true),
            json!(-12),
            json!(0.25),
            JsonValue::Null,
            json!([1, "two", null]),
            json!({"nested": {"k": "42"}}),
        ];

        for value in values {
            let decoded = decode_value(&encode_value(&value));
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_round_trip_nesting_limit() {
        let nested = |depth: usize| (0..depth).fold(json!(0), |inner, _| json!([inner]));

        let shallow = nested(100);
        assert_eq!(decode_value(&encode_value(&shallow)), shallow);

        let deep = nested(130);
        let decoded = decode_value(&encode_value(&deep));
        assert!(decoded.is_string());
        assert_eq!(decoded.as_str(), Some(encode_value(&deep).as_str()));
    }

    #[test]
    fn test_scan_namespace_strips_prefix() {
        let href = "https://app.test/?clientSideId=abc&ld_override_flag-a=true\
                    &ld_override__clear&ld_override_b=";
        let page = url(href);
        let entries = scan_namespace(&page, PREFIX);

        assert_eq!(
            entries,
            vec![
                ("flag-a".to_string(), "true".to_string()),
                ("_clear".to_string(), String::new()),
                ("b".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_scan_namespace_decodes_values() {
        let href = "https://app.test/?ld_override_msg=hello+world\
                    &ld_override_obj=%7B%22a%22%3A1%7D";
        let page = url(href);
        let entries = scan_namespace(&page, PREFIX);

        assert_eq!(entries[0].0, "msg");
        assert_eq!(entries[0].1, "hello world");
        assert_eq!(decode_value(&entries[1].1), json!({"a": 1}));
    }

    #[test]
    fn test_rewrite_namespace_keeps_foreign_params() {
        let href = "https://app.test/page?utm=a%20b&ld_override_old=1&keep=x#section";
        let page = url(href);
        let mut entries = BTreeMap::new();
        entries.insert("new".to_string(), json!("42"));

        let rewritten = rewrite_namespace(&page, PREFIX, &entries);

        assert_eq!(
            rewritten.as_str(),
            "https://app.test/page?utm=a%20b&keep=x&ld_override_new=%2242%22#section"
        );
        assert_eq!(scan_namespace(&rewritten, PREFIX).len(), 1);
    }

    #[test]
    fn test_rewrite_namespace_removes_sentinel_and_empty_query() {
        let href = "https://app.test/?ld_override__clear&ld_override_a=1";
        let page = url(href);
        let rewritten = rewrite_namespace(&page, PREFIX, &BTreeMap::new());

        assert_eq!(rewritten.as_str(), "https://app.test/");
        assert_eq!(rewritten.query(), None);
    }

    #[test]
    fn test_rewrite_namespace_is_idempotent() {
        let page = url("https://app.test/?x=1");
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), json!(true));
        entries.insert("b".to_string(), json!("text value"));

        let once = rewrite_namespace(&page, PREFIX, &entries);
        let twice = rewrite_namespace(&once, PREFIX, &entries);

        assert_eq!(once, twice);
        assert_eq!(
            once.as_str(),
            "https://app.test/?x=1&ld_override_a=true&ld_override_b=text+value"
        );
    }
}
