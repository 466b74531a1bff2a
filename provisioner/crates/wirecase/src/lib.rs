//! Recursive JSON key-case conversion.
//!
//! Internal callers speak camelCase; the provisioning wire peers speak
//! snake_case. These helpers rewrite every object key in a
//! [`serde_json::Value`] tree, leaving values (including string values)
//! untouched. Arrays are traversed, and arrays of objects nested inside
//! arrays convert correctly.
//!
//! Keys whose segments are lowercase alphanumeric words round-trip
//! exactly: `snake_case_keys(camel_case_keys(v)) == v`. Keys without a
//! case boundary (for example `$metadata`) pass through unchanged, and
//! both conversions are idempotent over their own output. If two sibling
//! keys collapse to the same converted key, the later entry wins.

use serde_json::Value;

/// Convert a single key from snake_case (or kebab-free mixed case) to
/// camelCase.
///
/// Underscores are treated as segment separators and removed; the first
/// character of each subsequent segment is upper-cased. Characters after
/// a segment's first retain their original case, so camelCase input is a
/// fixed point.
#[must_use]
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut boundary = false;
    let mut leading = true;
    for ch in key.chars() {
        if ch == '_' {
            boundary = !leading;
            continue;
        }
        if leading {
            out.extend(ch.to_lowercase());
            leading = false;
        } else if boundary {
            out.extend(ch.to_uppercase());
            boundary = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a single key from camelCase to snake_case.
///
/// An underscore is inserted before an upper-case character that either
/// follows a lower-case character or digit, or begins a new word after an
/// acronym run (upper-case character followed by a lower-case one).
/// snake_case input is a fixed point.
#[must_use]
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_uppercase() {
            let follows_word = prev.is_some_and(|p| p != '_');
            let after_lower = prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            let before_lower = chars.peek().is_some_and(|n| n.is_lowercase());
            if follows_word && (after_lower || before_lower) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

fn convert_keys<F>(value: Value, convert: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, nested)| (convert(&key), convert_keys(nested, convert)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

/// Rewrite every object key in `value` to camelCase, recursively.
#[must_use]
pub fn camel_case_keys(value: Value) -> Value {
    convert_keys(value, &camel_case)
}

/// Rewrite every object key in `value` to snake_case, recursively.
#[must_use]
pub fn snake_case_keys(value: Value) -> Value {
    convert_keys(value, &snake_case)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{camel_case, camel_case_keys, snake_case, snake_case_keys};

    #[rstest]
    #[case::plain_word("portfolio", "portfolio")]
    #[case::two_segments("task_orders", "taskOrders")]
    #[case::three_segments("pop_start_date", "popStartDate")]
    #[case::already_camel("popStartDate", "popStartDate")]
    #[case::leading_capital("Portfolio", "portfolio")]
    #[case::sigil_key("$metadata", "$metadata")]
    #[case::empty("", "")]
    fn camel_case_converts(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(camel_case(input), expected);
    }

    #[rstest]
    #[case::plain_word("portfolio", "portfolio")]
    #[case::two_words("taskOrders", "task_orders")]
    #[case::three_words("popStartDate", "pop_start_date")]
    #[case::already_snake("pop_start_date", "pop_start_date")]
    #[case::acronym_run("cspAPIError", "csp_api_error")]
    #[case::digit_boundary("clin0001Total", "clin0001_total")]
    #[case::sigil_key("$metadata", "$metadata")]
    #[case::empty("", "")]
    fn snake_case_converts(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(snake_case(input), expected);
    }

    #[rstest]
    #[case::snake_native("task_order_number")]
    #[case::single_word("name")]
    #[case::many_segments("pop_end_date")]
    fn snake_keys_round_trip_through_camel(#[case] key: &str) {
        assert_eq!(snake_case(&camel_case(key)), key);
    }

    #[rstest]
    fn converts_nested_objects_and_arrays() {
        let wire = json!({
            "task_orders": [
                {
                    "task_order_number": "1234567890123",
                    "clins": [
                        {"clin_number": "0001", "pop_start_date": "2026-01-01"}
                    ]
                }
            ],
            "name": "Sample Portfolio"
        });
        let expected = json!({
            "taskOrders": [
                {
                    "taskOrderNumber": "1234567890123",
                    "clins": [
                        {"clinNumber": "0001", "popStartDate": "2026-01-01"}
                    ]
                }
            ],
            "name": "Sample Portfolio"
        });
        assert_eq!(camel_case_keys(wire), expected);
    }

    #[rstest]
    fn converts_objects_inside_nested_arrays() {
        let value = json!([[{"innerKey": 1}], [[{"deeperKey": 2}]]]);
        let expected = json!([[{"inner_key": 1}], [[{"deeper_key": 2}]]]);
        assert_eq!(snake_case_keys(value), expected);
    }

    #[rstest]
    fn leaves_string_values_untouched() {
        let value = json!({"displayName": "camelCase stays put"});
        assert_eq!(
            snake_case_keys(value),
            json!({"display_name": "camelCase stays put"})
        );
    }

    #[rstest]
    fn scalars_pass_through() {
        let scalars = [
            json!(null),
            json!(42),
            json!("someKeyLike_string"),
            json!(true),
        ];
        for value in scalars {
            assert_eq!(camel_case_keys(value.clone()), value);
            assert_eq!(snake_case_keys(value.clone()), value);
        }
    }

    #[rstest]
    fn conversions_are_idempotent() {
        let value = json!({
            "provisioningJobId": "2f2a2c0f-0000-4000-8000-000000000000",
            "targetCsp": {"name": "CSP_A", "uri": "https://csp.example"}
        });
        let once = snake_case_keys(value);
        assert_eq!(snake_case_keys(once.clone()), once);
        let back = camel_case_keys(once);
        assert_eq!(camel_case_keys(back.clone()), back);
    }
}
