// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Note body templates.
//!
//! Templates are plain text with `{{ field }}` placeholders. A placeholder
//! names a field of the record being rendered, and may reach into nested
//! objects through dotted paths like `{{ owner.login }}`.
//!
//! | Value              | Rendered as                   |
//! |--------------------|-------------------------------|
//! | string             | verbatim                      |
//! | number, boolean    | JSON spelling                 |
//! | array of scalars   | items joined with `, `        |
//! | null, missing      | empty string                  |
//! | object, nested arr | compact JSON                  |

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}").expect("valid regex")
});

/// Render template against record context.
pub fn render(template: &str, context: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            lookup(context, &caps[1]).map(stringify).unwrap_or_default()
        })
        .into_owned()
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(", "),
        _ => value.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use simple_test_case::test_case;

    fn context() -> Value {
        json!({
            "full_name": "awkless/oxidot",
            "description": null,
            "stargazers_count": 12,
            "fork": false,
            "topics": ["dotfiles", "cli"],
            "owner": { "login": "awkless" },
            "labels": [{ "name": "bug" }],
        })
    }

    #[test_case("# {{full_name}}", "# awkless/oxidot"; "plain field")]
    #[test_case("{{ owner.login }}", "awkless"; "dotted path with padding")]
    #[test_case("[{{description}}]", "[]"; "null field")]
    #[test_case("[{{missing.field}}]", "[]"; "missing field")]
    #[test_case("{{stargazers_count}} {{fork}}", "12 false"; "number and boolean")]
    #[test_case("{{topics}}", "dotfiles, cli"; "scalar array")]
    #[test_case("{{labels.0.name}}", "bug"; "array index")]
    #[test_case("{{ not a placeholder }}", "{{ not a placeholder }}"; "invalid kept")]
    #[test]
    fn render_placeholders(template: &str, expect: &str) {
        assert_eq!(render(template, &context()), expect);
    }

    #[test]
    fn rendered_values_are_not_expanded_again() {
        let context = json!({ "title": "{{title}}" });
        assert_eq!(render("{{title}}", &context), "{{title}}");
    }
}
