use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `{{ env.VAR }}` and `{{ env.VAR | default("x") }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*(?P<key>[A-Za-z0-9_.]+)\s*(?:\|\s*default\("(?P<default>[^"]*)"\))?\s*\}\}"#)
        .expect("placeholder pattern is valid")
});

/// Failure while expanding configuration placeholders
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// Referenced variable is unset and no default was given
    #[error("line {line}: environment variable `{name}` is not set")]
    MissingVariable { line: usize, name: String },
    /// Placeholder does not use the `env.` scope
    #[error("line {line}: only `env.` placeholders are supported, found `{key}`")]
    UnsupportedScope { line: usize, key: String },
}

/// Expand `{{ env.VAR }}` placeholders in raw configuration text
///
/// Comment lines are copied verbatim so commented-out settings never require
/// their variables to be set.
pub(crate) fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut lines = Vec::new();

    for (index, line) in input.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
        } else {
            lines.push(expand_line(line, index + 1)?);
        }
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str, line_number: usize) -> Result<String, ExpandError> {
    let mut failure = None;

    let expanded = PLACEHOLDER.replace_all(line, |caps: &Captures<'_>| {
        match resolve(caps, line_number) {
            Ok(value) => value,
            Err(e) => {
                if failure.is_none() {
                    failure = Some(e);
                }
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn resolve(caps: &Captures<'_>, line: usize) -> Result<String, ExpandError> {
    let key = &caps["key"];

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope {
            line,
            key: key.to_owned(),
        });
    };

    match (std::env::var(name), caps.name("default")) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.as_str().to_owned()),
        (Err(_), None) => Err(ExpandError::MissingVariable {
            line,
            name: name.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "base_url = \"https://api.fireworks.ai/inference/v1\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn variables_are_substituted() {
        let vars = [("SPARK_KEY", Some("fw-1")), ("SPARK_URL", Some("http://localhost"))];
        temp_env::with_vars(vars, || {
            let out = expand_env("a = \"{{ env.SPARK_KEY }}\"\nb = \"{{env.SPARK_URL}}/v1\"").unwrap();
            assert_eq!(out, "a = \"fw-1\"\nb = \"http://localhost/v1\"");
        });
    }

    #[test]
    fn missing_variable_reports_line() {
        temp_env::with_var_unset("SPARK_MISSING", || {
            let err = expand_env("x = 1\nkey = \"{{ env.SPARK_MISSING }}\"").unwrap_err();
            assert_eq!(
                err,
                ExpandError::MissingVariable {
                    line: 2,
                    name: "SPARK_MISSING".to_owned()
                }
            );
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        let template = "key = \"{{ env.SPARK_OPTIONAL | default(\"fallback\") }}\"";

        temp_env::with_var_unset("SPARK_OPTIONAL", || {
            assert_eq!(expand_env(template).unwrap(), "key = \"fallback\"");
        });
        temp_env::with_var("SPARK_OPTIONAL", Some("set"), || {
            assert_eq!(expand_env(template).unwrap(), "key = \"set\"");
        });
    }

    #[test]
    fn empty_default_is_allowed() {
        temp_env::with_var_unset("SPARK_OPTIONAL", || {
            let out = expand_env("api_key = \"{{ env.SPARK_OPTIONAL | default(\"\") }}\"").unwrap();
            assert_eq!(out, "api_key = \"\"");
        });
    }

    #[test]
    fn other_scopes_are_rejected() {
        let err = expand_env("key = \"{{ vault.TOKEN }}\"").unwrap_err();
        assert!(matches!(err, ExpandError::UnsupportedScope { ref key, .. } if key == "vault.TOKEN"));
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_var_unset("SPARK_MISSING", || {
            let input = "  # api_key = \"{{ env.SPARK_MISSING }}\"\n";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
