//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a configuration value.
///
/// An unset variable without a default is an error naming `field`. Values
/// without `${` are returned unchanged, so a literal `$` in a URL is safe.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a variable that could not be looked up.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_kroki_url_from_env() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MERMAIDER_TEST_KROKI_HOST", "kroki.internal:8000");
        }
        let result = expand_env("http://${MERMAIDER_TEST_KROKI_HOST}", "kroki.url").unwrap();
        assert_eq!(result, "http://kroki.internal:8000");
        unsafe {
            std::env::remove_var("MERMAIDER_TEST_KROKI_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MERMAIDER_TEST_UNSET_URL");
        }
        let result =
            expand_env("${MERMAIDER_TEST_UNSET_URL:-https://kroki.io}", "kroki.url").unwrap();
        assert_eq!(result, "https://kroki.io");
    }

    #[test]
    fn test_expand_value_wins_over_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MERMAIDER_TEST_SET_URL", "http://localhost:8000");
        }
        let result =
            expand_env("${MERMAIDER_TEST_SET_URL:-https://kroki.io}", "kroki.url").unwrap();
        assert_eq!(result, "http://localhost:8000");
        unsafe {
            std::env::remove_var("MERMAIDER_TEST_SET_URL");
        }
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MERMAIDER_TEST_MISSING");
        }
        let err = expand_env("${MERMAIDER_TEST_MISSING}", "kroki.url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in kroki.url: ${MERMAIDER_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_dollar_unchanged() {
        let result = expand_env("https://example.com/$path", "kroki.url").unwrap();
        assert_eq!(result, "https://example.com/$path");
    }
}
