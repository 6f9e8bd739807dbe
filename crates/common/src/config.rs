use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read a string variable, falling back to `default` when unset.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset.
///
/// A variable that is set but does not parse is an error rather than a
/// silent fallback, so a typo in a deployment manifest fails at startup.
pub fn parse_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value {:?} for {}: {}", raw, key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_defaults_to_development() {
        unsafe { env::remove_var("ENVIRONMENT") };
        assert_eq!(Environment::from_env(), Environment::Development);
    }

    #[test]
    #[serial]
    fn test_environment_accepts_prod_alias() {
        unsafe { env::set_var("ENVIRONMENT", "PROD") };
        assert_eq!(Environment::from_env(), Environment::Production);
        unsafe { env::remove_var("ENVIRONMENT") };
    }

    #[test]
    #[serial]
    fn test_parse_env_or_uses_default_when_unset() {
        unsafe { env::remove_var("COMMON_TEST_PORT") };
        assert_eq!(parse_env_or("COMMON_TEST_PORT", 8080u16).unwrap(), 8080);
    }

    #[test]
    #[serial]
    fn test_parse_env_or_rejects_garbage() {
        unsafe { env::set_var("COMMON_TEST_PORT", "eighty") };
        let err = parse_env_or("COMMON_TEST_PORT", 8080u16).unwrap_err();
        assert!(err.to_string().contains("COMMON_TEST_PORT"));
        unsafe { env::remove_var("COMMON_TEST_PORT") };
    }
}
