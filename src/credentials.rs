use anyhow::{Context, Result};
use std::env;

/// Supplies the API credential at the moment a request is made.
///
/// Implementations must not cache: the environment may rotate the key between calls.
pub trait CredentialProvider: Send + Sync {
    fn current_credential(&self) -> Result<String>;
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredential {
    fn current_credential(&self) -> Result<String> {
        let key = env::var(&self.var)
            .with_context(|| format!("{} environment variable not set", self.var))?;
        if key.trim().is_empty() {
            anyhow::bail!("{} environment variable is empty", self.var);
        }
        Ok(key)
    }
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn current_credential(&self) -> Result<String> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_missing_env_var_names_the_variable() {
        let provider = EnvCredential::new("SPEC_GENERATOR_TEST_UNSET_KEY");
        let err = provider.current_credential().unwrap_err();
        assert!(err.to_string().contains("SPEC_GENERATOR_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_closure_provider_sees_rotation() {
        let key = Arc::new(Mutex::new("first".to_string()));
        let shared = key.clone();
        let provider = move || -> Result<String> { Ok(shared.lock().unwrap().clone()) };

        assert_eq!(provider.current_credential().unwrap(), "first");
        *key.lock().unwrap() = "second".to_string();
        assert_eq!(provider.current_credential().unwrap(), "second");
    }
}
