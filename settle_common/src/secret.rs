use std::{env, fmt};

const MASK: &str = "****";

/// A credential (API key, signing secret) that travels inside config structs. `Debug` and `Display` print a mask, so
/// the structs can be logged whole. [`Secret::reveal`] is the only way to the value.
#[derive(Clone, Default)]
pub struct Secret<T = String> {
    value: T,
}

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// Reads a credential from the environment variable `name`. Surrounding whitespace is trimmed, since secrets
    /// mounted from files usually end in a newline. Unset and blank variables give `None`.
    pub fn from_env(name: &str) -> Option<Self> {
        env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).map(Self::new)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({MASK})")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}
