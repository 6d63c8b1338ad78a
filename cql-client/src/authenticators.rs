use std::collections::HashMap;

const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";

/// Credentials sent in reply to an authentication request from the server. The protocol only
/// supports a single credentials exchange, so these are sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    entries: HashMap<String, String>,
}

impl Credentials {
    /// Creates credentials for password based authenticators.
    pub fn new_password<S: ToString>(username: S, password: S) -> Credentials {
        let mut entries = HashMap::with_capacity(2);
        entries.insert(USERNAME_KEY.to_string(), username.to_string());
        entries.insert(PASSWORD_KEY.to_string(), password.to_string());

        Credentials { entries }
    }

    #[inline]
    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }
}

impl From<Credentials> for HashMap<String, String> {
    fn from(credentials: Credentials) -> Self {
        credentials.entries
    }
}
