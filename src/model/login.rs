use snafu::Snafu;

use super::*;

const MAX_LOGIN_LENGTH: usize = 25;

/// A channel login name. Logins compare case-insensitively, so the stored form is always
/// trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Login {
    type Err = ParseLogin;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let login = input.trim().to_lowercase();

        let valid = !login.is_empty()
            && login.len() <= MAX_LOGIN_LENGTH
            && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Ok(Login(login))
        } else {
            Err(ParseLogin::new(input.to_string()))
        }
    }
}

impl TryFrom<String> for Login {
    type Error = ParseLogin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Snafu, new)]
#[snafu(display("'{text}' is not a valid channel login"))]
pub struct ParseLogin {
    pub text: String,
}
