use crate::model::Login;

/// Ordered set of tracked channel logins. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedStreamers(Vec<Login>);

impl TrackedStreamers {
    pub fn from_logins(logins: impl IntoIterator<Item = Login>) -> Self {
        let mut streamers = Self::default();
        for login in logins {
            streamers.add(login);
        }
        streamers
    }

    /// Returns `false` when `login` was already tracked.
    pub fn add(&mut self, login: Login) -> bool {
        if self.contains(&login) {
            return false;
        }
        self.0.push(login);
        true
    }

    pub fn remove(&mut self, login: &Login) -> bool {
        let before = self.0.len();
        self.0.retain(|tracked| tracked != login);
        self.0.len() != before
    }

    pub fn contains(&self, login: &Login) -> bool {
        self.0.contains(login)
    }

    pub fn as_slice(&self) -> &[Login] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
