use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct StreamerIdentity {
    pub id: String,
    pub login: Login,
    pub display_name: String,
}

impl StreamerIdentity {
    pub fn from_user(user: HelixUser) -> Option<Self> {
        let login = user.login.parse().ok()?;
        Some(Self::new(user.id, login, user.display_name))
    }

    pub fn from_followed(channel: FollowedChannel) -> Option<Self> {
        let login = channel.broadcaster_login.parse().ok()?;
        Some(Self::new(
            channel.broadcaster_id,
            login,
            channel.broadcaster_name,
        ))
    }

    pub fn channel_url(&self) -> String {
        format!("https://www.twitch.tv/{}", self.login)
    }
}
