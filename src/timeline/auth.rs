use derivative::Derivative;
use derive_new::new;
use secrecy::SecretString;
use url::Url;

pub const AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
pub const AUTH_SCOPE: &str = "user:read:follows";

/// Parameters of the OAuth implicit grant used for signed-in sessions.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ImplicitFlow {
    pub client_id: String,
    pub redirect_uri: Url,
}

impl ImplicitFlow {
    pub fn authorize_url(&self) -> Url {
        let mut url = Url::parse(AUTHORIZE_URL).expect("static url is valid");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", "token")
            .append_pair("scope", AUTH_SCOPE);
        url
    }
}

/// A user access token handed over through the redirect fragment.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct UserToken(#[derivative(Debug = "ignore")] pub SecretString);

impl UserToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Take the token out of `location`'s fragment and strip the fragment, so the token is
    /// read exactly once and never lingers in the location bar.
    pub fn take_from(location: &mut Url) -> Option<Self> {
        let fragment = location.fragment()?.to_string();
        location.set_fragment(None);

        url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == "access_token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .map(Self::new)
    }
}
