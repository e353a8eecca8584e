use std::fmt;

use oauth2::{basic::BasicClient, AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppResult, GetField};

type HappyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ClientProvider {
    Google,
    Github,
}

impl ClientProvider {
    pub fn id(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "google.com",
            Github => "github.com",
        }
    }

    fn key(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "google",
            Github => "github",
        }
    }

    fn auth_uri(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "https://accounts.google.com/o/oauth2/auth",
            Github => "https://github.com/login/oauth/authorize",
        }
    }

    fn token_uri(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "https://oauth2.googleapis.com/token",
            Github => "https://github.com/login/oauth/access_token",
        }
    }
}

impl fmt::Display for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone)]
pub struct Clients {
    pub(crate) firebase_idpurl: String,
    google_client: Option<HappyClient>,
    github_client: Option<HappyClient>,
}

impl Clients {
    /// `json` is the client-secret file: a `firebase.apikey` plus one
    /// `client_id`/`client_secret` object per configured provider.
    /// Providers without keys stay disabled instead of failing boot.
    pub fn from_json(json: Value, base_url: &str) -> AppResult<Clients> {
        let firebase_idpurl = format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp?key={}",
            json.get_obj_field("firebase")?.get_str_field("apikey")?
        );

        Ok(
            Clients {
                firebase_idpurl,
                google_client: Self::build(&json, ClientProvider::Google, base_url)?,
                github_client: Self::build(&json, ClientProvider::Github, base_url)?,
            }
        )
    }

    fn build(json: &Value, provider: ClientProvider, base_url: &str) -> AppResult<Option<HappyClient>> {
        let Some(json) = json.get(provider.key()) else {
            return Ok(None);
        };

        let client_id = ClientId::new(json.get_str_field("client_id")?);
        let client_secret = ClientSecret::new(json.get_str_field("client_secret")?);

        let auth_url = AuthUrl::new(provider.auth_uri().to_owned())?;
        let token_url = TokenUrl::new(provider.token_uri().to_owned())?;
        let redirect_url = RedirectUrl::new(format!("{base_url}/lockin/{}", provider.key()))?;

        Ok(Some(
            BasicClient::new(client_id)
                .set_client_secret(client_secret)
                .set_auth_uri(auth_url)
                .set_token_uri(token_url)
                .set_redirect_uri(redirect_url)
        ))
    }

    pub fn get_client(&self, provider: ClientProvider) -> AppResult<HappyClient> {
        use ClientProvider::*;
        match provider {
            Google => self.google_client.clone(),
            Github => self.github_client.clone(),
        }.ok_or(anyhow::anyhow!("OAuth provider {provider} keys not supplied").into())
    }
}
