use crate::{error::Result, spotify::SpotifyClient, types::UserProfile};

impl SpotifyClient {
    /// `GET /me`
    pub async fn current_user(&self) -> Result<UserProfile> {
        let url = self.url("/me");
        let response = self
            .send(|http, token| http.get(&url).bearer_auth(token))
            .await?;
        Ok(response.json::<UserProfile>().await?)
    }
}
