use crate::{api::ApiClient, error::ClientResult, models::Profile};

#[derive(Clone)]
pub struct ProfileService {
    client: ApiClient,
}

impl ProfileService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn my_profile(&self) -> ClientResult<Profile> {
        self.client.get("/my-profile/").await
    }
}
