use serde::{Deserialize, Serialize};

/// Push-event envelope, decoded from the webhook body. One per inbound
/// request, discarded after handling.
#[derive(Deserialize, Serialize, Debug)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub owner: Owner,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Owner {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Commit {
    pub id: String,
    pub message: String,
}

/// JWT claims for the App identity assertion.
#[derive(Serialize)]
pub struct Claims {
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}
