use serde::Deserialize;

use crate::error::AppResult;
use crate::models::User;

use super::ApiClient;

/// Relative path of the customer directory used for credential checks.
pub const DIRECTORY_PATH: &str = "customers/customers.json";

/// The directory endpoint has shipped both a bare array and a wrapped
/// `{"data": [...]}` payload; accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectoryResponse {
    Wrapped { data: Vec<User> },
    Bare(Vec<User>),
}

impl DirectoryResponse {
    fn into_users(self) -> Vec<User> {
        match self {
            DirectoryResponse::Wrapped { data } => data,
            DirectoryResponse::Bare(users) => users,
        }
    }
}

/// Fetch every directory record, plaintext passwords included. Used only by
/// the authentication path; the records must not escape it.
pub async fn fetch_users(client: &ApiClient) -> AppResult<Vec<User>> {
    let response: DirectoryResponse = client.get(DIRECTORY_PATH).await?;
    Ok(response.into_users())
}

#[cfg(test)]
mod tests {
    use super::DirectoryResponse;

    const RECORD: &str =
        r#"{"id":"u1","email":"a@x.com","name":"A","password":"p1","customerId":"c1"}"#;

    #[test]
    fn accepts_a_bare_array() {
        let raw = format!("[{RECORD}]");
        let users = serde_json::from_str::<DirectoryResponse>(&raw)
            .unwrap()
            .into_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[test]
    fn accepts_the_data_wrapper() {
        let raw = format!(r#"{{"data":[{RECORD}]}}"#);
        let users = serde_json::from_str::<DirectoryResponse>(&raw)
            .unwrap()
            .into_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "a@x.com");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(serde_json::from_str::<DirectoryResponse>(r#"{"users":[]}"#).is_err());
    }
}
