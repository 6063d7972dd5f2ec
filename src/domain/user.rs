use serde::Serialize;

/// A signed-in account. Listings reference it as their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub email: String,
    pub name: String,
}
