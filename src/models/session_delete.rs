use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query for deleting a session
#[derive(Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SessionDeleteQuery {
    pub user_id: String,
}

/// Response returned after deleting a session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDeleteResponse {
    pub success: bool,
    pub evicted_connections: usize,
}
