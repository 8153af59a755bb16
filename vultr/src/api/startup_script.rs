//! Startup script endpoints

use super::common::{string_or_number, ApiQueryParams, FormParams};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupScript {
    #[serde(rename = "SCRIPTID", deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub script_type: String,
    #[serde(rename = "script", default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct CreatedScript {
    #[serde(rename = "SCRIPTID", deserialize_with = "string_or_number::deserialize")]
    id: String,
}

pub struct StartupScriptApi<'a> {
    client: &'a Client,
}

impl<'a> StartupScriptApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<StartupScript>, ApiError> {
        self.client
            .get_list("/v1/startupscript/list", &ApiQueryParams::new())
            .await
    }

    pub async fn create(
        &self,
        name: &str,
        content: &str,
        script_type: &str,
    ) -> Result<String, ApiError> {
        let form = FormParams::new()
            .add("name", name)
            .add("script", content)
            .add_non_empty("type", script_type);
        let created: CreatedScript = self.client.post("/v1/startupscript/create", &form).await?;
        Ok(created.id)
    }

    pub async fn update(&self, id: &str, name: &str, content: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/startupscript/update",
                &FormParams::new()
                    .add("SCRIPTID", id)
                    .add("name", name)
                    .add("script", content),
            )
            .await
    }

    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/v1/startupscript/destroy",
                &FormParams::new().add("SCRIPTID", id),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn script_decodes_numeric_id() {
        let script: StartupScript = serde_json::from_str(
            r##"{"SCRIPTID":3,"date_created":"2014-05-21 15:27:18","date_modified":"2014-05-21 15:27:18","name":"test","type":"boot","script":"#!/bin/bash\necho hello"}"##,
        )
        .unwrap();

        assert_eq!(script.id, "3");
        assert_eq!(script.script_type, "boot");
        assert!(script.content.starts_with("#!/bin/bash"));
    }
}
