//! OpenAI chat-completions client used for field enrichment.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config::Config;
use crate::reconcile::{coerce_value, NO_DATA};

pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
            timeout: Duration::from_secs(config.openai_timeout_s),
        }
    }

    /// Ask the model to complete the authoritative keys and merge its reply
    /// over the reconciled mapping.
    ///
    /// The reply is requested in JSON mode at temperature 0. Any failure
    /// (transport, status, shape) surfaces as an error; the caller degrades
    /// to the reconciled mapping, so enrichment can never break assembly.
    pub async fn enrich(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        reconciled: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "response_format": {"type": "json_object"},
            "temperature": 0,
        });

        info!("Requesting field completion from model {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        let raw = body["choices"][0]["message"]["content"]
            .as_str()
            .context("chat completion reply carried no text content")?;
        let reply: Map<String, Value> =
            serde_json::from_str(raw).context("model reply was not a JSON object")?;

        Ok(merge_reply(reconciled, &reply))
    }
}

/// Merge a model reply over the reconciled mapping, keeping exactly the
/// reconciled key set: unknown reply keys are dropped, missing keys keep
/// their reconciled value, and a model "no data" never overwrites a
/// caller-supplied value.
fn merge_reply(
    reconciled: &BTreeMap<String, String>,
    reply: &Map<String, Value>,
) -> BTreeMap<String, String> {
    reconciled
        .iter()
        .map(|(key, current)| {
            let value = match reply.get(key) {
                Some(v) => {
                    let coerced = coerce_value(v);
                    if coerced == NO_DATA {
                        current.clone()
                    } else {
                        coerced
                    }
                }
                None => current.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconciled(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reply_keys_outside_the_authoritative_set_are_dropped() {
        let base = reconciled(&[("sitio_web", NO_DATA)]);
        let reply = json!({ "sitio_web": "https://acme.example", "extra": "x" });
        let merged = merge_reply(&base, reply.as_object().unwrap());
        let got: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(got, vec!["sitio_web"]);
        assert_eq!(merged["sitio_web"], "https://acme.example");
    }

    #[test]
    fn missing_reply_keys_keep_the_reconciled_value() {
        let base = reconciled(&[("cliente_marca", "Acme"), ("sitio_web", NO_DATA)]);
        let reply = json!({});
        let merged = merge_reply(&base, reply.as_object().unwrap());
        assert_eq!(merged["cliente_marca"], "Acme");
        assert_eq!(merged["sitio_web"], NO_DATA);
    }

    #[test]
    fn a_model_no_data_never_overwrites_a_caller_value() {
        let base = reconciled(&[("cliente_marca", "Acme")]);
        let reply = json!({ "cliente_marca": NO_DATA });
        let merged = merge_reply(&base, reply.as_object().unwrap());
        assert_eq!(merged["cliente_marca"], "Acme");
    }

    #[test]
    fn reply_values_are_coerced() {
        let base = reconciled(&[("referencias", NO_DATA)]);
        let reply = json!({ "referencias": ["a", "b"] });
        let merged = merge_reply(&base, reply.as_object().unwrap());
        assert_eq!(merged["referencias"], r#"["a","b"]"#);
    }
}
