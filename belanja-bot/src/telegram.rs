//! Thin Telegram Bot API client plus the update types the webhooks
//! deserialize. Only the handful of methods the two bots actually use.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// One webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: Chat,
    pub text: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub location: Option<TgLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Telegram sends several sizes per photo; we keep the largest.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl Message {
    /// The largest photo size, if the message carries a photo.
    pub fn best_photo(&self) -> Option<&PhotoSize> {
        self.photo
            .as_deref()?
            .iter()
            .max_by_key(|p| p.file_size.unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    base: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base: "https://api.telegram.org".to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .with_context(|| format!("telegram {method} request"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("telegram {method} error: {status} {txt}");
        }

        let out: ApiResponse<T> = resp
            .json()
            .await
            .with_context(|| format!("parse telegram {method} response"))?;
        if !out.ok {
            bail!(
                "telegram {method} failed: {}",
                out.description.unwrap_or_default()
            );
        }
        out.result
            .ok_or_else(|| anyhow::anyhow!("telegram {method} returned no result"))
    }

    /// Send a Markdown-formatted message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Req<'a> {
            chat_id: i64,
            text: &'a str,
            parse_mode: &'a str,
        }

        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &Req {
                    chat_id,
                    text,
                    parse_mode: "Markdown",
                },
            )
            .await?;
        Ok(())
    }

    /// Resolve a file_id to a downloadable URL.
    pub async fn file_url(&self, file_id: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            file_id: &'a str,
        }

        #[derive(Deserialize)]
        struct File {
            file_path: Option<String>,
        }

        let file: File = self.call("getFile", &Req { file_id }).await?;
        let path = file
            .file_path
            .ok_or_else(|| anyhow::anyhow!("getFile returned no file_path"))?;
        Ok(format!("{}/file/bot{}/{}", self.base, self.token, path))
    }

    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Req<'a> {
            url: &'a str,
        }

        let _: serde_json::Value = self.call("setWebhook", &Req { url }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserializes_text_message() {
        let raw = r#"{
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 7, "username": "ali", "first_name": "Ali"},
                "chat": {"id": 7},
                "text": "Nasi ayam RM10.50"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, 7);
        assert_eq!(msg.text.as_deref(), Some("Nasi ayam RM10.50"));
        assert_eq!(msg.from.unwrap().username.as_deref(), Some("ali"));
    }

    #[test]
    fn test_best_photo_picks_largest() {
        let raw = r#"{
            "message_id": 1,
            "chat": {"id": 5},
            "photo": [
                {"file_id": "small", "file_size": 100},
                {"file_id": "big", "file_size": 9000},
                {"file_id": "mid", "file_size": 4000}
            ]
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.best_photo().unwrap().file_id, "big");
    }

    #[test]
    fn test_unknown_update_kinds_still_deserialize() {
        // e.g. edited_message deliveries arrive with no "message" field.
        let update: Update = serde_json::from_str(r#"{"update_id": 2}"#).unwrap();
        assert!(update.message.is_none());
    }
}
