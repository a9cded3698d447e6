//! LINE Messaging API client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared::{ChatSource, Error, ProfileResolver, Result};
use tracing::{error, info};

const API_BASE: &str = "https://api.line.me/v2/bot";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    display_name: String,
}

pub struct LineClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl LineClient {
    pub fn new(http_client: reqwest::Client, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
        }
    }

    /// Reply to an event with up to five messages.
    pub async fn reply(&self, reply_token: &str, messages: Vec<Value>) -> Result<()> {
        let payload = serde_json::json!({
            "replyToken": reply_token,
            "messages": messages,
        });

        let response = self
            .http_client
            .post(format!("{}/message/reply", API_BASE))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Failed to send reply: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("LINE reply failed: {} - {}", status, body);
            return Err(Error::UpstreamUnavailable(format!("LINE reply failed: {}", status)));
        }

        Ok(())
    }

    /// Leave the group or room the message came from. One-to-one chats
    /// cannot be left.
    pub async fn leave(&self, source: &ChatSource) -> Result<()> {
        let url = match source {
            ChatSource::Group { group_id, .. } => format!("{}/group/{}/leave", API_BASE, group_id),
            ChatSource::Room { room_id, .. } => format!("{}/room/{}/leave", API_BASE, room_id),
            ChatSource::User { .. } => return Ok(()),
        };

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Failed to leave chat: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "LINE leave failed: {}",
                response.status()
            )));
        }

        info!(group_id = source.group_id(), "Left chat");
        Ok(())
    }
}

fn profile_url(source: &ChatSource) -> String {
    match source {
        ChatSource::Group { group_id, user_id } => {
            format!("{}/group/{}/member/{}", API_BASE, group_id, user_id)
        }
        ChatSource::Room { room_id, user_id } => {
            format!("{}/room/{}/member/{}", API_BASE, room_id, user_id)
        }
        ChatSource::User { user_id } => format!("{}/profile/{}", API_BASE, user_id),
    }
}

#[async_trait]
impl ProfileResolver for LineClient {
    async fn resolve_display_name(&self, source: &ChatSource) -> Result<String> {
        let response = self
            .http_client
            .get(profile_url(source))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Profile request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "Profile lookup returned {}",
                response.status()
            )));
        }

        let profile: Profile = response
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("Malformed profile: {}", e)))?;

        Ok(profile.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_by_source() {
        let group = ChatSource::Group {
            group_id: "C1".into(),
            user_id: "U1".into(),
        };
        let room = ChatSource::Room {
            room_id: "R1".into(),
            user_id: "U1".into(),
        };
        let user = ChatSource::User { user_id: "U1".into() };

        assert_eq!(profile_url(&group), "https://api.line.me/v2/bot/group/C1/member/U1");
        assert_eq!(profile_url(&room), "https://api.line.me/v2/bot/room/R1/member/U1");
        assert_eq!(profile_url(&user), "https://api.line.me/v2/bot/profile/U1");
    }

    #[test]
    fn test_parse_profile() {
        let profile: Profile = serde_json::from_str(
            r#"{"displayName":"Kim","userId":"U1","pictureUrl":"https://example.com/p.png"}"#,
        )
        .unwrap();
        assert_eq!(profile.display_name, "Kim");
    }
}
