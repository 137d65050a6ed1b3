use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use uuid::Uuid;

use teamchat_types::api::{AiRespondRequest, AiRespondResponse, NewChannel, SendMessageRequest};
use teamchat_types::events::{GatewayCommand, GatewayEvent};
use teamchat_types::models::{Channel, Message};

use crate::{ChatBackend, ClientError, Subscription};

const EVENT_BUFFER: usize = 256;

/// Talks to a chat server over its REST routes and WebSocket gateway.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn gateway_url(&self) -> Result<String, ClientError> {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(ClientError::Url(self.base_url.clone()));
        };
        Ok(format!("{}/gateway", ws_base))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { status: status.as_u16(), body });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_channels(&self) -> Result<Vec<Channel>, ClientError> {
        read_json(self.http.get(self.url("/channels")).send().await?).await
    }

    async fn create_channels(&self, channels: &[NewChannel]) -> Result<Vec<Channel>, ClientError> {
        read_json(self.http.post(self.url("/channels")).json(channels).send().await?).await
    }

    async fn recent_messages(&self, channel_id: Uuid, limit: u32) -> Result<Vec<Message>, ClientError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        read_json(self.http.get(url).query(&[("limit", limit)]).send().await?).await
    }

    async fn insert_message(&self, channel_id: Uuid, user_name: &str, content: &str) -> Result<Message, ClientError> {
        let url = self.url(&format!("/channels/{}/messages", channel_id));
        let body = SendMessageRequest {
            user_name: user_name.to_string(),
            content: content.to_string(),
        };
        read_json(self.http.post(url).json(&body).send().await?).await
    }

    async fn ai_respond(&self, request: &AiRespondRequest) -> Result<String, ClientError> {
        let response = self.http.post(self.url("/api/ai-respond")).json(request).send().await?;
        let body: AiRespondResponse = read_json(response).await?;
        Ok(body.response)
    }

    async fn subscribe(&self, channel_id: Uuid) -> Result<Subscription, ClientError> {
        let (mut ws, _) = tokio_tungstenite::connect_async(self.gateway_url()?).await?;

        let subscribe = serde_json::to_string(&GatewayCommand::Subscribe { channel_id })?;
        ws.send(WsMessage::Text(subscribe.into())).await?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(async move {
            while let Some(frame) = ws.next().await {
                let text = match frame {
                    Ok(WsMessage::Text(text)) => text,
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Gateway connection error: {}", e);
                        break;
                    }
                };

                match serde_json::from_str::<GatewayEvent>(&text) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Unreadable gateway event: {}", e),
                }
            }
            debug!("Gateway feed for channel {} ended", channel_id);
        });

        Ok(Subscription::new(rx, Some(task)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn gateway_url_follows_scheme() {
        assert_eq!(HttpBackend::new("http://localhost:3000/").gateway_url().unwrap(), "ws://localhost:3000/gateway");
        assert!(HttpBackend::new("localhost:3000").gateway_url().is_err());
    }

    #[tokio::test]
    async fn https_server_gets_a_tls_gateway() {
        use tokio_tungstenite::tungstenite::error::{Error, UrlError};

        let backend = HttpBackend::new("https://chat.example");
        assert_eq!(backend.gateway_url().unwrap(), "wss://chat.example/gateway");

        // A peer that hangs up mid-handshake: the failure must come from TLS
        // or the socket, never from TLS support being compiled out.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let Err(err) = HttpBackend::new(format!("https://127.0.0.1:{}", port)).subscribe(Uuid::nil()).await else {
            panic!("handshake with a closed peer should fail");
        };
        assert!(matches!(err, ClientError::WebSocket(_)));
        assert!(!matches!(err, ClientError::WebSocket(Error::Url(UrlError::TlsFeatureNotEnabled))));
    }

    #[tokio::test]
    async fn recent_messages_passes_limit() {
        let server = MockServer::start().await;
        let channel_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/channels/{}/messages", channel_id)))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let messages = HttpBackend::new(server.uri()).recent_messages(channel_id, 100).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn ai_respond_posts_camel_case() {
        let server = MockServer::start().await;
        let channel_id = Uuid::nil();
        Mock::given(method("POST"))
            .and(path("/api/ai-respond"))
            .and(body_json(json!({
                "message": "@Claude hi",
                "channelId": channel_id,
                "channelName": "general",
                "userName": "You",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hello!" })))
            .mount(&server)
            .await;

        let reply = HttpBackend::new(server.uri())
            .ai_respond(&AiRespondRequest {
                message: "@Claude hi".into(),
                channel_id,
                channel_name: "general".into(),
                user_name: "You".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "hello!");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = HttpBackend::new(server.uri())
            .create_channels(&teamchat_types::api::default_channels())
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
