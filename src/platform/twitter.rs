//! REST v1.1 client acting as a single account.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::oauth::{Nonce, Signer};
use super::{Account, Platform, PlatformError, Post};
use crate::config::Credentials;
use crate::mention::{Author, Mention, Place};

pub struct TwitterClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Credentials,
    thread_replies: bool,
}

#[derive(Debug, Deserialize)]
struct IdsResponse {
    ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: u64,
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct PlaceResponse {
    #[serde(default)]
    country: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    id_str: String,
    #[serde(alias = "full_text")]
    text: String,
    user: UserResponse,
    #[serde(default)]
    place: Option<PlaceResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<TweetResponse> for Mention {
    fn from(tweet: TweetResponse) -> Self {
        Mention {
            id: tweet.id_str,
            author: Author {
                id: tweet.user.id,
                handle: tweet.user.screen_name,
            },
            text: tweet.text,
            place: tweet.place.map(|place| Place {
                country: place.country,
                name: place.name,
                full_name: place.full_name,
            }),
        }
    }
}

impl From<UserResponse> for Account {
    fn from(user: UserResponse) -> Self {
        Account {
            id: user.id,
            handle: user.screen_name,
        }
    }
}

impl TwitterClient {
    pub fn new(
        api_base: &str,
        credentials: Credentials,
        timeout: Duration,
        thread_replies: bool,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("blockbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(TwitterClient {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
            thread_replies,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PlatformError> {
        let url = self.endpoint(path);
        let authorization = Signer::new(&self.credentials).authorization_header(
            method.as_str(),
            &url,
            params,
            &Nonce::generate(),
        )?;

        log::debug!("{} {}", method, url);

        let request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, authorization);
        let request = if method == Method::GET {
            request.query(params)
        } else {
            request.form(params)
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| PlatformError::Decode(format!("{path}: {e}")))
    }
}

fn error_from_response(status: StatusCode, body: &str) -> PlatformError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next())
        .map(|detail| detail.message)
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::UNAUTHORIZED {
        PlatformError::Unauthorized(message)
    } else {
        PlatformError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl Platform for TwitterClient {
    async fn verify_credentials(&self) -> Result<Account, PlatformError> {
        let user: UserResponse = self
            .call(
                Method::GET,
                "account/verify_credentials.json",
                &[("skip_status", "true")],
            )
            .await?;
        Ok(user.into())
    }

    async fn friend_ids(&self, count: u32) -> Result<Vec<u64>, PlatformError> {
        let count = count.to_string();
        let response: IdsResponse = self
            .call(Method::GET, "friends/ids.json", &[("count", count.as_str())])
            .await?;
        Ok(response.ids)
    }

    async fn follower_ids(&self, count: u32) -> Result<Vec<u64>, PlatformError> {
        let count = count.to_string();
        let response: IdsResponse = self
            .call(Method::GET, "followers/ids.json", &[("count", count.as_str())])
            .await?;
        Ok(response.ids)
    }

    async fn mentions(&self, count: u32) -> Result<Vec<Mention>, PlatformError> {
        let count = count.to_string();
        let tweets: Vec<TweetResponse> = self
            .call(
                Method::GET,
                "statuses/mentions_timeline.json",
                &[("count", count.as_str()), ("tweet_mode", "extended")],
            )
            .await?;
        Ok(tweets.into_iter().map(Mention::from).collect())
    }

    async fn block(&self, user_id: u64) -> Result<Account, PlatformError> {
        let user_id = user_id.to_string();
        let user: UserResponse = self
            .call(
                Method::POST,
                "blocks/create.json",
                &[("user_id", user_id.as_str()), ("skip_status", "true")],
            )
            .await?;
        Ok(user.into())
    }

    async fn post(&self, text: &str, in_reply_to: Option<&str>) -> Result<Post, PlatformError> {
        let mut params = vec![("status", text)];
        match in_reply_to {
            Some(id) if self.thread_replies => params.push(("in_reply_to_status_id", id)),
            Some(id) => log::debug!("Reply threading disabled, not linking post to {id}"),
            None => {}
        }

        let tweet: TweetResponse = self
            .call(Method::POST, "statuses/update.json", &params)
            .await?;
        Ok(Post {
            id: tweet.id_str,
            text: tweet.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MENTIONS_JSON: &str = r#"[
        {
            "id": 1050118621198921728,
            "id_str": "1050118621198921728",
            "text": "@denny Go NASCAR!",
            "user": {"id": 2244994945, "id_str": "2244994945", "screen_name": "racefan"},
            "place": null
        },
        {
            "id": 1050118621198921729,
            "id_str": "1050118621198921729",
            "full_text": "@denny halo",
            "user": {"id": 42, "screen_name": "traveller"},
            "place": {"country": "Indonesia", "name": "Bandung", "full_name": "Bandung, Jawa Barat", "country_code": "ID"}
        }
    ]"#;

    #[test]
    fn test_mentions_decode() {
        let tweets: Vec<TweetResponse> = serde_json::from_str(MENTIONS_JSON).unwrap();
        let mentions: Vec<Mention> = tweets.into_iter().map(Mention::from).collect();

        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].id, "1050118621198921728");
        assert_eq!(mentions[0].author.id, 2244994945);
        assert_eq!(mentions[0].author.handle, "racefan");
        assert_eq!(mentions[0].text, "@denny Go NASCAR!");
        assert!(mentions[0].place.is_none());

        assert_eq!(mentions[1].text, "@denny halo");
        assert_eq!(mentions[1].location(), "Indonesia Bandung Bandung, Jawa Barat");
    }

    #[test]
    fn test_ids_decode() {
        let ids: IdsResponse =
            serde_json::from_str(r#"{"ids": [1, 2, 3], "next_cursor": 0, "previous_cursor": 0}"#).unwrap();
        assert_eq!(ids.ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_unauthorized_maps_to_auth_error() {
        let body = r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#;
        match error_from_response(StatusCode::UNAUTHORIZED, body) {
            PlatformError::Unauthorized(message) => assert_eq!(message, "Could not authenticate you."),
            other => panic!("Expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn test_other_status_keeps_raw_body() {
        match error_from_response(StatusCode::BAD_GATEWAY, "upstream down\n") {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected API error, got {other:?}"),
        }
    }

    fn client(server: &MockServer, thread_replies: bool) -> TwitterClient {
        TwitterClient::new(
            &server.uri(),
            Credentials::default(),
            Duration::from_secs(5),
            thread_replies,
        )
        .unwrap()
    }

    fn tweet(id: &str, text: &str) -> serde_json::Value {
        json!({
            "id_str": id,
            "text": text,
            "user": {"id": 2, "screen_name": "notices"}
        })
    }

    async fn form_bodies(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_friend_ids_sends_signed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/friends/ids.json"))
            .and(query_param("count", "200"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ids": [1, 2]})))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client(&server, false).friend_ids(200).await.unwrap();
        assert_eq!(ids, vec![1, 2]);

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0].headers.get("authorization").unwrap();
        assert!(authorization.to_str().unwrap().starts_with("OAuth "));
    }

    #[tokio::test]
    async fn test_mentions_request_extended_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/statuses/mentions_timeline.json"))
            .and(query_param("count", "20"))
            .and(query_param("tweet_mode", "extended"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MENTIONS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let mentions = client(&server, false).mentions(20).await.unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[1].text, "@denny halo");
    }

    #[tokio::test]
    async fn test_post_without_threading_leaves_reply_id_off() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statuses/update.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tweet("70", "flat")))
            .expect(1)
            .mount(&server)
            .await;

        let post = client(&server, false).post("flat", Some("55")).await.unwrap();
        assert_eq!(post.id, "70");

        let bodies = form_bodies(&server).await;
        assert!(bodies[0].contains("status=flat"));
        assert!(!bodies[0].contains("in_reply_to_status_id"));
    }

    #[tokio::test]
    async fn test_post_with_threading_sends_reply_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statuses/update.json"))
            .and(body_string_contains("in_reply_to_status_id=55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tweet("71", "threaded")))
            .expect(1)
            .mount(&server)
            .await;

        let post = client(&server, true).post("threaded", Some("55")).await.unwrap();
        assert_eq!(post.text, "threaded");
    }

    #[tokio::test]
    async fn test_block_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/blocks/create.json"))
            .and(body_string_contains("user_id=77"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errors": [{"code": 32, "message": "Could not authenticate you."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        match client(&server, false).block(77).await {
            Err(PlatformError::Unauthorized(message)) => {
                assert_eq!(message, "Could not authenticate you.")
            }
            other => panic!("Expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = TwitterClient::new(
            "https://api.example.com/1.1/",
            Credentials::default(),
            Duration::from_secs(5),
            false,
        )
        .unwrap();
        assert_eq!(
            client.endpoint("blocks/create.json"),
            "https://api.example.com/1.1/blocks/create.json"
        );
    }
}
