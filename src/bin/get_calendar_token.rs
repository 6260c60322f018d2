use calendar_skill::components::redis_service::RedisActor;
use calendar_skill::components::TokenManager;
use calendar_skill::config::Config;
use calendar_skill::error::{auth_error, other_error, BotResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

const REDIRECT_URI: &str = "http://localhost:8080";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Signs a user in to Google Calendar and stores their token for the skill.
///
/// Usage: get_calendar_token <discord user id>
#[tokio::main]
async fn main() -> BotResult<()> {
    let user_id = std::env::args()
        .nth(1)
        .ok_or_else(|| other_error("Usage: get_calendar_token <discord user id>"))?;

    let config = Arc::new(RwLock::new(Config::load()?));

    let (mut redis_actor, redis_handle) = RedisActor::new(config.clone());
    let _redis_task = tokio::spawn(async move {
        redis_actor.run().await;
    });

    let token_manager = TokenManager::new(config.clone(), redis_handle.clone());

    let (client_id, client_secret) = {
        let config_read = config.read().await;
        (
            config_read.google_client_id.clone(),
            config_read.google_client_secret.clone(),
        )
    };

    // Random state ties the callback to this run
    let state = uuid::Uuid::new_v4().to_string();

    let auth_url = Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", SCOPE),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| other_error(&format!("Invalid authorization URL: {}", e)))?;

    println!("Opening browser for Google Calendar authorization...");
    webbrowser::open(auth_url.as_str())?;

    let server = tiny_http::Server::http("0.0.0.0:8080")?;
    println!("Waiting for authorization callback...");

    let request = server.recv()?;
    let callback = Url::parse(&format!("{}{}", REDIRECT_URI, request.url()))
        .map_err(|e| other_error(&format!("Invalid callback URL: {}", e)))?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    if param("state").as_deref() != Some(state.as_str()) {
        return Err(auth_error("Authorization callback state does not match"));
    }
    let code = param("code").ok_or_else(|| other_error("No authorization code found in callback"))?;

    let response = reqwest::Client::new()
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", REDIRECT_URI.to_string()),
            ("grant_type", "authorization_code".to_string()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    // expires_at is stamped by the token manager
    let token_data: serde_json::Value = response.json().await?;
    token_manager.set_token(&user_id, token_data).await?;

    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    redis_handle.shutdown().await?;
    println!("Token for user {} saved to Redis!", user_id);

    Ok(())
}
