use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub engagement: EngagementConfig,
    #[serde(default)]
    pub posting: PostingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
}

impl AccountCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

// Passwords never reach the logs.
impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (password: [REDACTED])", self.username)
    }
}

/// What the engagement loop does when a scheduled account rotation fails to log in.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationFailurePolicy {
    /// Keep engaging with the previous (possibly expired) session.
    #[default]
    Continue,
    /// Stop the run.
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngagementConfig {
    #[serde(default = "default_engagement_accounts")]
    pub accounts: Vec<AccountCredentials>,
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: u32,
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
    #[serde(default = "default_like_probability")]
    pub like_probability: f64,
    #[serde(default = "default_comment_probability")]
    pub comment_probability: f64,
    #[serde(default = "default_action_pause_ms")]
    pub action_pause_ms: u64,
    #[serde(default = "default_post_delay_min_ms")]
    pub post_delay_min_ms: u64,
    #[serde(default = "default_post_delay_max_ms")]
    pub post_delay_max_ms: u64,
    #[serde(default = "default_engagement_interval_s")]
    pub cycle_interval_s: u64,
    /// Re-authenticate every N cycles.
    #[serde(default = "default_rotate_every")]
    pub rotate_every: u64,
    #[serde(default)]
    pub on_rotation_failure: RotationFailurePolicy,
    #[serde(default = "default_comments")]
    pub comments: Vec<String>,
}

fn default_engagement_accounts() -> Vec<AccountCredentials> {
    vec![AccountCredentials::new("coffee_addict11", "coffee_addict11")]
}
fn default_feed_page_size() -> u32 { 20 }
fn default_sample_limit() -> usize { 5 }
fn default_like_probability() -> f64 { 0.7 }
fn default_comment_probability() -> f64 { 0.5 }
fn default_action_pause_ms() -> u64 { 1_000 }
fn default_post_delay_min_ms() -> u64 { 2_000 }
fn default_post_delay_max_ms() -> u64 { 5_000 }
fn default_engagement_interval_s() -> u64 { 300 }
fn default_rotate_every() -> u64 { 3 }

fn default_comments() -> Vec<String> {
    [
        "Great post! 👍",
        "Love this! ❤️",
        "Amazing! ✨",
        "So cool! 😎",
        "Wow, just wow! 🤩",
        "This is awesome! 🔥",
        "Beautiful! 🌸",
        "Lovely post 💕",
        "Fantastic! 🌟",
        "Superb shot 📸",
        "Stunning 😍",
        "Perfect! ✅",
        "Epic! 💯",
        "Adorable 🥰",
        "Very nice 👌",
        "Legendary ⚡",
        "So inspiring 🌈",
        "Wonderful ✨",
        "Keep it up 🙌",
        "Fabulous 💃",
        "Insane vibes 🔥",
        "Classic! 🎶",
        "Dreamy 🌙",
        "Iconic ⭐",
        "Golden ✨",
        "Outstanding 👏",
        "Really cool 🌊",
        "Sweet 💖",
        "Gorgeous 🌹",
        "Incredible 🌍",
        "Fantastic work 👏",
        "Magical ✨",
        "Top tier 🔝",
        "Insanely good 🤯",
        "Refreshing 🌿",
        "Brilliant 💡",
        "Love the energy ⚡",
        "Sharp! 🗡️",
        "Phenomenal 🔥",
        "Impressive 🏆",
        "Charming ✨",
        "Super cute 🐾",
        "Top notch 👍",
        "Mind-blowing 🤯",
        "Top vibes 🎶",
        "Bright 🌞",
        "Icon 💫",
        "Dazzling 💎",
        "Masterpiece 🎨",
        "Sweet vibes 🍭",
        "So chill ❄️",
        "Rockstar 🤘",
        "Insane energy ⚡",
        "So cool & clean ✨",
        "Glorious 🌟",
        "Delightful 🍀",
        "Fantastic vibes 🎉",
        "Love the style 👗",
        "Awesome mood ✨",
        "Golden vibes 🌟",
        "Too good 🔥",
        "Unreal 🌌",
        "Respect ✊",
        "Bomb 💣",
        "Wow factor 💥",
        "Super stylish 👑",
        "So peaceful 🕊️",
        "Big mood 😎",
        "Insane drip 💧",
        "Such beauty 🌺",
        "Classy 💼",
        "Aesthetic ✨",
        "Simply perfect 💯",
        "Vibing 🎶",
        "Slaying 🔥",
        "Such a mood 😍",
        "Too fresh 🥶",
        "Lovely capture 📷",
        "Brave 💪",
        "Super clean 🧼",
        "Vibrant 🌈",
        "Cheerful 😊",
        "Golden hour 🌅",
        "Sooo cute 🐶",
        "Love this vibe 🌸",
        "Sharp look 👀",
        "Dope 🔥",
        "Fresh ✨",
        "Spectacular 🌠",
        "Breathtaking 🌊",
        "Very aesthetic 🎨",
        "Killing it 🔥",
        "Rocking it 🎸",
        "Magnetizing 🌀",
        "High energy ⚡",
        "Top look 👑",
        "Lit 🔥",
        "Crushing it 💯",
        "Super vibe 🎶",
        "Legend ❤️",
        "Queen 👑",
        "King 🤴",
        "Royal 👸",
        "Boss move 💼",
        "Major win 🏅",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            accounts: default_engagement_accounts(),
            feed_page_size: default_feed_page_size(),
            sample_limit: default_sample_limit(),
            like_probability: default_like_probability(),
            comment_probability: default_comment_probability(),
            action_pause_ms: default_action_pause_ms(),
            post_delay_min_ms: default_post_delay_min_ms(),
            post_delay_max_ms: default_post_delay_max_ms(),
            cycle_interval_s: default_engagement_interval_s(),
            rotate_every: default_rotate_every(),
            on_rotation_failure: RotationFailurePolicy::default(),
            comments: default_comments(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PostingConfig {
    #[serde(default = "default_posting_account")]
    pub account: AccountCredentials,
    #[serde(default = "default_post_interval_s")]
    pub interval_s: u64,
    /// Sleep after a failed image download, replacing the regular interval.
    #[serde(default = "default_download_backoff_s")]
    pub download_backoff_s: u64,
    #[serde(default = "default_image_provider_url")]
    pub image_provider_url: String,
    #[serde(default = "default_image_size")]
    pub image_width: u32,
    #[serde(default = "default_image_size")]
    pub image_height: u32,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_captions")]
    pub captions: Vec<String>,
}

fn default_posting_account() -> AccountCredentials {
    AccountCredentials::new("sleepy_dev", "password123")
}
fn default_post_interval_s() -> u64 { 300 }
fn default_download_backoff_s() -> u64 { 60 }
fn default_image_provider_url() -> String {
    "https://picsum.photos".to_string()
}
fn default_image_size() -> u32 { 800 }
fn default_temp_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_content_type() -> String {
    "image/jpeg".to_string()
}

fn default_captions() -> Vec<String> {
    [
        "✨ Life is beautiful! #life #beautiful",
        "🌟 Making memories every day #memories #life",
        "💫 Every moment is a new beginning #new #beginning",
        "🌺 Finding beauty in the little things #beauty #life",
        "🌈 Life is what happens while you're busy making plans #life #plans",
        "🎭 Living my best life! #bestlife #living",
        "🌻 Happiness is a choice #happiness #choice",
        "🎨 Creativity flows like a river #creativity #art",
        "🌍 Exploring the world one day at a time #explore #world",
        "💝 Love what you do, do what you love #love #passion",
        "🎯 Goals are dreams with deadlines #goals #dreams",
        "🚀 Taking life one step at a time #life #progress",
        "🎪 Life is a beautiful journey #journey #beautiful",
        "🌙 Dream big, work hard #dreams #hardwork",
        "⭐ Every day is a new adventure #adventure #newday",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            account: default_posting_account(),
            interval_s: default_post_interval_s(),
            download_backoff_s: default_download_backoff_s(),
            image_provider_url: default_image_provider_url(),
            image_width: default_image_size(),
            image_height: default_image_size(),
            temp_dir: default_temp_dir(),
            content_type: default_content_type(),
            captions: default_captions(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise use built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let e = &self.engagement;
        for (name, p) in [
            ("like_probability", e.like_probability),
            ("comment_probability", e.comment_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("engagement.{} must be within [0, 1], got {}", name, p);
            }
        }
        if e.accounts.is_empty() {
            anyhow::bail!("engagement.accounts must list at least one account");
        }
        if e.comments.is_empty() {
            anyhow::bail!("engagement.comments cannot be empty");
        }
        if e.rotate_every == 0 {
            anyhow::bail!("engagement.rotate_every must be > 0");
        }
        if e.post_delay_min_ms > e.post_delay_max_ms {
            anyhow::bail!(
                "engagement.post_delay_min_ms ({}) exceeds post_delay_max_ms ({})",
                e.post_delay_min_ms,
                e.post_delay_max_ms
            );
        }
        if self.posting.captions.is_empty() {
            anyhow::bail!("posting.captions cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert_eq!(config.engagement.accounts[0].username, "coffee_addict11");
        assert_eq!(config.engagement.comments.len(), 7);
        assert_eq!(config.posting.image_width, 800);
        // captions not listed in the file fall back to the built-in list
        assert!(!config.posting.captions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_bot_scripts() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.engagement.feed_page_size, 20);
        assert_eq!(config.engagement.sample_limit, 5);
        assert!((config.engagement.like_probability - 0.7).abs() < f64::EPSILON);
        assert!((config.engagement.comment_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.engagement.rotate_every, 3);
        assert_eq!(config.engagement.on_rotation_failure, RotationFailurePolicy::Continue);
        assert_eq!(config.posting.download_backoff_s, 60);
        assert_eq!(config.posting.account.username, "sleepy_dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_phrase_list_is_complete() {
        let comments = default_comments();
        assert_eq!(comments.len(), 105);
        assert_eq!(comments.first().map(String::as_str), Some("Great post! 👍"));
        assert_eq!(comments.last().map(String::as_str), Some("Major win 🏅"));
        let unique: std::collections::HashSet<_> = comments.iter().collect();
        assert_eq!(unique.len(), comments.len());
    }

    #[test]
    fn test_base_url_comes_only_from_file() {
        std::env::set_var("FEEDBOT_BASE_URL", "http://elsewhere:1");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(&path, "[api]\nbase_url = \"http://api.test:9000\"\n").unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.api.base_url, "http://api.test:9000");
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        std::env::remove_var("FEEDBOT_BASE_URL");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "http://api.test:9000"

            [engagement]
            accounts = [{ username = "a", password = "pa" }, { username = "b", password = "pb" }]
            on_rotation_failure = "abort"
            comments = ["nice"]
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://api.test:9000");
        assert_eq!(config.api.request_timeout_ms, 30_000);
        assert_eq!(config.engagement.accounts.len(), 2);
        assert_eq!(config.engagement.on_rotation_failure, RotationFailurePolicy::Abort);
        assert_eq!(config.engagement.comments, vec!["nice".to_string()]);
        assert_eq!(config.engagement.sample_limit, 5);
        assert_eq!(config.posting.captions.len(), 15);
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut config = Config::default();
        config.engagement.like_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pool_and_zero_rotation() {
        let mut config = Config::default();
        config.engagement.accounts.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.engagement.rotate_every = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delay_range() {
        let mut config = Config::default();
        config.engagement.post_delay_min_ms = 10;
        config.engagement.post_delay_max_ms = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_are_redacted() {
        let creds = AccountCredentials::new("alice", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
        assert!(!creds.to_string().contains("hunter2"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.engagement.accounts[0].username, "coffee_addict11");
    }
}
