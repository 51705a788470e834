use std::path::PathBuf;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, ValueEnum};

/// Which flavor of the pipeline a deployment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// YouTube channel feed, latest video only, summarized from its captions
    Video,
    /// RSS podcast feed, episodes published on the target date, summarized from audio
    Podcast,
}

impl Variant {
    pub fn default_prompt_path(&self) -> &'static str {
        match self {
            Variant::Video => "prompts/transcript.txt",
            Variant::Podcast => "prompts/audio.txt",
        }
    }

    pub fn link_label(&self) -> &'static str {
        match self {
            Variant::Video => "Watch Video",
            Variant::Podcast => "Listen to Episode",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SmtpSettings {
    /// SMTP relay host
    #[arg(
        long = "smtp-host",
        env = "SMTP_HOST",
        default_value = "email-smtp.us-east-1.amazonaws.com"
    )]
    pub host: String,

    /// SMTP port; 465 uses implicit TLS, anything else STARTTLS
    #[arg(long = "smtp-port", env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    #[arg(long = "smtp-username", env = "SMTP_USERNAME")]
    pub username: Option<String>,

    #[arg(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Process-wide settings, resolved once at startup and never mutated afterwards
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Pipeline flavor
    #[arg(long, env = "FEED_VARIANT", value_enum, default_value = "video")]
    pub variant: Variant,

    /// Feed URL; takes precedence over CHANNEL_ID
    #[arg(long, env = "FEED_URL")]
    pub feed_url: Option<String>,

    /// YouTube channel id used to build the feed URL for the video variant
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-flash-latest")]
    pub gemini_model: String,

    /// Prompt template file; defaults depend on the variant
    #[arg(long, env = "PROMPT_PATH")]
    pub prompt_path: Option<PathBuf>,

    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// Comma separated list of recipients
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub recipient_email: Option<String>,

    #[arg(long, env = "SUBJECT_PREFIX", default_value = "Sermon Summary")]
    pub subject_prefix: String,

    /// Table holding processed markers
    #[arg(long, env = "DYNAMO_TABLE", default_value = "processed_items")]
    pub table: String,

    /// Database connection URL, required unless running in local test mode
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(flatten)]
    pub smtp: SmtpSettings,

    /// Process items published on this date (YYYY-MM-DD) instead of today
    #[arg(long, env = "TARGET_DATE", value_parser = parse_target_date)]
    pub target_date: Option<NaiveDate>,

    /// Timezone whose calendar decides what "today" is
    #[arg(long, env = "TIMEZONE", default_value = "America/New_York", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// Preferred caption language for the video variant
    #[arg(long, env = "CAPTION_LANGUAGE", default_value = "en")]
    pub caption_language: String,

    /// Maximum items attempted per run; failed attempts count, already processed ones do not
    #[arg(long = "max-items", env = "MAX_ITEMS_PER_RUN", default_value = "2")]
    pub max_items: usize,

    /// Maximum feed entries parsed per fetch
    #[arg(long, env = "FEED_ENTRY_LIMIT", default_value = "20")]
    pub feed_limit: usize,

    /// Scratch directory for downloaded audio
    #[arg(long, env = "WORKDIR", default_value = "/tmp/feed-digest")]
    pub workdir: PathBuf,

    /// Replace the datastore and mailer with log-only stand-ins
    #[arg(
        long,
        env = "LOCAL_TEST_MODE",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub local_test_mode: bool,
}

impl AppConfig {
    const YOUTUBE_FEED_URL: &'static str = "https://www.youtube.com/feeds/videos.xml";

    /// The explicit feed URL, else the channel feed derived from `channel_id` (video only)
    pub fn resolved_feed_url(&self) -> Option<String> {
        let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        non_empty(&self.feed_url).or_else(|| match self.variant {
            Variant::Video => non_empty(&self.channel_id)
                .map(|id| format!("{}?channel_id={id}", Self::YOUTUBE_FEED_URL)),
            Variant::Podcast => None,
        })
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.prompt_path
            .clone()
            .unwrap_or_else(|| self.variant.default_prompt_path().into())
    }
}

fn parse_target_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {raw:?}: {e}"))
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone: {raw:?}"))
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(format!("expected a boolean, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AppConfig,
    }

    fn parse(args: &[&str]) -> AppConfig {
        TestCli::try_parse_from(std::iter::once("feed-digest").chain(args.iter().copied()))
            .expect("Arguments should parse")
            .config
    }

    #[test]
    fn test_channel_id_builds_youtube_feed_url() {
        let config = parse(&["--channel-id", "UC9f7mMnQ3Yq1bEXAMPLE01"]);
        assert_eq!(
            config.resolved_feed_url().as_deref(),
            Some("https://www.youtube.com/feeds/videos.xml?channel_id=UC9f7mMnQ3Yq1bEXAMPLE01")
        );
        assert_eq!(config.prompt_path(), PathBuf::from("prompts/transcript.txt"));
    }

    #[test]
    fn test_explicit_feed_url_wins_and_podcast_ignores_channel() {
        let config = parse(&[
            "--variant",
            "podcast",
            "--feed-url",
            "https://podcast.example.com/feed.xml",
            "--channel-id",
            "UCignored",
        ]);
        assert_eq!(
            config.resolved_feed_url().as_deref(),
            Some("https://podcast.example.com/feed.xml")
        );

        let config = parse(&["--variant", "podcast", "--channel-id", "UCignored"]);
        assert_eq!(config.resolved_feed_url(), None);
        assert_eq!(config.prompt_path(), PathBuf::from("prompts/audio.txt"));
    }

    #[test]
    fn test_target_date_timezone_and_flag_parsing() {
        let config = parse(&[
            "--target-date",
            "2024-03-10",
            "--timezone",
            "Africa/Nairobi",
            "--local-test-mode",
        ]);
        assert_eq!(config.target_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(config.timezone, chrono_tz::Africa::Nairobi);
        assert!(config.local_test_mode);
    }

    #[test]
    fn test_rejects_malformed_values() {
        let bad_date = TestCli::try_parse_from(["feed-digest", "--target-date", "10/03/2024"]);
        assert!(bad_date.is_err());

        let bad_tz = TestCli::try_parse_from(["feed-digest", "--timezone", "Mars/Olympus"]);
        assert!(bad_tz.is_err());
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(parse_flag("True"), Ok(true));
        assert_eq!(parse_flag("false"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }
}
