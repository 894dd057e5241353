//! Environment-driven application configuration.

use std::path::PathBuf;
use std::time::Duration;

use sluice_plan::{AudioBitrate, AudioFormat, PlanDefaults};
use sluice_tunnel::{RunnerConfig, TempFileConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    /// Public base URL tunnel links are minted against, no trailing slash.
    pub external_url: String,
    pub enable_cors: bool,

    pub ffmpeg_binary: String,
    /// Hard lifetime of one streaming operation.
    pub stream_deadline: Duration,
    pub kill_grace: Duration,
    /// Unredeemed tunnel handles expire after this.
    pub tunnel_ttl: Duration,

    pub temp_dir: PathBuf,
    pub temp_sweep_interval: Duration,
    pub temp_max_age: Duration,

    pub default_audio_format: AudioFormat,
    pub default_audio_bitrate: AudioBitrate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 9000,
            external_url: "http://localhost:9000".to_string(),
            enable_cors: true,
            ffmpeg_binary: "ffmpeg".to_string(),
            stream_deadline: Duration::from_secs(90),
            kill_grace: Duration::from_secs(5),
            tunnel_ttl: Duration::from_secs(90),
            temp_dir: std::env::temp_dir(),
            temp_sweep_interval: Duration::from_secs(60),
            temp_max_age: Duration::from_secs(5 * 60),
            default_audio_format: AudioFormat::M4a,
            default_audio_bitrate: AudioBitrate::Kbps128,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_string(name)?.parse::<u64>().ok().map(Duration::from_secs)
}

fn audio_format_from_str(value: &str) -> Option<AudioFormat> {
    match value {
        "mp3" => Some(AudioFormat::Mp3),
        "ogg" => Some(AudioFormat::Ogg),
        "opus" => Some(AudioFormat::Opus),
        "wav" => Some(AudioFormat::Wav),
        "m4a" => Some(AudioFormat::M4a),
        _ => None,
    }
}

fn audio_bitrate_from_str(value: &str) -> Option<AudioBitrate> {
    match value {
        "8" => Some(AudioBitrate::Kbps8),
        "64" => Some(AudioBitrate::Kbps64),
        "96" => Some(AudioBitrate::Kbps96),
        "128" => Some(AudioBitrate::Kbps128),
        "192" => Some(AudioBitrate::Kbps192),
        "256" => Some(AudioBitrate::Kbps256),
        "320" => Some(AudioBitrate::Kbps320),
        _ => None,
    }
}

impl AppConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// Supported: `API_BIND_ADDRESS`, `API_PORT`, `API_EXTERNAL_URL`,
    /// `API_ENABLE_CORS`, `FFMPEG_PATH`, `STREAM_LIFESPAN_SECS`,
    /// `STREAM_KILL_GRACE_SECS`, `TUNNEL_TTL_SECS`, `TEMP_DIR`,
    /// `TEMP_SWEEP_SECS`, `TEMP_MAX_AGE_SECS`, `DEFAULT_AUDIO_FORMAT`,
    /// `DEFAULT_AUDIO_BITRATE`.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Some(bind_address) = env_string("API_BIND_ADDRESS") {
            config.bind_address = bind_address;
        }
        if let Some(port) = env_string("API_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            config.port = parsed;
        }
        if let Some(external_url) = env_string("API_EXTERNAL_URL") {
            config.external_url = external_url.trim_end_matches('/').to_string();
        }
        if let Some(cors) = env_string("API_ENABLE_CORS") {
            config.enable_cors = cors != "0" && cors != "false";
        }
        if let Some(binary) = env_string("FFMPEG_PATH") {
            config.ffmpeg_binary = binary;
        }
        if let Some(deadline) = env_secs("STREAM_LIFESPAN_SECS") {
            config.stream_deadline = deadline;
        }
        if let Some(grace) = env_secs("STREAM_KILL_GRACE_SECS") {
            config.kill_grace = grace;
        }
        if let Some(ttl) = env_secs("TUNNEL_TTL_SECS") {
            config.tunnel_ttl = ttl;
        }
        if let Some(dir) = env_string("TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(interval) = env_secs("TEMP_SWEEP_SECS") {
            config.temp_sweep_interval = interval;
        }
        if let Some(max_age) = env_secs("TEMP_MAX_AGE_SECS") {
            config.temp_max_age = max_age;
        }
        if let Some(format) = env_string("DEFAULT_AUDIO_FORMAT") {
            match audio_format_from_str(&format) {
                Some(parsed) => config.default_audio_format = parsed,
                None => tracing::warn!(format, "unknown DEFAULT_AUDIO_FORMAT, keeping m4a"),
            }
        }
        if let Some(bitrate) = env_string("DEFAULT_AUDIO_BITRATE") {
            match audio_bitrate_from_str(&bitrate) {
                Some(parsed) => config.default_audio_bitrate = parsed,
                None => tracing::warn!(bitrate, "unknown DEFAULT_AUDIO_BITRATE, keeping 128"),
            }
        }

        config
    }

    pub fn plan_defaults(&self) -> PlanDefaults {
        PlanDefaults {
            audio_format: self.default_audio_format,
            audio_bitrate: self.default_audio_bitrate,
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            ffmpeg_binary: self.ffmpeg_binary.clone(),
            deadline: self.stream_deadline,
            kill_grace: self.kill_grace,
        }
    }

    pub fn temp_config(&self) -> TempFileConfig {
        TempFileConfig {
            dir: self.temp_dir.clone(),
            sweep_interval: self.temp_sweep_interval,
            max_age: self.temp_max_age,
        }
    }

    /// Absolute URL for a minted tunnel id.
    pub fn tunnel_url(&self, id: uuid::Uuid) -> String {
        format!("{}/tunnel?id={id}", self.external_url)
    }
}
