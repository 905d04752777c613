use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::{
    cmp::Ordering,
    fmt, fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
    sync::Arc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::sequence::{
    DrivingSignal, RenderTarget, SequenceConfig, SequenceResponse, FIXED_INTERVAL_MS_BOUNDS,
    FRAME_COUNT_BOUNDS, SPEED_BOUNDS,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
                LogLevel::Warn => 2,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

#[derive(Clone, Debug)]
struct SequenceRuntimeConfig {
    port: u16,
    static_dir: PathBuf,
    sequence: SequenceConfig,
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigFileErrorKind {
    Unreadable,
    InvalidJson,
}

impl ConfigFileErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Unreadable => "unreadable",
            Self::InvalidJson => "invalid_json",
        }
    }
}

/// `FRAME_CONFIG_PATH` was set but could not be used; the server falls back
/// to the defaults plus the individual `FRAME_*` variables.
#[derive(Debug)]
struct ConfigFileError {
    path: PathBuf,
    kind: ConfigFileErrorKind,
    message: String,
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.path.display(),
            self.kind.as_str(),
            self.message
        )
    }
}

impl std::error::Error for ConfigFileError {}

impl SequenceRuntimeConfig {
    fn from_env() -> (Self, Option<ConfigFileError>) {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `FRAME_CONFIG_PATH` (a JSON `SequenceConfig`) is the base layer; the
    /// individual `FRAME_*` variables override it field by field. An unusable
    /// config file is returned next to the fallback config.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Option<ConfigFileError>) {
        let port = parse_u16(lookup("PORT"), DEFAULT_PORT);
        let static_dir = parse_non_empty_string(lookup("STATIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let (base, file_error) = match parse_non_empty_string(lookup("FRAME_CONFIG_PATH")) {
            Some(path) => match read_sequence_config_file(Path::new(&path)) {
                Ok(sequence) => (sequence, None),
                Err(error) => (SequenceConfig::default(), Some(error)),
            },
            None => (SequenceConfig::default(), None),
        };
        let mut sequence = base.normalized();

        sequence.frame_count = parse_u32_with_bounds(
            lookup("FRAME_COUNT"),
            sequence.frame_count,
            FRAME_COUNT_BOUNDS,
        );
        sequence.speed = parse_u32_with_bounds(
            lookup("FRAME_SPEED"),
            u32::from(sequence.speed),
            (u32::from(SPEED_BOUNDS.0), u32::from(SPEED_BOUNDS.1)),
        ) as u8;
        sequence.fixed_interval_ms = parse_optional_u32_with_bounds(
            lookup("FRAME_FIXED_INTERVAL_MS"),
            FIXED_INTERVAL_MS_BOUNDS,
        )
        .or(sequence.fixed_interval_ms);
        sequence.placeholder_on_error =
            parse_bool(lookup("FRAME_PLACEHOLDER_ON_ERROR"), sequence.placeholder_on_error);

        if let Some(signal) = parse_non_empty_string(lookup("FRAME_DRIVING_SIGNAL"))
            .and_then(|value| DrivingSignal::from_str(&value.to_ascii_lowercase()))
        {
            sequence.driving_signal = signal;
        }
        if let Some(target) = parse_non_empty_string(lookup("FRAME_RENDER_TARGET"))
            .and_then(|value| RenderTarget::from_str(&value.to_ascii_lowercase()))
        {
            sequence.render_target = target;
        }
        if let Some(folder) = parse_non_empty_string(lookup("FRAME_FOLDER")) {
            sequence.naming.folder = folder;
        }
        if let Some(base_name) = parse_non_empty_string(lookup("FRAME_BASE_NAME")) {
            sequence.naming.base_name = base_name;
        }
        if let Some(extension) = parse_non_empty_string(lookup("FRAME_EXTENSION")) {
            sequence.naming.extension = extension;
        }

        let config = Self {
            port,
            static_dir,
            sequence,
            log_level: parse_log_level(lookup("LOG_LEVEL"), DEFAULT_LOG_LEVEL),
        };
        (config, file_error)
    }
}

#[derive(Clone)]
pub struct AppState {
    missing_frames: Arc<Vec<u32>>,
    config: SequenceRuntimeConfig,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, file_error) = SequenceRuntimeConfig::from_env();
    if let Some(error) = &file_error {
        log_event(
            &config,
            LogLevel::Warn,
            "frame_config_invalid",
            config_file_error_fields(error),
        );
    }
    let missing_frames = run_frame_audit(&config);
    let port = config.port;
    let bind_address = format!("0.0.0.0:{port}");

    let index_file = config.static_dir.join("index.html");
    let static_service =
        ServeDir::new(&config.static_dir).not_found_service(ServeFile::new(index_file));

    let state = AppState {
        missing_frames: Arc::new(missing_frames),
        config,
    };

    let app = Router::new()
        .route("/api/sequence", get(get_sequence))
        .fallback_service(static_service)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log_event(
        &state.config,
        LogLevel::Info,
        "server_listening",
        serde_json::json!({
            "address": format!("http://127.0.0.1:{port}"),
            "static_dir": state.config.static_dir.display().to_string(),
            "driving_signal": state.config.sequence.driving_signal.as_str(),
            "render_target": state.config.sequence.render_target.as_str(),
        }),
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_sequence(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(&headers);

    log_event(
        &state.config,
        LogLevel::Debug,
        "sequence_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "method": method.as_str(),
            "path": uri.path(),
        }),
    );

    let missing_frames = state.missing_frames.as_ref().clone();
    let payload = SequenceResponse {
        ok: true,
        config: state.config.sequence.clone(),
        missing_frames,
        error: None,
    };

    log_event(
        &state.config,
        LogLevel::Info,
        "sequence_request_complete",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "status": StatusCode::OK.as_u16(),
            "duration_ms": request_started_at.elapsed().as_millis(),
            "frame_count": payload.config.frame_count,
            "missing_frames": payload.missing_frames.len(),
        }),
    );

    json_response(
        StatusCode::OK,
        payload,
        cache_control("no-cache"),
        &request_id,
    )
}

/// Indices whose asset file is absent under `static_dir`. Missing frames are
/// not fatal; the page skips or substitutes them.
fn audit_frames(static_dir: &Path, sequence: &SequenceConfig) -> Vec<u32> {
    sequence
        .frame_paths()
        .filter(|(_, path)| !static_dir.join(path).is_file())
        .map(|(index, _)| index)
        .collect()
}

fn run_frame_audit(config: &SequenceRuntimeConfig) -> Vec<u32> {
    let started_at = Instant::now();
    let missing = audit_frames(&config.static_dir, &config.sequence);

    for index in &missing {
        log_event(
            config,
            LogLevel::Debug,
            "frame_asset_missing",
            serde_json::json!({
                "frame": index,
                "path": config.sequence.frame_path(*index),
            }),
        );
    }

    let level = if missing.is_empty() {
        LogLevel::Info
    } else {
        LogLevel::Warn
    };
    log_event(
        config,
        level,
        "frame_audit_complete",
        serde_json::json!({
            "frame_count": config.sequence.frame_count,
            "missing": missing.len(),
            "duration_ms": started_at.elapsed().as_millis(),
        }),
    );

    missing
}

fn json_response(
    status: StatusCode,
    payload: impl Serialize,
    cache_control: HeaderValue,
    request_id: &str,
) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, cache_control);
    headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    response_with_request_id(status, headers, Json(payload), request_id)
}

fn cache_control(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

fn parse_non_empty_string(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u16(raw: Option<String>, default: u16) -> u16 {
    parse_non_empty_string(raw)
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn parse_u32_with_bounds(raw: Option<String>, default: u32, bounds: (u32, u32)) -> u32 {
    parse_optional_u32_with_bounds(raw, bounds).unwrap_or(default)
}

fn parse_optional_u32_with_bounds(raw: Option<String>, bounds: (u32, u32)) -> Option<u32> {
    parse_non_empty_string(raw)
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match parse_non_empty_string(raw)
        .map(|value| value.to_ascii_lowercase())
        .as_deref()
    {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_log_level(raw: Option<String>, default: LogLevel) -> LogLevel {
    match parse_non_empty_string(raw)
        .unwrap_or_else(|| default.as_str().to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        "warn" => LogLevel::Warn,
        _ => default,
    }
}

fn read_sequence_config_file(path: &Path) -> Result<SequenceConfig, ConfigFileError> {
    let error = |kind, message: String| ConfigFileError {
        path: path.to_path_buf(),
        kind,
        message,
    };

    let raw = fs::read_to_string(path)
        .map_err(|source| error(ConfigFileErrorKind::Unreadable, source.to_string()))?;
    serde_json::from_str(&raw)
        .map_err(|source| error(ConfigFileErrorKind::InvalidJson, source.to_string()))
}

fn config_file_error_fields(error: &ConfigFileError) -> serde_json::Value {
    serde_json::json!({
        "path": error.path.display().to_string(),
        "error_class": error.kind.as_str(),
        "message": error.message.as_str(),
    })
}

fn now_unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis())
        .unwrap_or(0)
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

fn generate_request_id() -> String {
    let counter = REQUEST_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    format!("req-{}-{counter}", now_unix_millis())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    let value = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|raw| raw.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);

    value.unwrap_or_else(generate_request_id)
}

fn response_with_request_id(
    status: StatusCode,
    mut headers: HeaderMap,
    payload: impl IntoResponse,
    request_id: &str,
) -> axum::response::Response {
    if let Ok(request_id_header) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, request_id_header);
    }
    (status, headers, payload).into_response()
}

fn log_event(
    config: &SequenceRuntimeConfig,
    level: LogLevel,
    event: &str,
    fields: serde_json::Value,
) {
    if level < config.log_level {
        return;
    }

    let mut payload = serde_json::Map::new();
    payload.insert(
        "ts".to_string(),
        serde_json::Value::Number(serde_json::Number::from(now_unix_seconds())),
    );
    payload.insert(
        "level".to_string(),
        serde_json::Value::String(level.as_str().to_string()),
    );
    payload.insert(
        "event".to_string(),
        serde_json::Value::String(event.to_string()),
    );

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            if !value.is_null() {
                payload.insert(key, value);
            }
        }
    }

    println!("{}", serde_json::Value::Object(payload));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_static_dir(label: &str) -> PathBuf {
        let counter = TEMP_DIR_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "frame-portfolio-{label}-{}-{counter}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn write_frames(static_dir: &Path, sequence: &SequenceConfig, skip: &[u32]) {
        for (index, path) in sequence.frame_paths() {
            if skip.contains(&index) {
                continue;
            }
            let file = static_dir.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent).expect("frame folder should be creatable");
            }
            fs::write(&file, b"frame").expect("frame should be writable");
        }
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    fn test_runtime_config(static_dir: PathBuf) -> SequenceRuntimeConfig {
        SequenceRuntimeConfig {
            port: DEFAULT_PORT,
            static_dir,
            sequence: SequenceConfig {
                frame_count: 5,
                ..SequenceConfig::default()
            },
            log_level: LogLevel::Warn,
        }
    }

    fn test_state(static_dir: PathBuf, missing_frames: Vec<u32>) -> AppState {
        AppState {
            missing_frames: Arc::new(missing_frames),
            config: test_runtime_config(static_dir),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn runtime_config_defaults_without_env() {
        let (config, file_error) = SequenceRuntimeConfig::from_lookup(lookup_from(&[]));

        assert!(file_error.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
        assert_eq!(config.sequence, SequenceConfig::default());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn runtime_config_reads_overrides() {
        let (config, _) = SequenceRuntimeConfig::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("FRAME_COUNT", "120"),
            ("FRAME_SPEED", "8"),
            ("FRAME_FIXED_INTERVAL_MS", "33"),
            ("FRAME_DRIVING_SIGNAL", "Timer"),
            ("FRAME_RENDER_TARGET", "background"),
            ("FRAME_PLACEHOLDER_ON_ERROR", "yes"),
            ("FRAME_FOLDER", "frames"),
            ("FRAME_BASE_NAME", "hero_"),
            ("FRAME_EXTENSION", ".webp"),
            ("LOG_LEVEL", "DEBUG"),
        ]));

        assert_eq!(config.port, 9000);
        assert_eq!(config.sequence.frame_count, 120);
        assert_eq!(config.sequence.speed, 8);
        assert_eq!(config.sequence.fixed_interval_ms, Some(33));
        assert_eq!(config.sequence.driving_signal, DrivingSignal::Timer);
        assert_eq!(config.sequence.render_target, RenderTarget::Background);
        assert!(config.sequence.placeholder_on_error);
        assert_eq!(config.sequence.frame_path(3), "frames/hero_003.webp");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn runtime_config_rejects_out_of_bounds_values() {
        let (config, _) = SequenceRuntimeConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("FRAME_COUNT", "0"),
            ("FRAME_SPEED", "11"),
            ("FRAME_FIXED_INTERVAL_MS", "2"),
            ("FRAME_DRIVING_SIGNAL", "visibility"),
            ("FRAME_PLACEHOLDER_ON_ERROR", "maybe"),
            ("FRAME_FOLDER", "   "),
            ("LOG_LEVEL", "trace"),
        ]));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.sequence, SequenceConfig::default());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn runtime_config_layers_env_over_config_file() {
        let dir = temp_static_dir("config-file");
        let path = dir.join("sequence.json");
        fs::write(
            &path,
            r#"{"drivingSignal":"timer","frameCount":30,"naming":{"folder":"shots"}}"#,
        )
        .expect("config file should be writable");

        let (config, file_error) = SequenceRuntimeConfig::from_lookup(lookup_from(&[
            ("FRAME_CONFIG_PATH", path.to_str().expect("utf-8 path")),
            ("FRAME_COUNT", "45"),
        ]));

        assert!(file_error.is_none());
        assert_eq!(config.sequence.driving_signal, DrivingSignal::Timer);
        assert_eq!(config.sequence.frame_count, 45);
        assert_eq!(config.sequence.frame_path(1), "shots/ezgif-frame-001.jpg");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn invalid_config_file_is_reported_and_defaults_apply() {
        let dir = temp_static_dir("config-invalid");
        let path = dir.join("sequence.json");
        fs::write(&path, "{ not json").expect("config file should be writable");

        let (config, file_error) = SequenceRuntimeConfig::from_lookup(lookup_from(&[
            ("FRAME_CONFIG_PATH", path.to_str().expect("utf-8 path")),
            ("FRAME_SPEED", "7"),
        ]));

        let error = file_error.expect("broken config file should be reported");
        assert_eq!(error.kind, ConfigFileErrorKind::InvalidJson);
        assert_eq!(error.path, path);
        assert_eq!(config.sequence.frame_count, SequenceConfig::default().frame_count);
        assert_eq!(config.sequence.speed, 7);

        let fields = config_file_error_fields(&error);
        assert_eq!(fields["error_class"], "invalid_json");
        assert_eq!(fields["path"], path.display().to_string());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let (config, file_error) = SequenceRuntimeConfig::from_lookup(lookup_from(&[(
            "FRAME_CONFIG_PATH",
            "/no/such/file.json",
        )]));

        let error = file_error.expect("missing config file should be reported");
        assert_eq!(error.kind, ConfigFileErrorKind::Unreadable);
        assert_eq!(error.path, PathBuf::from("/no/such/file.json"));
        assert!(error.to_string().starts_with("/no/such/file.json (unreadable)"));
        assert_eq!(config.sequence, SequenceConfig::default());
    }

    #[test]
    fn audit_reports_exactly_the_missing_frames() {
        let dir = temp_static_dir("audit");
        let sequence = SequenceConfig {
            frame_count: 5,
            ..SequenceConfig::default()
        };
        write_frames(&dir, &sequence, &[3, 5]);

        assert_eq!(audit_frames(&dir, &sequence), vec![3, 5]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn request_id_is_echoed_or_generated() {
        let mut headers = HeaderMap::new();
        assert!(resolve_request_id(&headers).starts_with("req-"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("  abc-123 "));
        assert_eq!(resolve_request_id(&headers), "abc-123");
    }

    #[tokio::test]
    async fn sequence_endpoint_returns_config_and_missing_frames() {
        let state = test_state(PathBuf::from("dist"), vec![37]);
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-test"));

        let response = get_sequence(
            State(state),
            Method::GET,
            Uri::from_static("/api/sequence"),
            headers,
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER),
            Some(&HeaderValue::from_static("req-test"))
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-cache"))
        );

        let body = body_json(response).await;
        let parsed: SequenceResponse =
            serde_json::from_value(body).expect("body should match SequenceResponse");
        assert!(parsed.ok);
        assert_eq!(parsed.config.frame_count, 5);
        assert_eq!(parsed.missing_frames, vec![37]);
    }
}
