//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 로드합니다.
//!
//! 로드 순서 (뒤에 오는 소스가 우선):
//! 1. 내장 기본값
//! 2. `config/default.toml` (선택)
//! 3. `config/{environment}.toml` (선택)
//! 4. `ACDASH__` 접두사 환경변수 (예: `ACDASH__JWT__SECRET`)
//! 5. 호환용 단일 환경변수 `PORT`, `JWT_SECRET`, `DATABASE_URL`

use config::{Config, ConfigError, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// 개발용 기본 JWT 시크릿. 운영 환경에서는 거부됩니다.
pub const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 실행 환경 ("development" | "production" | "test")
    pub environment: String,
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// JWT 설정
    pub jwt: JwtConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 초기 데이터 설정
    pub seed: SeedConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록 (쉼표 구분, 비어 있으면 전체 허용)
    #[serde(default)]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: String::new(),
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 인메모리 저장소로 실행
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
    /// 시작 시 마이그레이션 실행 여부
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

/// JWT 설정.
///
/// 시크릿은 시작 시 한 번 주입되고 이후 변경되지 않습니다.
#[derive(Debug, Deserialize)]
pub struct JwtConfig {
    /// HMAC 서명 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
    /// Access Token 만료 시간 (분)
    pub access_ttl_minutes: i64,
    /// Refresh Token 만료 시간 (일)
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    /// 주어진 시크릿과 기본 만료 시간으로 설정을 생성합니다.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        }
    }

    /// 만료 시간을 설정합니다.
    pub fn with_ttl(mut self, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        self.access_ttl_minutes = access_ttl_minutes;
        self.refresh_ttl_days = refresh_ttl_days;
        self
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::new(DEVELOPMENT_JWT_SECRET)
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 초기 데이터(seed) 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// 시작 시 기본 관리자/서비스 생성 여부
    pub enabled: bool,
    /// 관리자 이름
    pub admin_name: String,
    /// 관리자 이메일
    pub admin_email: String,
    /// 관리자 초기 비밀번호
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            admin_name: "Administrator".to_string(),
            admin_email: "admin@dashboardac.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            logging: LoggingConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경변수에서 설정을 로드합니다.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ACDASH__ENVIRONMENT")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Self::defaults()?
            .set_override("environment", environment.clone())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("ACDASH")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// TOML 문자열에서 설정을 로드합니다 (기본값 위에 덮어씀).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let server = ServerConfig::default();
        let database = DatabaseConfig::default();
        let jwt = JwtConfig::default();
        let logging = LoggingConfig::default();
        let seed = SeedConfig::default();

        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", server.host)?
            .set_default("server.port", i64::from(server.port))?
            .set_default("server.request_timeout_secs", server.request_timeout_secs)?
            .set_default("server.cors_origins", server.cors_origins)?
            .set_default("database.max_connections", i64::from(database.max_connections))?
            .set_default("database.acquire_timeout_secs", database.acquire_timeout_secs)?
            .set_default("database.run_migrations", database.run_migrations)?
            .set_default("jwt.secret", jwt.secret.expose_secret())?
            .set_default("jwt.access_ttl_minutes", jwt.access_ttl_minutes)?
            .set_default("jwt.refresh_ttl_days", jwt.refresh_ttl_days)?
            .set_default("logging.level", logging.level)?
            .set_default("logging.format", logging.format)?
            .set_default("seed.enabled", seed.enabled)?
            .set_default("seed.admin_name", seed.admin_name)?
            .set_default("seed.admin_email", seed.admin_email)?
            .set_default("seed.admin_password", seed.admin_password)
    }

    /// 운영 환경 여부.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.jwt.secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }
        if self.is_production() && secret == DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret must be set explicitly in production".to_string(),
            ));
        }
        if self.jwt.access_ttl_minutes <= 0 || self.jwt.refresh_ttl_days <= 0 {
            return Err(ConfigError::Message(
                "jwt token lifetimes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
