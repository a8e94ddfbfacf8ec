use std::path::PathBuf;
use std::time::Duration;

use super::parsing::{
    env_flag, env_number, env_optional, env_or_default, normalize_base_url, parse_cors_origins,
    parse_environment, parse_row_store_backend,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, ExamSettings, GradingSettings, RedisSettings,
    RowStoreBackend, RowStoreSettings, RuntimeSettings, S3Settings, ServerSettings, Settings,
    StorageSettings, TelemetrySettings,
};
use crate::services::answer_normalizer::CheckScalarPolicy;
use crate::store::retry::RetryPolicy;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EXAMDESK_HOST", "0.0.0.0");
        let port = env_or_default("EXAMDESK_PORT", "8000");

        let environment = parse_environment(env_optional("EXAMDESK_ENV"));
        let strict_config = env_flag("EXAMDESK_STRICT_CONFIG") || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "ExamDesk API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");
        let public_url =
            normalize_base_url(env_or_default("EXAMDESK_PUBLIC_URL", "http://localhost:8000"));

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let backend = parse_row_store_backend(env_or_default("ROW_STORE_BACKEND", "memory"))?;
        let key_prefix = env_or_default("ROW_STORE_KEY_PREFIX", "examdesk");
        let retry_attempts = env_number("STORE_RETRY_ATTEMPTS", 4)?;
        let retry_base_ms = env_number("STORE_RETRY_BASE_MS", 100)?;
        let retry_max_ms = env_number("STORE_RETRY_MAX_MS", 2000)?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = env_number("REDIS_PORT", 6379)?;
        let redis_db = env_number("REDIS_DB", 0)?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let points_per_question = env_number("POINTS_PER_QUESTION", 1)?;
        let strict_check_answers = env_flag("STRICT_CHECK_ANSWERS");
        let disclose_correct_answers = env_flag("DISCLOSE_CORRECT_ANSWERS");

        let fixed_questions_path = env_optional("FIXED_QUESTIONS_PATH").map(PathBuf::from);
        let max_custom_questions = env_number::<usize>("MAX_CUSTOM_QUESTIONS", 100)?;

        let max_upload_size_mb = env_number("MAX_UPLOAD_SIZE_MB", 10)?;
        let max_files_per_upload = env_number("MAX_FILES_PER_UPLOAD", 10)?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "http://localhost:9000");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "examdesk-supports");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let log_level = env_or_default("EXAMDESK_LOG_LEVEL", "info");
        let json = env_flag("EXAMDESK_LOG_JSON");
        let prometheus_enabled = env_flag("PROMETHEUS_ENABLED");

        let settings = Self {
            server: ServerSettings::from_env_values(host, port)?,
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str, public_url },
            cors: CorsSettings { origins: cors_origins },
            row_store: RowStoreSettings {
                backend,
                key_prefix,
                retry_attempts,
                retry_base_ms,
                retry_max_ms,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            grading: GradingSettings {
                points_per_question,
                strict_check_answers,
                disclose_correct_answers,
            },
            exam: ExamSettings { fixed_questions_path, max_custom_questions },
            storage: StorageSettings { max_upload_size_mb, max_files_per_upload },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn row_store(&self) -> &RowStoreSettings {
        &self.row_store
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn grading(&self) -> &GradingSettings {
        &self.grading
    }

    pub(crate) fn exam(&self) -> &ExamSettings {
        &self.exam
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.row_store.retry_attempts,
            base_delay: Duration::from_millis(self.row_store.retry_base_ms),
            max_delay: Duration::from_millis(self.row_store.retry_max_ms),
        }
    }

    pub(crate) fn check_scalar_policy(&self) -> CheckScalarPolicy {
        if self.grading.strict_check_answers {
            CheckScalarPolicy::Reject
        } else {
            CheckScalarPolicy::Singleton
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.grading.points_per_question == 0 {
            return Err(ConfigError::InvalidValue {
                field: "POINTS_PER_QUESTION",
                value: "0".to_string(),
            });
        }

        let max_custom = u64::try_from(self.exam.max_custom_questions).unwrap_or(u64::MAX);
        if u64::from(self.grading.points_per_question).saturating_mul(max_custom)
            > u64::from(u32::MAX)
        {
            return Err(ConfigError::InvalidValue {
                field: "POINTS_PER_QUESTION",
                value: self.grading.points_per_question.to_string(),
            });
        }

        if self.row_store.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "STORE_RETRY_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        if self.row_store.retry_base_ms > self.row_store.retry_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "STORE_RETRY_BASE_MS",
                value: self.row_store.retry_base_ms.to_string(),
            });
        }

        if self.row_store.key_prefix.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "ROW_STORE_KEY_PREFIX",
                value: self.row_store.key_prefix.clone(),
            });
        }

        if self.storage.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if let Some(path) = &self.exam.fixed_questions_path {
            if !path.is_file() {
                return Err(ConfigError::InvalidValue {
                    field: "FIXED_QUESTIONS_PATH",
                    value: path.display().to_string(),
                });
            }
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.row_store.backend != RowStoreBackend::Redis {
            return Err(ConfigError::InvalidValue {
                field: "ROW_STORE_BACKEND",
                value: self.row_store.backend.as_str().to_string(),
            });
        }
        if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }

        Ok(())
    }
}
