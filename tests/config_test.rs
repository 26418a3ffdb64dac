use rask_log_shipper::app::{Config, ConfigError, DiagnosticLevel, LogFormat};
use rask_log_shipper::{LogLevel, SerializerFormat, Severity};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "RASK_BROKER_URL",
    "RASK_VHOST",
    "RASK_EXCHANGE",
    "RASK_USERNAME",
    "RASK_PASSWORD",
    "RASK_APPLICATION",
    "RASK_LEVEL",
    "RASK_CATEGORY",
    "RASK_SEVERITY",
    "RASK_PAYLOAD_FORMAT",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "REQUEST_TIMEOUT_SECS",
    "CONNECTION_TIMEOUT_SECS",
    "ENABLE_COMPRESSION",
    "CONFIG_FILE",
];

fn clean_env() {
    unsafe {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }
}

fn set_env(vars: &[(&str, &str)]) {
    unsafe {
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }
}

#[test]
#[serial]
fn test_defaults_from_args() {
    clean_env();

    let config = Config::from_args(["rask-log-shipper"]).unwrap();

    assert_eq!(config.broker_url, "http://localhost:15672");
    assert_eq!(config.vhost, "/");
    assert_eq!(config.exchange, "rask.logs");
    assert_eq!(config.level, LogLevel::PRODUCTION);
    assert_eq!(config.severity, Severity::Info);
    assert_eq!(config.log_level, DiagnosticLevel::Info);
    assert_eq!(config.log_format, LogFormat::Compact);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.connection_timeout, Duration::from_secs(10));
}

#[test]
#[serial]
fn test_cli_arguments_override_defaults() {
    clean_env();

    let config = Config::from_args([
        "rask-log-shipper",
        "--broker-url",
        "https://rabbit.internal:15671",
        "--exchange",
        "payments.logs",
        "--level",
        "fatal|error",
        "--severity",
        "warning",
        "--payload-format",
        "pretty-json",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert_eq!(config.broker_url, "https://rabbit.internal:15671");
    assert_eq!(config.level, LogLevel::FATAL | LogLevel::ERROR);
    assert_eq!(config.severity, Severity::Warning);
    assert_eq!(config.payload_format, SerializerFormat::PrettyJson);
    assert_eq!(config.log_format, LogFormat::Json);

    let shipper = config.shipper_config();
    assert_eq!(shipper.exchange, "payments.logs");
    assert_eq!(shipper.serializer_format, SerializerFormat::PrettyJson);
}

#[test]
#[serial]
fn test_from_env() {
    clean_env();
    set_env(&[
        ("RASK_BROKER_URL", "http://broker:15672"),
        ("RASK_VHOST", "staging"),
        ("RASK_EXCHANGE", "orders.logs"),
        ("RASK_APPLICATION", "orders"),
        ("RASK_LEVEL", "all"),
        ("LOG_LEVEL", "DEBUG"),
        ("REQUEST_TIMEOUT_SECS", "5"),
        ("ENABLE_COMPRESSION", "true"),
    ]);

    let config = Config::from_env().unwrap();
    clean_env();

    assert_eq!(config.vhost, "staging");
    assert_eq!(config.level, LogLevel::ALL);
    assert_eq!(config.log_level, DiagnosticLevel::Debug);

    let management = config.management_config();
    assert_eq!(management.broker_url, "http://broker:15672");
    assert_eq!(management.vhost, "staging");
    assert_eq!(management.timeout, Duration::from_secs(5));
    assert!(management.enable_compression);

    let shipper = config.shipper_config();
    assert_eq!(shipper.application_name, "orders");
    assert_eq!(shipper.exchange, "orders.logs");
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clean_env();

    set_env(&[("RASK_LEVEL", "loud")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));
    clean_env();

    set_env(&[("LOG_FORMAT", "xml")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));
    clean_env();

    set_env(&[("CONNECTION_TIMEOUT_SECS", "soon")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));
    clean_env();
}

#[test]
#[serial]
fn test_validation_failures() {
    clean_env();

    set_env(&[("RASK_EXCHANGE", "")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::InvalidConfig(_))));
    clean_env();

    set_env(&[("RASK_BROKER_URL", "amqp://broker:5672")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::InvalidUrl(_))));
    clean_env();

    set_env(&[("REQUEST_TIMEOUT_SECS", "0")]);
    assert!(matches!(Config::from_env(), Err(ConfigError::InvalidConfig(_))));
    clean_env();
}

#[test]
#[serial]
fn test_from_file() {
    clean_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
broker_url = "http://rabbit:15672"
vhost = "prod"
exchange = "audit.logs"
application_name = "audit"
level = "fatal|error|warning|info"
severity = "warning"
payload_format = "pretty-json"
log_format = "json"
connection_timeout_secs = 3
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.vhost, "prod");
    assert_eq!(config.exchange, "audit.logs");
    assert_eq!(config.level, LogLevel::PRODUCTION | LogLevel::INFO);
    assert_eq!(config.severity, Severity::Warning);
    assert_eq!(config.payload_format, SerializerFormat::PrettyJson);
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.connection_timeout, Duration::from_secs(3));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.config_file.as_deref(), Some(file.path()));
}

#[test]
#[serial]
fn test_file_accepts_same_spellings_as_cli() {
    clean_env();

    for (severity, format, expected_severity, expected_format) in [
        ("info", "pretty-json", Severity::Info, SerializerFormat::PrettyJson),
        ("Error", "toml", Severity::Error, SerializerFormat::Toml),
        ("DEBUG", "json", Severity::Debug, SerializerFormat::Json),
    ] {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "severity = \"{severity}\"\npayload_format = \"{format}\"").unwrap();

        let from_file = Config::from_file(file.path()).unwrap();
        let from_cli = Config::from_args([
            "rask-log-shipper",
            "--severity",
            severity,
            "--payload-format",
            format,
        ])
        .unwrap();

        assert_eq!(from_file.severity, expected_severity);
        assert_eq!(from_file.payload_format, expected_format);
        assert_eq!(from_cli.severity, from_file.severity);
        assert_eq!(from_cli.payload_format, from_file.payload_format);
    }
}

#[test]
#[serial]
fn test_config_file_argument_loads_file() {
    clean_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "exchange = \"from-file\"").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let config = Config::from_args(["rask-log-shipper", "--config-file", &path]).unwrap();
    assert_eq!(config.exchange, "from-file");
}

#[test]
#[serial]
fn test_malformed_file_is_a_parse_error() {
    clean_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "exchange = [unterminated").unwrap();

    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::ParseError(_))
    ));
    assert!(matches!(
        Config::from_file("/nonexistent/rask.toml"),
        Err(ConfigError::FileError(_))
    ));
}
