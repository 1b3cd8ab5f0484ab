use super::*;
use crate::app::args::LogFormat;
use std::io::Write;

fn bare_args() -> Args {
    Args {
        config_file: None,
        port: None,
        unix_domain_socket: None,
        password: None,
        query_timeout: None,
        pending_connections: None,
        run_server_on_thread: false,
        server_thread: None,
        write_connection_values: false,
        write_output_to_file: None,
        ignore_sig_int: false,
        halt_on_connection_failure: false,
        log_level: tracing::Level::INFO,
        log_format: LogFormat::Text,
        no_color: false,
    }
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = load(&bare_args()).unwrap();
    assert_eq!(config.query_timeout, DEFAULT_QUERY_TIMEOUT);
    assert_eq!(config.pending_connections, DEFAULT_PENDING_CONNECTIONS);
    assert_eq!(config.password.len(), GENERATED_PASSWORD_BYTES * 2);
}

#[test]
fn cli_password_overrides_generation() {
    let mut args = bare_args();
    args.password = Some("s3cr3t".to_string());
    let config = load(&args).unwrap();
    assert_eq!(config.password, b"s3cr3t".to_vec());
}

#[test]
fn relative_unix_socket_path_is_rejected() {
    let mut args = bare_args();
    args.unix_domain_socket = Some("relative/path.sock".to_string());
    assert!(matches!(load(&args), Err(Error::RelativeSocketPath(_))));
}

#[test]
fn toml_file_is_layered_under_cli_flags() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 9999\nquery_timeout = 30").unwrap();

    let mut args = bare_args();
    args.config_file = Some(file.path().to_str().unwrap().to_string());
    args.query_timeout = Some(5);

    let config = load(&args).unwrap();
    assert_eq!(config.port, Some(9999));
    assert_eq!(config.query_timeout, 5);
}
