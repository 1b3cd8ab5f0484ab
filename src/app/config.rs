//! Layered configuration (spec.md §6 "Configuration options"): built-in
//! defaults, an optional TOML file, then CLI flags/env vars, CLI taking
//! precedence — the same three-source layering the teacher's config
//! module uses, just over a much smaller field set.

use std::path::PathBuf;

use serde::Deserialize;

use crate::app::args::Args;
use crate::errors::Error;
use crate::utils::generate_password;

const DEFAULT_QUERY_TIMEOUT: i64 = -1;
const DEFAULT_PENDING_CONNECTIONS: u32 = 128;
const GENERATED_PASSWORD_BYTES: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub unix_domain_socket: Option<PathBuf>,
    pub password: Vec<u8>,
    pub query_timeout: i64,
    pub pending_connections: u32,
    pub run_server_on_thread: bool,
    pub server_thread: Option<String>,
    pub write_connection_values: bool,
    pub write_output_to_file: Option<PathBuf>,
    pub ignore_sig_int: bool,
    pub halt_on_connection_failure: bool,
}

/// Shape of the optional on-disk TOML file. Every field is optional so a
/// file may set as few or as many options as it likes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FileConfig {
    port: Option<u16>,
    unix_domain_socket: Option<String>,
    password: Option<String>,
    query_timeout: Option<i64>,
    pending_connections: Option<u32>,
    run_server_on_thread: Option<bool>,
    server_thread: Option<String>,
    write_connection_values: Option<bool>,
    write_output_to_file: Option<String>,
    ignore_sig_int: Option<bool>,
    halt_on_connection_failure: Option<bool>,
}

pub fn load(args: &Args) -> Result<Config, Error> {
    let file = match &args.config_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            toml::from_str(&text).map_err(|e| Error::BadConfig(e.to_string()))?
        }
        None => FileConfig::default(),
    };

    let unix_domain_socket = args
        .unix_domain_socket
        .clone()
        .or(file.unix_domain_socket)
        .map(PathBuf::from);
    if let Some(path) = &unix_domain_socket {
        if !path.is_absolute() {
            return Err(Error::RelativeSocketPath(path.display().to_string()));
        }
    }

    let password = match args.password.clone().or(file.password) {
        Some(password) => password.into_bytes(),
        None => generate_password(GENERATED_PASSWORD_BYTES),
    };

    Ok(Config {
        port: args.port.or(file.port),
        unix_domain_socket,
        password,
        query_timeout: args
            .query_timeout
            .or(file.query_timeout)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT),
        pending_connections: args
            .pending_connections
            .or(file.pending_connections)
            .unwrap_or(DEFAULT_PENDING_CONNECTIONS),
        run_server_on_thread: args.run_server_on_thread || file.run_server_on_thread.unwrap_or(false),
        server_thread: args.server_thread.clone().or(file.server_thread),
        write_connection_values: args.write_connection_values
            || file.write_connection_values.unwrap_or(false),
        write_output_to_file: args
            .write_output_to_file
            .clone()
            .or(file.write_output_to_file)
            .map(PathBuf::from),
        ignore_sig_int: args.ignore_sig_int || file.ignore_sig_int.unwrap_or(false),
        halt_on_connection_failure: args.halt_on_connection_failure
            || file.halt_on_connection_failure.unwrap_or(false),
    })
}

#[cfg(test)]
mod config_tests;
