use std::{net::SocketAddr, num::ParseIntError};

/// Address the API server binds to, from the env vars HOST and PORT.
/// Uses defaults `127.0.0.1:3000` if env vars are empty.
pub fn get_bind_address() -> Result<SocketAddr, HostPortError> {
    let (host, port) = host_and_port()?;
    let address = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    Ok(address)
}

/// Base URL other services use to reach the API server, e.g. `http://127.0.0.1:3000`.
/// Built from the same HOST and PORT env vars as [`get_bind_address`].
pub fn get_api_base_url() -> Result<String, HostPortError> {
    let (host, port) = host_and_port()?;
    Ok(format!("http://{}:{}", host, port))
}

fn host_and_port() -> Result<(String, u16), HostPortError> {
    let host = match std::env::var("HOST") {
        Ok(h) if !h.trim().is_empty() => h.trim().to_string(),
        _ => "127.0.0.1".to_string(),
    };
    let port = match std::env::var("PORT") {
        Ok(p) if !p.trim().is_empty() => p.trim().parse::<u16>()?,
        _ => 3000,
    };
    Ok((host, port))
}

#[derive(Debug)]
pub enum HostPortError {
    InvalidPort(ParseIntError),
    InvalidHostname(std::net::AddrParseError),
}

impl std::error::Error for HostPortError {}

impl std::fmt::Display for HostPortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPortError::InvalidPort(err) => write!(f, "Invalid PORT: {}", err),
            HostPortError::InvalidHostname(err) => write!(f, "Invalid HOST: {}", err),
        }
    }
}

impl From<ParseIntError> for HostPortError {
    fn from(err: ParseIntError) -> Self {
        HostPortError::InvalidPort(err)
    }
}

impl From<std::net::AddrParseError> for HostPortError {
    fn from(err: std::net::AddrParseError) -> Self {
        HostPortError::InvalidHostname(err)
    }
}
