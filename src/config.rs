use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub file_logs: Option<FileLogConfig>,
}

#[derive(Debug, Clone)]
pub struct FileLogConfig {
    pub dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
            .then(|| FileLogConfig {
                dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            });

        Self {
            host,
            port,
            log_level,
            file_logs,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = Config {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            log_level: "info".to_string(),
            file_logs: None,
        };
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
    }
}
