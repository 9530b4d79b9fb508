use anyhow::Context;
use std::net::SocketAddr;

/// Gateway runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address (`GATEWAY_ADDR`, default `0.0.0.0:8080`)
    pub addr: SocketAddr,
    /// HMAC secret shared with the identity system (`JWT_SECRET`, required)
    pub jwt_secret: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let addr = std::env::var("GATEWAY_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("GATEWAY_ADDR must be a socket address")?;

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Self { addr, jwt_secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr_parses() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
