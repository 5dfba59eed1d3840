// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(gateway: Gateway, config: GatewayConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config: Arc::new(config),
        }
    }

    /// Production state built from configuration.
    pub fn from_config(config: GatewayConfig) -> Self {
        let gateway = Gateway::from_config(&config);
        Self::new(gateway, config)
    }

    pub fn application(&self) -> &str {
        self.gateway.issuer().application()
    }
}
