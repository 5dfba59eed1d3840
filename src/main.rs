// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr};

use authz_gateway::{
    api::router,
    config::{
        GatewayConfig, DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, HOST_ENV, LOG_FORMAT_ENV,
        PORT_ENV, TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV,
    },
    state::AppState,
};
use axum_server::tls_rustls::RustlsConfig;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

#[tokio::main]
async fn main() {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    init_tracing();

    let config = match GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(
        application = %config.application,
        realm = %config.kerberos.realm,
        trusted_clients = config.trusted_users.len(),
        ldap = config.ldap.enabled,
        "configuration loaded"
    );

    let state = AppState::from_config(config);
    let app = router(state);

    // Parse bind address
    let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    match (env::var(TLS_CERT_PATH_ENV), env::var(TLS_KEY_PATH_ENV)) {
        (Ok(cert), Ok(key)) => {
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .expect("Failed to load TLS certificate/key");
            info!(%addr, "Authz gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .serve(service)
                .await
                .expect("HTTPS server failed");
        }
        _ => {
            info!(%addr, "Authz gateway listening on http (docs at /docs)");
            axum_server::bind(addr)
                .serve(service)
                .await
                .expect("HTTP server failed");
        }
    }
}
