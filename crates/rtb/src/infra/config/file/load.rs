use {
    super::Config as File,
    crate::infra::{self, api, client, config, observe},
    anyhow::{Context, anyhow, ensure},
    std::{collections::HashSet, path::Path},
};

/// Load the service configuration from a TOML file.
pub async fn load(path: &Path) -> anyhow::Result<infra::Config> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {}", path.display()))?;
    let file: File = match toml::from_str(&data) {
        Ok(file) => file,
        Err(err) if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") => {
            return Err(anyhow!(
                "failed to parse TOML config at {}: {err:#?}",
                path.display()
            ));
        }
        Err(_) => {
            return Err(anyhow!(
                "failed to parse TOML config at: {}. Set TOML_TRACE_ERROR=1 to print parsing \
                 error but this may leak secrets.",
                path.display()
            ));
        }
    };
    validate(file)
}

fn validate(file: File) -> anyhow::Result<infra::Config> {
    ensure!(
        !file.round_timeout.is_zero(),
        "round-timeout must be greater than zero"
    );

    ensure!(
        file.server.request_timeout > file.round_timeout,
        "server request-timeout ({:?}) must be longer than round-timeout ({:?})",
        file.server.request_timeout,
        file.round_timeout
    );
    ensure!(
        file.server.concurrency > 0,
        "server concurrency must be greater than zero"
    );
    ensure!(
        axum::http::HeaderValue::from_str(&file.server.name).is_ok(),
        "server name {:?} is not a valid header value",
        file.server.name
    );

    let mut names = HashSet::new();
    let mut partners = Vec::with_capacity(file.partners.len());
    for partner in file.partners {
        ensure!(
            names.insert(partner.name.clone()),
            "partner {:?} is configured more than once",
            partner.name
        );
        let timeout = match partner.timeout {
            Some(timeout) if timeout > file.round_timeout => {
                observe::partner_timeout_clamped(&partner.name, timeout, file.round_timeout);
                file.round_timeout
            }
            Some(timeout) => {
                ensure!(
                    !timeout.is_zero(),
                    "timeout of partner {:?} must be greater than zero",
                    partner.name
                );
                timeout
            }
            None => file.round_timeout,
        };
        partners.push(config::Partner {
            name: partner.name.into(),
            client: client::Config {
                endpoint: partner.endpoint,
                connection: partner.connection,
                timeout,
            },
        });
    }

    Ok(infra::Config {
        round_timeout: file.round_timeout,
        api: api::Config {
            name: file.server.name,
            request_timeout: file.server.request_timeout,
            concurrency: file.server.concurrency,
            max_body_size: file.server.max_body_size,
            synthetic_bids: file.server.synthetic_bids,
        },
        partners,
    })
}
