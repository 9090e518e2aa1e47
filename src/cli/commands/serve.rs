//! Proxy and configuration commands.

use tokio::runtime::Runtime;

use crate::config::{self, Config, Environment};
use crate::proxy::{self, ProxyState};

const REDACTED: &str = "********";

/// Run the passthrough proxy until Ctrl-C
pub fn cmd_proxy(rt: &Runtime, config: &Config, bind: &str) -> anyhow::Result<()> {
    let state = ProxyState::new(&config.store, &config.credentials)?;
    println!("Proxying {} on {}", config.store.url, bind);
    rt.block_on(proxy::serve(state, bind))?;
    Ok(())
}

/// Print the effective configuration with secrets masked
pub fn cmd_show_config(config: &Config, env: Environment) -> anyhow::Result<()> {
    match config::config_path() {
        Some(path) => println!("# Default config file: {}", path.display()),
        None => println!("# No config directory on this platform"),
    }
    let limits = config.limits(env);
    println!(
        "# Environment: {} ({} artists, {} tracks)\n",
        env, limits.artists, limits.tracks
    );
    print!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    let credentials = &mut config.credentials;
    if credentials.lastfm_api_key.is_some() {
        credentials.lastfm_api_key = Some(REDACTED.to_string());
    }
    if credentials.store_password.is_some() {
        credentials.store_password = Some(REDACTED.to_string());
    }
    config
}
