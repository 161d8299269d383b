//! Site adapters and lookup by source name.

pub mod comix;
pub mod grimelek;
pub mod madara;

use crate::config::Config;
use crate::parser::SiteAdapter;
use std::sync::Arc;

/// Names accepted by [`adapter_by_name`]
pub const SOURCE_NAMES: &[&str] = &[comix::SOURCE_NAME, grimelek::SOURCE_NAME];

/// Build the adapter for `name` (case-insensitive), applying any domain
/// override from the `[sources.<name>]` config table.
pub fn adapter_by_name(name: &str, config: &Config) -> Option<Arc<dyn SiteAdapter>> {
    let key = name.to_lowercase();
    let domain = config.domain_for(&key);
    let adapter: Arc<dyn SiteAdapter> = match key.as_str() {
        "comix" => Arc::new(comix::Comix::with_domain(
            domain.unwrap_or(comix::DEFAULT_DOMAIN),
        )),
        "grimelek" => Arc::new(grimelek::with_domain(
            domain.unwrap_or(grimelek::DEFAULT_DOMAIN),
        )),
        _ => {
            log::warn!("Unknown source: {}", name);
            return None;
        }
    };
    log::debug!("{} -> {}", adapter.config().name, adapter.config().base_url());
    Some(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sources() {
        let config = Config::default();
        for name in SOURCE_NAMES {
            let adapter = adapter_by_name(name, &config).unwrap();
            assert_eq!(adapter.config().name, *name);
        }
        assert!(adapter_by_name("nope", &config).is_none());
    }

    #[test]
    fn test_domain_override() {
        let config: Config = toml::from_str("[sources.grimelek]\ndomain = \"mirror.example\"\n").unwrap();
        let adapter = adapter_by_name("Grimelek", &config).unwrap();
        assert_eq!(adapter.config().base_url(), "https://mirror.example");
        assert_eq!(
            adapter_by_name("comix", &config).unwrap().config().domain,
            comix::DEFAULT_DOMAIN
        );
    }
}
