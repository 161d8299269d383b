//! Grimelek (siyahmelek.pro), a Turkish Madara site.

use super::madara::{Madara, MadaraConfig};

pub const SOURCE_NAME: &str = "GRIMELEK";
pub const DEFAULT_DOMAIN: &str = "siyahmelek.pro";

const TURKISH_MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

pub fn config(domain: &str) -> MadaraConfig {
    MadaraConfig {
        page_size: 20,
        locale: "tr".to_string(),
        list_url: "seri/".to_string(),
        date_format: "%d %B %Y".to_string(),
        month_names: Some(TURKISH_MONTHS),
        auth_cookie: Some("wordpress_logged".to_string()),
        ..MadaraConfig::new(SOURCE_NAME, domain)
    }
}

pub fn grimelek() -> Madara {
    Madara::new(config(DEFAULT_DOMAIN))
}

pub fn with_domain(domain: &str) -> Madara {
    Madara::new(config(domain))
}
