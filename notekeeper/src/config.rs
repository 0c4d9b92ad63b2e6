use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_port() -> u16 {
    5000
}

fn default_database_url() -> String {
    "notekeeper.db".into()
}

impl Config {
    /// Reads `PORT` and `DATABASE_URL`, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.database_url, "notekeeper.db");
    }

    #[test]
    fn reads_port_and_database_url() {
        let config = Config::from_vars(vars(&[("PORT", "8080"), ("DATABASE_URL", "/data/notes.db")])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "/data/notes.db");
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
