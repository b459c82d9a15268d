/// Runtime configuration, read from the environment (`.env` supported).
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub port: u16,
    pub client_url: String,
}

impl Config {
    /// Read configuration from the environment. `MONGODB_URI` is required;
    /// the rest falls back to development defaults.
    pub fn from_env() -> Self {
        Self {
            mongodb_uri: dotenv::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            port: dotenv::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(3000),
            client_url: dotenv::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }
}
