use pretty_assertions::assert_eq;
use rosterd_api::config::ApiConfig;
use tracing::Level;

#[test]
fn test_config_from_env() {
    unsafe {
        std::env::set_var("DATABASE_URL", "postgres://localhost/rosterd");
        std::env::set_var("API_HOST", "127.0.0.1");
        std::env::set_var("API_PORT", "8080");
        std::env::set_var("LOG_LEVEL", "debug");
        std::env::set_var("API_CORS_ORIGINS", "http://a.example, http://b.example");
    }

    let config = ApiConfig::from_env().expect("config should load");

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.database_url, "postgres://localhost/rosterd");
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec![
            "http://a.example".to_string(),
            "http://b.example".to_string()
        ])
    );
    assert_eq!(config.server_addr(), "127.0.0.1:8080");
}
