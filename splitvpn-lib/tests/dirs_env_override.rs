#[cfg(test)]
mod tests {
    use splitvpn_lib::{config, dirs};
    use std::env;
    use std::fs;

    #[tokio::test]
    async fn test_override() {
        let tmp = env::temp_dir().join("splitvpn_override_test");
        let _ = fs::remove_dir_all(&tmp);

        unsafe {
            env::set_var(dirs::ENV_VAR_HOME, &tmp);
        }

        let res = dirs::config_dir("test.toml");
        assert!(res.is_ok());
        let path = res.unwrap();
        assert_eq!(path, tmp.join("config").join("test.toml"));

        let res_data = dirs::data_dir("test.db");
        assert!(res_data.is_ok());
        assert_eq!(res_data.unwrap(), tmp.join("data").join("test.db"));

        // no config file yet: defaults point the database into the data dir
        let cfg = config::read_or_default(&tmp.join("config").join("config.toml")).await;
        assert!(cfg.is_ok());
        let cfg = cfg.unwrap();
        assert_eq!(
            cfg.database.url,
            format!("sqlite://{}", tmp.join("data").join(config::DATABASE_FILE).display())
        );

        unsafe {
            env::remove_var(dirs::ENV_VAR_HOME);
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
