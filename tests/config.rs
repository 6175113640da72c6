// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, discovery, destination merging, and push request building.

use hauler::config::*;
use hauler::error::Error;
use hauler::runtime::RuntimeType;
use hauler::types::ImageRef;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_yaml("host: ssh://web1.example.com\n").unwrap();
        assert_eq!(config.host, "ssh://web1.example.com");
        assert!(config.source.is_none());
        assert!(!config.override_existing);
        assert!(!config.compare_checksum);
        assert!(config.trust_first_connection);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
source: myapp:latest
host: ssh://deploy@web1:2222
image: registry.internal/myapp
tag: v1
override_existing: false
compare_checksum: true
runtime: podman
socket: /run/user/1000/podman/podman.sock
key_path: /etc/hauler/id_ed25519
trust_first_connection: false
timeout: 30m
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.source.unwrap().full_name(), "myapp:latest");
        assert_eq!(config.image.as_deref(), Some("registry.internal/myapp"));
        assert_eq!(config.tag.as_deref(), Some("v1"));
        assert!(config.compare_checksum);
        assert_eq!(config.runtime, Some(RuntimeType::Podman));
        assert_eq!(
            config.key_path,
            Some(PathBuf::from("/etc/hauler/id_ed25519"))
        );
        assert!(!config.trust_first_connection);
        assert_eq!(config.timeout, Some(Duration::from_secs(30 * 60)));
    }

    #[test]
    fn missing_host_returns_error() {
        let err = Config::from_yaml("source: myapp:latest\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn non_ssh_host_returns_error() {
        let err = Config::from_yaml("host: tcp://web1:2375\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("tcp://web1:2375"));
    }

    #[test]
    fn invalid_source_returns_error() {
        let yaml = "host: ssh://web1\nsource: \"my app\"\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn empty_tag_returns_error() {
        let yaml = "host: ssh://web1\ntag: \"\"\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("tag cannot be empty"));
    }

    #[test]
    fn socket_without_runtime_returns_error() {
        let yaml = "host: ssh://web1\nsocket: /tmp/engine.sock\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("socket is set without runtime"));
    }

    #[test]
    fn key_path_expands_home() {
        temp_env::with_var("HOME", Some("/home/deploy"), || {
            let config =
                Config::from_yaml("host: ssh://web1\nkey_path: ~/.ssh/id_ed25519\n").unwrap();
            assert_eq!(
                config.key_path,
                Some(PathBuf::from("/home/deploy/.ssh/id_ed25519"))
            );
        });
    }
}

mod discovery {
    use super::*;

    #[test]
    fn finds_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "host: ssh://primary\n").unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_ALT), "host: ssh://alt\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.host, "ssh://primary");
    }

    #[test]
    fn falls_back_to_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".hauler")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), "host: ssh://nested\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.host, "ssh://nested");
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}

mod destinations {
    use super::*;

    const YAML: &str = r#"
source: myapp:latest
host: ssh://deploy@web1
tag: v1
compare_checksum: true
destinations:
  staging:
    host: ssh://deploy@staging
    tag: staging
    timeout: 5m
  force:
    override_existing: true
"#;

    #[test]
    fn destination_overrides_host_and_tag() {
        let config = Config::from_yaml(YAML).unwrap();
        let staging = config.for_destination("staging").unwrap();

        assert_eq!(staging.host, "ssh://deploy@staging");
        assert_eq!(staging.tag.as_deref(), Some("staging"));
        assert_eq!(staging.timeout, Some(Duration::from_secs(300)));
        assert!(staging.compare_checksum);
    }

    #[test]
    fn destination_can_force_override() {
        let config = Config::from_yaml(YAML).unwrap();
        let forced = config.for_destination("force").unwrap();

        assert_eq!(forced.host, "ssh://deploy@web1");
        assert!(!forced.policy().compares_remote());
    }

    #[test]
    fn unknown_destination_returns_error() {
        let config = Config::from_yaml(YAML).unwrap();
        let err = config.for_destination("production").unwrap_err();
        assert!(matches!(err, Error::UnknownDestination(name) if name == "production"));
    }

    #[test]
    fn invalid_destination_host_is_rejected() {
        let yaml = r#"
host: ssh://web1
destinations:
  broken:
    host: web2
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.for_destination("broken").is_err());
    }
}

mod push_requests {
    use super::*;

    #[test]
    fn request_carries_remote_options() {
        let yaml = r#"
source: myapp:latest
host: ssh://deploy@web1
runtime: docker
trust_first_connection: false
timeout: 90s
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let request = config.push_request(None).unwrap();

        assert_eq!(request.source, ImageRef::parse("myapp:latest").unwrap());
        assert_eq!(request.host, "ssh://deploy@web1");
        assert_eq!(request.remote.runtime.runtime, Some(RuntimeType::Docker));
        assert!(!request.remote.trust_first_connection);
        assert_eq!(request.timeout, Some(Duration::from_secs(90)));
    }
}

mod init {
    use super::*;

    #[test]
    fn generated_template_parses() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("ssh://ops@build"), Some("api:v3"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.host, "ssh://ops@build");
        assert_eq!(config.source.unwrap().full_name(), "api:v3");
        assert!(config.compare_checksum);
    }

    #[test]
    fn rejects_invalid_host() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_config(dir.path(), Some("build-server"), None, false).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(!dir.path().join(CONFIG_FILENAME).exists());
    }
}
