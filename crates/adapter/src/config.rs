use crate::cli::SourceArgs;
use crate::error::{AdapterError, Result};
use apibridge_openapi_tools::BridgeConfig;

/// Build the bridge configuration: `--config` file first, then flags (and their env fallbacks).
pub fn bridge_config(args: &SourceArgs) -> Result<BridgeConfig> {
    let mut cfg = match (&args.config, &args.spec) {
        (Some(path), _) => BridgeConfig::from_file(path)?,
        (None, Some(spec)) => BridgeConfig::new(spec.clone()),
        (None, None) => {
            return Err(AdapterError::Config(
                "No OpenAPI spec configured (use --spec, OPENAPI_SPEC or --config)".to_string(),
            ));
        }
    };

    if let Some(spec) = &args.spec {
        cfg.spec.clone_from(spec);
    }
    if args.base_url.is_some() {
        cfg.base_url.clone_from(&args.base_url);
    }
    if let Some(secs) = args.timeout_secs {
        cfg.timeout_secs = secs;
    }
    if args.spec_hash.is_some() {
        cfg.spec_hash.clone_from(&args.spec_hash);
    }
    if let Some(policy) = args.spec_hash_policy {
        cfg.spec_hash_policy = policy;
    }

    let include = endpoint_list(&args.include_endpoints);
    if !include.is_empty() {
        cfg.compile.include_endpoints = include;
    }
    let exclude = endpoint_list(&args.exclude_endpoints);
    if !exclude.is_empty() {
        cfg.compile.exclude_endpoints = exclude;
    }
    if let Some(prefix) = &args.tool_prefix {
        cfg.compile.tool_prefix.clone_from(prefix);
    }
    if let Some(convert) = args.html_to_markdown {
        cfg.compile.html_to_markdown = convert;
    }

    if cfg.spec.trim().is_empty() {
        return Err(AdapterError::Config("OpenAPI spec location is empty".to_string()));
    }
    Ok(cfg)
}

fn endpoint_list(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apibridge_openapi_tools::HashPolicy;
    use std::io::Write as _;

    #[test]
    fn requires_a_spec() {
        let err = bridge_config(&SourceArgs::default()).unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[test]
    fn flags_build_a_config() {
        let args = SourceArgs {
            spec: Some("./openapi.yaml".to_string()),
            include_endpoints: vec![" get:/health ".to_string(), String::new()],
            tool_prefix: Some("tg_".to_string()),
            html_to_markdown: Some(false),
            spec_hash_policy: Some(HashPolicy::Fail),
            ..SourceArgs::default()
        };
        let cfg = bridge_config(&args).unwrap();
        assert_eq!(cfg.spec, "./openapi.yaml");
        assert_eq!(cfg.compile.include_endpoints, vec!["get:/health"]);
        assert_eq!(cfg.compile.tool_prefix, "tg_");
        assert!(!cfg.compile.html_to_markdown);
        assert_eq!(cfg.spec_hash_policy, HashPolicy::Fail);
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(
            b"spec: ./from-file.yaml\nbaseUrl: https://file.example.com\ntimeoutSecs: 5\nexcludeEndpoints: ['get:/health']\n",
        )
        .unwrap();

        let args = SourceArgs {
            config: Some(file.path().to_path_buf()),
            base_url: Some("http://localhost:8080".to_string()),
            ..SourceArgs::default()
        };
        let cfg = bridge_config(&args).unwrap();
        assert_eq!(cfg.spec, "./from-file.yaml");
        assert_eq!(cfg.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.compile.exclude_endpoints, vec!["get:/health"]);
    }
}
