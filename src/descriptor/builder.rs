use super::defs::{CustomDomainBinding, CustomRuntimeConfig, Extra, FunctionProps};
use crate::consts::{
    DEFAULT_PATH, DEFAULT_PYTHONPATH, DEFAULT_ROLE_NAME, JAVA_HOME, JAVA_LAYER, NODEJS_LAYER,
    PYTHON_LAYER,
};
use crate::request::functions::CreateFunctionRequest;
use itertools::Itertools;
use std::collections::BTreeMap;

/// The official runtime layers every custom runtime function gets.
pub fn platform_layers(region: &str) -> [String; 3] {
    [PYTHON_LAYER, NODEJS_LAYER, JAVA_LAYER]
        .map(|layer| format!("acs:fc:{region}:official:layers/{layer}"))
}

/// Appends the platform layers and removes duplicates, keeping the first occurrence.
pub fn normalize_layers(user_layers: Vec<String>, region: &str) -> Vec<String> {
    user_layers
        .into_iter()
        .chain(platform_layers(region))
        .unique()
        .collect()
}

/// Fills in the runtime search paths the platform layers need, never overriding the user's values.
pub fn normalize_env(user_env: Option<BTreeMap<String, String>>) -> BTreeMap<String, String> {
    let mut env = user_env.unwrap_or_default();

    for (key, value) in [
        ("PATH", DEFAULT_PATH),
        ("PYTHONPATH", DEFAULT_PYTHONPATH),
        ("JAVA_HOME", JAVA_HOME),
    ] {
        env.entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    env
}

pub fn default_role(account_id: &str) -> String {
    format!("acs:ram::{account_id}:role/{DEFAULT_ROLE_NAME}")
}

/// The engine rejects an empty `args` list.
pub fn strip_empty_args(mut config: CustomRuntimeConfig) -> CustomRuntimeConfig {
    if config.args.as_ref().is_some_and(Vec::is_empty) {
        config.args = None;
    }
    config
}

/// Builds the descriptor of a new function.
///
/// `code` is where the code lives on this machine, a project directory or a
/// downloaded archive. `layers` and `environment_variables` are expected to be
/// normalized already.
pub fn build(
    request: &CreateFunctionRequest,
    code: &str,
    account_id: &str,
    layers: Vec<String>,
    environment_variables: BTreeMap<String, String>,
) -> FunctionProps {
    FunctionProps {
        region: request.region.to_string(),
        function_name: request.function_name.clone(),
        code: Some(code.to_string()),
        cpu: Some(request.cpu),
        memory_size: Some(request.memory_size),
        disk_size: Some(request.disk_size),
        instance_concurrency: Some(request.instance_concurrency),
        timeout: Some(request.timeout),
        custom_runtime_config: Some(strip_empty_args(request.custom_runtime_config.clone())),
        description: request.description.clone(),
        environment_variables: Some(environment_variables),
        internet_access: Some(request.internet_access),
        log_config: request.log_config.clone(),
        vpc_config: request.vpc_config.clone(),
        role: Some(
            request
                .role
                .clone()
                .filter(|role| !role.is_empty())
                .unwrap_or_else(|| default_role(account_id)),
        ),
        runtime: Some(request.runtime.to_string()),
        layers: Some(layers),
        tags: Some(request.tags.clone()),
        custom_domain: Some(CustomDomainBinding::default()),
        extra: Extra::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::defs::DeploymentDescriptor;
    use std::collections::HashSet;

    fn create_request() -> CreateFunctionRequest {
        serde_json::from_value(serde_json::json!({
            "location": "/tmp/project",
            "functionName": "my-func",
            "region": "cn-hangzhou",
            "cpu": 1,
            "memorySize": 2048,
            "customRuntimeConfig": { "command": ["python3"], "args": [], "port": 9000 },
            "diskSize": 512,
            "instanceConcurrency": 10
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_layers_appends_platform_layers() {
        let layers = normalize_layers(vec![String::from("acs:fc:cn-hangzhou:me:layers/x/versions/1")], "cn-hangzhou");

        assert_eq!(layers.len(), 4);
        assert_eq!(layers[0], "acs:fc:cn-hangzhou:me:layers/x/versions/1");
        assert_eq!(
            layers[1],
            "acs:fc:cn-hangzhou:official:layers/Python310/versions/3"
        );
        assert_eq!(
            layers[2],
            "acs:fc:cn-hangzhou:official:layers/Nodejs20/versions/3"
        );
        assert_eq!(layers[3], "acs:fc:cn-hangzhou:official:layers/Java21/versions/2");
    }

    #[test]
    fn test_normalize_layers_is_idempotent() {
        let user = vec![
            String::from("b"),
            String::from("a"),
            String::from("b"),
            String::from("acs:fc:cn-beijing:official:layers/Java21/versions/2"),
        ];

        let once = normalize_layers(user, "cn-beijing");
        let twice = normalize_layers(once.clone(), "cn-beijing");

        assert_eq!(once, twice);
        assert_eq!(once[..2], [String::from("b"), String::from("a")]);

        let set: HashSet<_> = once.iter().collect();
        assert_eq!(set.len(), once.len());
        for layer in platform_layers("cn-beijing") {
            assert!(once.contains(&layer));
        }
    }

    #[test]
    fn test_normalize_env_fills_missing_keys() {
        let env = normalize_env(None);

        assert_eq!(env["PATH"], DEFAULT_PATH);
        assert!(env["PATH"].starts_with("/opt/python3.10/bin:/opt/nodejs20/bin:/opt/java21/bin:"));
        assert_eq!(env["PYTHONPATH"], "/code/python");
        assert_eq!(env["JAVA_HOME"], "/opt/java21");
    }

    #[test]
    fn test_normalize_env_never_overwrites() {
        let user: BTreeMap<String, String> = [
            (String::from("PATH"), String::from("/bin")),
            (String::from("APP_MODE"), String::from("prod")),
        ]
        .into();

        let env = normalize_env(Some(user));

        assert_eq!(env["PATH"], "/bin");
        assert_eq!(env["APP_MODE"], "prod");
        assert_eq!(env["JAVA_HOME"], "/opt/java21");
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn test_build_strips_empty_args() {
        let request = create_request();
        let props = build(&request, "/tmp/project", "1234", vec![], BTreeMap::new());

        let config = props.custom_runtime_config.as_ref().unwrap();
        assert!(config.args.is_none());

        let yaml = DeploymentDescriptor::single(props).to_yaml_string().unwrap();
        assert!(!yaml.contains("args"));
    }

    #[test]
    fn test_build_defaults_role_and_binds_domain() {
        let request = create_request();
        let props = build(&request, "/tmp/project", "1234", vec![], BTreeMap::new());

        assert_eq!(
            props.role.as_deref(),
            Some("acs:ram::1234:role/aliyunfcdefaultrole")
        );

        let binding = props.custom_domain.unwrap();
        assert_eq!(binding.domain_name, "auto");
        assert_eq!(binding.protocol, "HTTP");
        assert_eq!(binding.route.path, "/*");
        assert_eq!(binding.route.qualifier, "LATEST");
    }

    #[test]
    fn test_build_keeps_explicit_role_and_defaults() {
        let mut request = create_request();
        request.role = Some(String::from("acs:ram::1234:role/custom"));
        let props = build(&request, "/tmp/code.zip", "1234", vec![], BTreeMap::new());

        assert_eq!(props.role.as_deref(), Some("acs:ram::1234:role/custom"));
        assert_eq!(props.code.as_deref(), Some("/tmp/code.zip"));
        assert_eq!(props.timeout, Some(3));
        assert_eq!(props.internet_access, Some(true));
        assert_eq!(props.runtime.as_deref(), Some("custom.debian10"));
        assert_eq!(props.tags, Some(vec![]));
    }
}
