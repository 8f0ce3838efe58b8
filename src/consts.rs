use const_format::concatcp;

pub const ACCESS_KEY_ID_ENV_VAR: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ACCESS_KEY_SECRET_ENV_VAR: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const SECURITY_TOKEN_ENV_VAR: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ACCOUNT_ID_ENV_VAR: &str = "ALIBABA_CLOUD_ACCOUNT_ID";
pub const ROLE_ARN_ENV_VAR: &str = "ALIBABA_CLOUD_ROLE_ARN";

pub const REMOTE_MODE_ENV_VAR: &str = "REMOTE_MODE";

pub const ENGINE_BIN_ENV_VAR: &str = "FC_MCP_ENGINE_BIN";
pub const ENGINE_DEFAULT_BIN: &str = "s";

pub const BASE_DOMAIN_ENV_VAR: &str = "FC_MCP_BASE_DOMAIN";
pub const DEFAULT_BASE_DOMAIN: &str = "devsapp.net";

pub const IDENTITY_DEFAULT_REGION: &str = "cn-hangzhou";

pub const FC_API_VERSION: &str = "2023-03-30";
pub const STS_API_VERSION: &str = "2015-04-01";

pub const ENGINE_EDITION: &str = "3.0.0";
pub const ENGINE_COMPONENT: &str = "fc3";
pub const ENGINE_APP_NAME: &str = "my-app";
pub const ENGINE_ACCESS_ALIAS: &str = "default_serverless_devs_key";
pub const DESCRIPTOR_FILE_NAME: &str = "s.yaml";

pub const DEFAULT_ROLE_NAME: &str = "aliyunfcdefaultrole";

pub const AUTO_DOMAIN_NAME: &str = "auto";
pub const AUTO_DOMAIN_PROTOCOL: &str = "HTTP";
pub const AUTO_DOMAIN_PATH: &str = "/*";
pub const LATEST_QUALIFIER: &str = "LATEST";

pub const PYTHON_LAYER: &str = "Python310/versions/3";
pub const NODEJS_LAYER: &str = "Nodejs20/versions/3";
pub const JAVA_LAYER: &str = "Java21/versions/2";

const PYTHON_PREFIX: &str = "/opt/python3.10";
const NODEJS_PREFIX: &str = "/opt/nodejs20";
pub const JAVA_HOME: &str = "/opt/java21";

pub const DEFAULT_PATH: &str = concatcp!(
    PYTHON_PREFIX,
    "/bin:",
    NODEJS_PREFIX,
    "/bin:",
    JAVA_HOME,
    "/bin:/usr/local/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin:/opt/bin"
);
pub const DEFAULT_PYTHONPATH: &str = "/code/python";

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SERVER_NAME: &str = "alibabacloud-fc-mcp-server";
pub const DISPLAY_NAME: &str = concatcp!(SERVER_NAME, " v", PKG_VERSION);
