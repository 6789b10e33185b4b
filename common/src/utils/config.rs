use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime configuration, built once at startup and handed to each
/// component by reference. No component reads the environment directly.
#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    /// Single file or directory scanned for `*.json`/`*.csv` inputs.
    pub data_path: String,
    /// Directory backing the persistent vector collection.
    #[serde(alias = "chroma_db_dir")]
    pub index_db_path: String,
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: u8,
    pub llm_model_name: String,
    #[serde(alias = "token_hh")]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_eda_report_path")]
    pub eda_report_path: String,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_embedding_dimensions() -> u32 {
    1536
}

fn default_embedding_backend() -> String {
    "openai".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_text_length() -> usize {
    10
}

fn default_retrieval_top_k() -> u8 {
    4
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_eda_report_path() -> String {
    "./eda_output.md".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
