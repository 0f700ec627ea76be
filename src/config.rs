/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub run: RunConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    Gemini,
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub backend: BackendType,
    pub model: String,
    pub api_url: String,      // resolved: backend default when left empty
    pub api_key_env: String,
    pub prompt_variant: usize,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub max_iterations: usize,
    pub confirm_every: usize,   // 0 disables the stop prompt
    pub max_service_retries: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_iterations: default_max_iterations(),
            confirm_every: default_confirm_every(),
            max_service_retries: default_max_service_retries(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    agent: TomlAgent,
    #[serde(default)]
    run: TomlRun,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlAgent {
    #[serde(default = "default_backend")]
    backend: BackendType,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default)]
    api_url: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_prompt_variant")]
    prompt_variant: usize,
    #[serde(default = "default_request_timeout")]
    request_timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRun {
    #[serde(default = "default_max_iterations")]
    max_iterations: usize,
    #[serde(default = "default_confirm_every")]
    confirm_every: usize,
    #[serde(default = "default_max_service_retries")]
    max_service_retries: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

const CONFIG_FILE: &str = "config.toml";
const DATA_SUBDIR: &str = ".local/share/fogdrone";
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

fn default_backend() -> BackendType { BackendType::Gemini }
fn default_model() -> String { "gemini-2.5-flash".into() }
fn default_api_key_env() -> String { "GEMINI_API_KEY".into() }
fn default_prompt_variant() -> usize { crate::agent::prompt::DEFAULT_VARIANT }
fn default_request_timeout() -> u64 { 60 }
fn default_max_iterations() -> usize { 1000 }
fn default_confirm_every() -> usize { 100 }
fn default_max_service_retries() -> usize { 3 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlAgent {
    fn default() -> Self {
        TomlAgent {
            backend: default_backend(),
            model: default_model(),
            api_url: String::new(),
            api_key_env: default_api_key_env(),
            prompt_variant: default_prompt_variant(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for TomlRun {
    fn default() -> Self {
        TomlRun {
            max_iterations: default_max_iterations(),
            confirm_every: default_confirm_every(),
            max_service_retries: default_max_service_retries(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/fogdrone`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_levels_dir(&toml_cfg.general.levels_dir, search_dirs);

        let agent = toml_cfg.agent;
        let api_url = match (agent.api_url.trim(), agent.backend) {
            ("", BackendType::Gemini) => GEMINI_API_URL.to_string(),
            ("", BackendType::OpenAi) => OPENAI_API_URL.to_string(),
            (url, _) => url.to_string(),
        };

        AppConfig {
            agent: AgentConfig {
                backend: agent.backend,
                model: agent.model,
                api_url,
                api_key_env: agent.api_key_env,
                prompt_variant: agent.prompt_variant,
                request_timeout_secs: agent.request_timeout_secs,
            },
            run: RunConfig {
                max_iterations: toml_cfg.run.max_iterations,
                confirm_every: toml_cfg.run.confirm_every,
                max_service_retries: toml_cfg.run.max_service_retries.max(1),
            },
            levels_dir,
        }
    }
}

/// Exe dir, CWD, then `~/.local/share/fogdrone` when it exists. No duplicates.
fn candidate_dirs() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    let data_home = std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(DATA_SUBDIR))
        .filter(|dir| dir.is_dir());

    let mut dirs: Vec<PathBuf> = Vec::with_capacity(3);
    for dir in [exe_dir, cwd, data_home].into_iter().flatten() {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// A relative levels dir is looked up in the candidate dirs, else taken
/// relative to the CWD.
fn resolve_levels_dir(levels_dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(levels_dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(path))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| path.to_path_buf())
}

/// First `config.toml` found wins; none found means defaults.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    let Some(path) = search_dirs.iter().map(|d| d.join(CONFIG_FILE)).find(|p| p.is_file()) else {
        return TomlConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!(path = %path.display(), "config file found");
            parse_toml(&text)
        }
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            TomlConfig::default()
        }
    }
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{CONFIG_FILE} parse error, using default settings: {e}");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> AppConfig {
        AppConfig::resolve(parse_toml(text), &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = resolve("");
        assert_eq!(cfg.agent.backend, BackendType::Gemini);
        assert_eq!(cfg.agent.model, "gemini-2.5-flash");
        assert_eq!(cfg.agent.api_url, GEMINI_API_URL);
        assert_eq!(cfg.agent.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.agent.prompt_variant, 3);
        assert_eq!(cfg.run, RunConfig::default());
        assert_eq!(cfg.run.max_iterations, 1000);
        assert_eq!(cfg.run.confirm_every, 100);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = resolve("[agent]\nbackend = \"openai\"\nmodel = \"gpt-4o-mini\"\n\n[run]\nconfirm_every = 0\n");
        assert_eq!(cfg.agent.backend, BackendType::OpenAi);
        assert_eq!(cfg.agent.model, "gpt-4o-mini");
        assert_eq!(cfg.agent.api_url, OPENAI_API_URL);
        assert_eq!(cfg.run.confirm_every, 0);
        assert_eq!(cfg.run.max_iterations, 1000);
    }

    #[test]
    fn explicit_api_url_wins() {
        let cfg = resolve("[agent]\nbackend = \"openai-compatible\"\napi_url = \"http://localhost:11434/v1\"\n");
        assert_eq!(cfg.agent.backend, BackendType::OpenAi);
        assert_eq!(cfg.agent.api_url, "http://localhost:11434/v1");
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let cfg = resolve("[run]\nmax_iterations = \"lots\"\n");
        assert_eq!(cfg.run.max_iterations, 1000);
    }

    #[test]
    fn zero_retries_still_allows_one_attempt() {
        let cfg = resolve("[run]\nmax_service_retries = 0\n");
        assert_eq!(cfg.run.max_service_retries, 1);
    }

    #[test]
    fn levels_dir_is_found_in_search_dirs() {
        let root = std::env::temp_dir().join(format!("fogdrone_cfg_{}", std::process::id()));
        std::fs::create_dir_all(root.join("maps")).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "[general]\nlevels_dir = \"maps\"\n").unwrap();

        let dirs = vec![PathBuf::from("/definitely/not/here"), root.clone()];
        let cfg = AppConfig::resolve(load_toml(&dirs), &dirs);
        assert_eq!(cfg.levels_dir, root.join("maps"));

        assert_eq!(resolve_levels_dir("/abs/levels", &dirs), PathBuf::from("/abs/levels"));
        assert_eq!(resolve_levels_dir("missing", &dirs), PathBuf::from("missing"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn no_config_file_gives_defaults() {
        let cfg = load_toml(&[PathBuf::from("/definitely/not/here")]);
        assert_eq!(cfg.run.max_iterations, 1000);
        assert_eq!(cfg.general.levels_dir, "levels");
    }
}
