use crate::error::{DatabaseError, DatabaseResult};
use bsc_source::{pkg_path_key, Diagnostic, Severity};
use fxhash::FxHashMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings that shape the diagnostic stream of a program.
///
/// ```toml
/// parallel_validation = false
///
/// [[diagnostic_filters]]
/// src = "source/generated/**"
/// codes = [1001]
///
/// [severity_overrides]
/// BS1023 = "error"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Diagnostics matching any filter are dropped.
    #[serde(default)]
    pub diagnostic_filters: Vec<DiagnosticFilter>,

    /// Severity per code. Written keyed by `"1023"` or `"BS1023"`; both
    /// spellings of one code must agree.
    #[serde(
        default,
        deserialize_with = "deserialize_overrides",
        serialize_with = "serialize_overrides"
    )]
    pub severity_overrides: FxHashMap<u32, Severity>,

    /// Validate file-disjoint scopes on several threads.
    #[serde(default = "default_parallel_validation")]
    pub parallel_validation: bool,
}

fn default_parallel_validation() -> bool {
    true
}

fn parse_code(key: &str) -> Option<u32> {
    let key = key.trim();
    let digits = key
        .strip_prefix("BS")
        .or_else(|| key.strip_prefix("bs"))
        .unwrap_or(key);
    digits.parse().ok()
}

fn deserialize_overrides<'de, D>(deserializer: D) -> Result<FxHashMap<u32, Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let written = BTreeMap::<String, Severity>::deserialize(deserializer)?;
    let mut overrides = FxHashMap::default();
    for (key, severity) in written {
        let code = parse_code(&key)
            .ok_or_else(|| de::Error::custom(format!("invalid diagnostic code '{}' in severity_overrides", key)))?;
        match overrides.insert(code, severity) {
            Some(previous) if previous != severity => {
                return Err(de::Error::custom(format!(
                    "conflicting severity overrides for code {}: {} and {}",
                    code, previous, severity
                )));
            }
            _ => {}
        }
    }
    Ok(overrides)
}

fn serialize_overrides<S>(overrides: &FxHashMap<u32, Severity>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let written: BTreeMap<String, Severity> = overrides
        .iter()
        .map(|(code, severity)| (format!("BS{}", code), *severity))
        .collect();
    written.serialize(serializer)
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            diagnostic_filters: Vec::new(),
            severity_overrides: FxHashMap::default(),
            parallel_validation: default_parallel_validation(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticFilter {
    /// Package path, or a prefix ending in `*`. Matches every file when absent.
    #[serde(default)]
    pub src: Option<String>,

    /// Matches every code when empty.
    #[serde(default)]
    pub codes: Vec<u32>,
}

impl DiagnosticFilter {
    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        let code_matches = self.codes.is_empty() || self.codes.contains(&diagnostic.code);
        code_matches && self.src.as_deref().map_or(true, |src| src_matches(src, &diagnostic.file))
    }
}

fn src_matches(pattern: &str, file: &str) -> bool {
    let pattern = pkg_path_key(pattern);
    let file = pkg_path_key(file);
    match pattern.strip_suffix('*') {
        Some(prefix) => file.starts_with(prefix.trim_end_matches('*')),
        None => file == pattern,
    }
}

impl ProgramConfig {
    pub fn from_toml_str(text: &str) -> DatabaseResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatabaseError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading program config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn severity_override(&self, code: u32) -> Option<Severity> {
        self.severity_overrides.get(&code).copied()
    }

    /// Drop filtered diagnostics and apply severity overrides.
    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|diagnostic| !self.diagnostic_filters.iter().any(|filter| filter.matches(diagnostic)))
            .map(|mut diagnostic| {
                if let Some(severity) = self.severity_override(diagnostic.code) {
                    diagnostic.severity = severity;
                }
                diagnostic
            })
            .collect()
    }
}
