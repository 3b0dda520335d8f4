// Language to runtime-version table for the sandbox
//
// The sandbox needs an explicit version next to the language identifier.
// Unknown languages resolve to an empty version and are left to the sandbox
// to accept or reject.

/// Supported languages and the runtime version pinned for each
pub const LANGUAGE_VERSIONS: &[(&str, &str)] = &[
    ("python", "3.10.0"),
    ("javascript", "18.15.0"),
    ("java", "17.0.6"),
    ("c", "10.2.0"),
    ("cpp", "10.2.0"),
    ("go", "1.20.2"),
    ("ruby", "3.2.2"),
    ("rust", "1.68.2"),
    ("php", "8.2.4"),
];

pub const DEFAULT_LANGUAGE: &str = "python";

/// Runtime version for a language identifier, `""` when unknown
pub fn resolve_version(language: &str) -> &'static str {
    LANGUAGE_VERSIONS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, version)| *version)
        .unwrap_or("")
}

pub fn is_known(language: &str) -> bool {
    LANGUAGE_VERSIONS.iter().any(|(name, _)| *name == language)
}

pub fn supported_languages() -> Vec<&'static str> {
    LANGUAGE_VERSIONS.iter().map(|(name, _)| *name).collect()
}
