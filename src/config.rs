use derive_builder::Builder;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Error;

/// Settings for signing, verifying and armoring cleartext messages.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct Config {
    /// Hash algorithm used for new signatures, and named in the `Hash` header of unsigned
    /// messages.
    #[builder(default = "HashAlgorithm::Sha256")]
    pub prefer_hash_algorithm: HashAlgorithm,
    /// Accept signatures made by keys that have expired since.
    #[builder(default = "true")]
    pub verify_expired_keys: bool,

    #[builder(default = "true")]
    pub show_version: bool,
    #[builder(default = "default_version_string()", setter(into))]
    pub version_string: String,
    #[builder(default)]
    pub show_comment: bool,
    #[builder(default, setter(into))]
    pub comment_string: String,
}

fn default_version_string() -> String {
    format!("pgp-cleartext {}", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefer_hash_algorithm: HashAlgorithm::Sha256,
            verify_expired_keys: true,
            show_version: true,
            version_string: default_version_string(),
            show_comment: false,
            comment_string: String::new(),
        }
    }
}

impl Config {
    /// The `Version` and `Comment` armor headers this configuration asks for.
    pub fn armor_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if self.show_version {
            headers.push(("Version".to_string(), self.version_string.clone()));
        }
        if self.show_comment {
            headers.push(("Comment".to_string(), self.comment_string.clone()));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let built = ConfigBuilder::default().build().unwrap();
        assert_eq!(built, Config::default());
        assert_eq!(built.prefer_hash_algorithm, HashAlgorithm::Sha256);
        assert!(built.verify_expired_keys);
        assert!(built.version_string.starts_with("pgp-cleartext "));
    }

    #[test]
    fn test_armor_headers() {
        let config = ConfigBuilder::default()
            .show_version(false)
            .show_comment(true)
            .comment_string("hello")
            .build()
            .unwrap();
        assert_eq!(
            config.armor_headers(),
            vec![("Comment".to_string(), "hello".to_string())]
        );

        let headers = Config::default().armor_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "Version");
    }
}
