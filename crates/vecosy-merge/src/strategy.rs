use crate::document::DocumentFormat;
use crate::error::{MergeError, MergeResult};

/// Name of the Spring file shared by every application.
pub const SPRING_SHARED_APPLICATION: &str = "application";

/// Decides which files make up an application's configuration and in
/// which order they are merged. Later paths override earlier ones.
pub trait MergeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn candidate_paths(&self, app: &str, profiles: &[String]) -> Vec<String>;
}

/// `config.{ext}` at the snapshot root, then `{profile}/config.{ext}` for
/// every non-empty profile in the order given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmartConfigStrategy {
    extension: String,
}

impl SmartConfigStrategy {
    pub fn new() -> Self {
        Self::with_extension("yml")
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for SmartConfigStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeStrategy for SmartConfigStrategy {
    fn name(&self) -> &'static str {
        "smart-config"
    }

    fn candidate_paths(&self, _app: &str, profiles: &[String]) -> Vec<String> {
        let ext = &self.extension;
        std::iter::once(format!("config.{ext}"))
            .chain(
                profiles
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| format!("{p}/config.{ext}")),
            )
            .collect()
    }
}

/// Spring Cloud Config naming.
///
/// Paths are `application.{ext}`, `{app}.{ext}`, then for every non-empty
/// profile `application-{profile}.{ext}` and `{app}-{profile}.{ext}`. With
/// `common_first` the list is merged in that order, so profile files win;
/// otherwise it is reversed, which is the "most specific first" order Spring
/// clients expect for property sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpringStrategy {
    common_first: bool,
    extension: String,
}

impl SpringStrategy {
    pub fn new(common_first: bool) -> Self {
        Self::with_extension(common_first, "yml")
    }

    pub fn with_extension(common_first: bool, extension: impl Into<String>) -> Self {
        Self {
            common_first,
            extension: extension.into(),
        }
    }

    pub fn common_first(&self) -> bool {
        self.common_first
    }
}

impl Default for SpringStrategy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MergeStrategy for SpringStrategy {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn candidate_paths(&self, app: &str, profiles: &[String]) -> Vec<String> {
        let ext = &self.extension;
        let mut paths = vec![
            format!("{SPRING_SHARED_APPLICATION}.{ext}"),
            format!("{app}.{ext}"),
        ];
        for profile in profiles.iter().filter(|p| !p.is_empty()) {
            paths.push(format!("{SPRING_SHARED_APPLICATION}-{profile}.{ext}"));
            paths.push(format!("{app}-{profile}.{ext}"));
        }
        if !self.common_first {
            paths.reverse();
        }
        paths
    }
}

/// A Spring-style file name: `<application>[-<profile>].<extension>`.
///
/// The profile is everything after the last `-`, so application names may
/// contain dashes (`my-app-dev.yml` is `my-app` with profile `dev`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpringFileName {
    pub application: String,
    pub profile: Option<String>,
    pub format: DocumentFormat,
}

impl SpringFileName {
    pub fn parse(name: &str) -> MergeResult<Self> {
        let (stem, ext) = name
            .rsplit_once('.')
            .ok_or_else(|| MergeError::UnsupportedFormat(name.to_string()))?;
        let format = DocumentFormat::from_extension(ext)
            .ok_or_else(|| MergeError::UnsupportedFormat(ext.to_string()))?;

        let (application, profile) = match stem.rsplit_once('-') {
            Some((app, profile)) if !app.is_empty() && !profile.is_empty() => {
                (app, Some(profile.to_string()))
            }
            _ => (stem, None),
        };
        if application.is_empty() || application.starts_with('-') || application.ends_with('-') {
            return Err(MergeError::InvalidFileName(name.to_string()));
        }

        Ok(Self {
            application: application.to_string(),
            profile,
            format,
        })
    }

    /// The profile as a list, for feeding a [`MergeStrategy`].
    pub fn profiles(&self) -> Vec<String> {
        self.profile.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn smart_config_paths() {
        let s = SmartConfigStrategy::new();
        assert_eq!(s.candidate_paths("app1", &[]), vec!["config.yml"]);
        assert_eq!(
            s.candidate_paths("app1", &profiles(&["dev", "", "eu"])),
            vec!["config.yml", "dev/config.yml", "eu/config.yml"]
        );
    }

    #[test]
    fn spring_paths_common_first() {
        let s = SpringStrategy::new(true);
        assert_eq!(
            s.candidate_paths("app1", &profiles(&["dev"])),
            vec!["application.yml", "app1.yml", "application-dev.yml", "app1-dev.yml"]
        );
    }

    #[test]
    fn spring_paths_most_specific_first() {
        let s = SpringStrategy::with_extension(false, "json");
        assert_eq!(
            s.candidate_paths("app1", &profiles(&["dev"])),
            vec!["app1-dev.json", "application-dev.json", "app1.json", "application.json"]
        );
    }

    #[test]
    fn parses_spring_file_names() {
        let f = SpringFileName::parse("app1-dev.yml").unwrap();
        assert_eq!(f.application, "app1");
        assert_eq!(f.profile.as_deref(), Some("dev"));
        assert_eq!(f.format, DocumentFormat::Yaml);

        let f = SpringFileName::parse("my-app-prod.json").unwrap();
        assert_eq!(f.application, "my-app");
        assert_eq!(f.profiles(), vec!["prod".to_string()]);

        let f = SpringFileName::parse("app1.yaml").unwrap();
        assert_eq!(f.application, "app1");
        assert_eq!(f.profile, None);
        assert!(f.profiles().is_empty());
    }

    #[test]
    fn rejects_bad_spring_file_names() {
        assert!(matches!(
            SpringFileName::parse("app1-dev.properties"),
            Err(MergeError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SpringFileName::parse("app1"),
            Err(MergeError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SpringFileName::parse(".yml"),
            Err(MergeError::InvalidFileName(_))
        ));
    }
}
