use std::time::Duration;

/// Default per-request timeout of an [`HttpClient`](crate::HttpClient)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Platform used when `APP_PLATFORM` is not set
pub const DEFAULT_PLATFORM: &str = "PAC";

/// System code used when `APP_SYSTEM_CODE` is not set
pub const DEFAULT_SYSTEM_CODE: &str = "Unknown";

/// Environment variable holding the platform name
pub const PLATFORM_ENV: &str = "APP_PLATFORM";

/// Environment variable holding the system code
pub const SYSTEM_CODE_ENV: &str = "APP_SYSTEM_CODE";

/// Platform and system code identifying the calling service in the standard User-Agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysInfo {
    pub platform: String,
    pub system_code: String,
}

impl SysInfo {
    #[must_use]
    pub fn new(platform: impl Into<String>, system_code: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            system_code: system_code.into(),
        }
    }

    /// Resolve from `APP_PLATFORM` / `APP_SYSTEM_CODE`, falling back to the defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve through an arbitrary variable lookup.
    ///
    /// A variable that is present but empty is used as-is.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            platform: lookup(PLATFORM_ENV).unwrap_or_else(|| DEFAULT_PLATFORM.to_owned()),
            system_code: lookup(SYSTEM_CODE_ENV).unwrap_or_else(|| DEFAULT_SYSTEM_CODE.to_owned()),
        }
    }
}

impl Default for SysInfo {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM, DEFAULT_SYSTEM_CODE)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sys_info_defaults_when_unset() {
        let info = SysInfo::from_lookup(|_| None);
        assert_eq!(info, SysInfo::new("PAC", "Unknown"));
        assert_eq!(info, SysInfo::default());
    }

    #[test]
    fn test_sys_info_from_lookup() {
        let vars = HashMap::from([
            (PLATFORM_ENV, "UPP".to_owned()),
            (SYSTEM_CODE_ENV, "content-api".to_owned()),
        ]);
        let info = SysInfo::from_lookup(|key| vars.get(key).cloned());
        assert_eq!(info.platform, "UPP");
        assert_eq!(info.system_code, "content-api");
    }

    #[test]
    fn test_sys_info_present_but_empty_is_kept() {
        let info = SysInfo::from_lookup(|key| (key == SYSTEM_CODE_ENV).then(String::new));
        assert_eq!(info.platform, "PAC");
        assert_eq!(info.system_code, "");
    }
}
