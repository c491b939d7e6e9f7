pub mod download;
pub mod versions;

/// Which version to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChoice {
    /// First entry of the service's version list
    Latest,
    /// A label as listed by the service, eg. `release-1.2.3`
    Label(String),
    /// A bare version id as used in URLs, eg. `1.2.3`
    Id(String),
}
