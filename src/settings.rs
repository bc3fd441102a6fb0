use std::{collections::HashMap, fs, io, path::PathBuf, time::Duration};
use configparser::ini::Ini;
use thiserror::Error;
use crate::{dns::gandi, ip::ipify};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type Sections = HashMap<String, HashMap<String, Option<String>>>;

#[derive(Debug, Clone)]
pub struct GandiSettings {
    pub key: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct DnsSettings {
    pub domain: String,
    pub records: Vec<String>,
    pub ipv4: bool,
    pub ipv6: bool,
}

#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub ipv4_url: String,
    pub ipv6_url: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            ipv4_url: ipify::DEFAULT_IPV4_URL.to_owned(),
            ipv6_url: ipify::DEFAULT_IPV6_URL.to_owned(),
        }
    }
}

/// Validated configuration for a single run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gandi: GandiSettings,
    pub dns: DnsSettings,
    pub lookup: LookupSettings,
    pub timeout: Duration,
}

impl Settings {
    /// Reads the file at `path`, expanding `~` and environment variables.
    ///
    /// `key_override` takes the place of `[GANDI] key` when set.
    pub fn load(path: &str, key_override: Option<String>) -> Result<Self, SettingsError> {
        let path = PathBuf::from(shellexpand::full(path)?.as_ref());
        let contents = fs::read_to_string(&path)
            .map_err(|source| SettingsError::Read { path, source })?;

        Self::parse(&contents, key_override)
    }

    /// Parses an INI file. Indented lines continue the value above them.
    pub fn parse(contents: &str, key_override: Option<String>) -> Result<Self, SettingsError> {
        let mut ini = Ini::new_cs();
        ini.set_multiline(true);
        let sections = ini.read(contents.to_owned())
            .map_err(SettingsError::Parse)?;

        let credentials = section(&sections, "GANDI")?;
        let key = match key_override {
            Some(key) => key,
            None => required(credentials, "GANDI", "key")?,
        };
        let key = non_empty(key, "GANDI", "key")?;

        let target = section(&sections, "DNS")?;
        let domain = required(target, "DNS", "domain")?;
        let domain = non_empty(domain, "DNS", "domain")?;
        let records = required(target, "DNS", "records")?
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        let ipv4 = flag(&ini, "DNS", "ipv4")?;
        let ipv6 = flag(&ini, "DNS", "ipv6")?;
        if !ipv4 && !ipv6 {
            return Err(SettingsError::NoAddressFamily);
        }

        let mut lookup = LookupSettings::default();
        if let Some(url) = ini.get("LOOKUP", "ipv4_url") {
            lookup.ipv4_url = url;
        }
        if let Some(url) = ini.get("LOOKUP", "ipv6_url") {
            lookup.ipv6_url = url;
        }

        let timeout = match ini.get("HTTP", "timeout") {
            Some(timeout) => humantime::parse_duration(&timeout)?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            gandi: GandiSettings {
                key,
                api_url: ini.get("GANDI", "api_url")
                    .unwrap_or_else(|| gandi::DEFAULT_API_URL.to_owned()),
            },
            dns: DnsSettings { domain, records, ipv4, ipv6 },
            lookup,
            timeout,
        })
    }
}

fn section<'a>(
    sections: &'a Sections,
    name: &'static str,
) -> Result<&'a HashMap<String, Option<String>>, SettingsError> {
    sections.get(name).ok_or(SettingsError::MissingSection(name))
}

/// A key written without a value counts as present but empty.
fn required(
    section: &HashMap<String, Option<String>>,
    name: &'static str,
    field: &'static str,
) -> Result<String, SettingsError> {
    section.get(field)
        .map(|value| value.clone().unwrap_or_default())
        .ok_or(SettingsError::MissingField { section: name, field })
}

fn non_empty(value: String, section: &'static str, field: &'static str) -> Result<String, SettingsError> {
    let value = value.trim();
    if value.is_empty() {
        Err(SettingsError::EmptyField { section, field })
    } else {
        Ok(value.to_owned())
    }
}

/// Address families are on unless switched off.
fn flag(ini: &Ini, section: &'static str, field: &'static str) -> Result<bool, SettingsError> {
    ini.getboolcoerce(section, field)
        .map(|value| value.unwrap_or(true))
        .map_err(|message| SettingsError::InvalidValue { section, field, message })
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to expand configuration path: {0}")]
    Expand(#[from] shellexpand::LookupError<std::env::VarError>),
    #[error("unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration file: {0}")]
    Parse(String),
    #[error("invalid configuration file: please provide a [{0}] section")]
    MissingSection(&'static str),
    #[error("invalid configuration file: please provide a `{field}` parameter in [{section}]")]
    MissingField { section: &'static str, field: &'static str },
    #[error("invalid configuration file: `{field}` in [{section}] must not be empty")]
    EmptyField { section: &'static str, field: &'static str },
    #[error("invalid configuration file: `{field}` in [{section}]: {message}")]
    InvalidValue { section: &'static str, field: &'static str, message: String },
    #[error("invalid configuration file: at least one of `ipv4` and `ipv6` must be enabled in [DNS]")]
    NoAddressFamily,
    #[error("invalid timeout in [HTTP]: {0}")]
    Timeout(#[from] humantime::DurationError),
}
