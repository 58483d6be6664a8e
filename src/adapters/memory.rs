// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory sectioned configuration store.
//!
//! This adapter plays the part of the configuration store around an
//! [`Interpolation`]: it owns raw values grouped into named sections plus a
//! `DEFAULT` section whose options are visible from every other section. Every
//! write is validated and every read is resolved; nothing is cached.

use indexmap::IndexMap;

use crate::domain::{ConfigError, ResolvedValue, Result, Scope};
use crate::ports::Interpolation;
use crate::service::FStringInterpolation;

/// Name of the section holding defaults.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A sectioned configuration held in memory.
///
/// Option names are case-insensitive and stored lowercased. Section names are
/// case-sensitive and keep insertion order.
///
/// # Examples
///
/// ```rust
/// use interpcfg::adapters::SectionedConfig;
///
/// # fn main() -> interpcfg::domain::Result<()> {
/// let mut config = SectionedConfig::default();
/// config.set("DEFAULT", "a", "3.1415926535897932384626433832795")?;
/// config.add_section("fstring")?;
/// config.set("fstring", "b", "two_{a}")?;
/// config.set("fstring", "c", "three_{b}")?;
///
/// let value = config.get("fstring", "c")?;
/// assert_eq!(value.as_str(), "three_two_3.1415926535897932384626433832795");
/// # Ok(())
/// # }
/// ```
pub struct SectionedConfig {
    interpolation: Box<dyn Interpolation>,
    defaults: Scope,
    sections: IndexMap<String, Scope>,
}

impl SectionedConfig {
    /// Creates an empty configuration that resolves values with `interpolation`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use interpcfg::adapters::{NoInterpolation, SectionedConfig};
    ///
    /// let config = SectionedConfig::new(NoInterpolation);
    /// assert_eq!(config.sections().count(), 0);
    /// ```
    pub fn new(interpolation: impl Interpolation + 'static) -> Self {
        Self {
            interpolation: Box::new(interpolation),
            defaults: Scope::new(),
            sections: IndexMap::new(),
        }
    }

    fn section(&self, name: &str) -> Option<&Scope> {
        self.sections.get(name)
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Scope> {
        self.sections.get_mut(name)
    }

    fn no_section(name: &str) -> ConfigError {
        ConfigError::NoSection {
            section: name.to_string(),
        }
    }

    /// Adds an empty section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSectionName`] for `DEFAULT` and
    /// [`ConfigError::DuplicateSection`] if the section already exists.
    pub fn add_section(&mut self, name: &str) -> Result<()> {
        if name == DEFAULT_SECTION {
            return Err(ConfigError::InvalidSectionName {
                section: name.to_string(),
            });
        }
        if self.has_section(name) {
            return Err(ConfigError::DuplicateSection {
                section: name.to_string(),
            });
        }
        tracing::trace!(section = name, "adding section");
        self.sections.insert(name.to_string(), Scope::new());
        Ok(())
    }

    /// Returns `true` if the section exists. The defaults section does not count.
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Section names in insertion order, excluding `DEFAULT`.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// The raw default values.
    pub fn defaults(&self) -> &Scope {
        &self.defaults
    }

    /// Stores a raw value after validating it.
    ///
    /// The value is checked by the interpolation first and is not stored if it is
    /// malformed. Writing to `DEFAULT` sets a default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a malformed value and
    /// [`ConfigError::NoSection`] if the section does not exist.
    pub fn set(&mut self, section: &str, option: &str, raw_value: &str) -> Result<()> {
        let option = option.to_lowercase();
        self.interpolation.validate(raw_value)?;

        let target = if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.section_mut(section)
                .ok_or_else(|| Self::no_section(section))?
        };
        tracing::trace!(section, option = %option, "storing raw value");
        target.insert(option, raw_value);
        Ok(())
    }

    /// The raw value of an option, looked up in the section and then in the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSection`] or [`ConfigError::NoOption`].
    pub fn get_raw(&self, section: &str, option: &str) -> Result<&str> {
        let option = option.to_lowercase();
        let own = if section == DEFAULT_SECTION {
            None
        } else {
            Some(self.section(section).ok_or_else(|| Self::no_section(section))?)
        };

        own.and_then(|scope| scope.get(&option))
            .or_else(|| self.defaults.get(&option))
            .ok_or_else(|| ConfigError::NoOption {
                section: section.to_string(),
                option,
            })
    }

    /// The names visible from a section: the defaults overlaid by the section's own options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSection`] if the section does not exist.
    pub fn scope(&self, section: &str) -> Result<Scope> {
        if section == DEFAULT_SECTION {
            return Ok(self.defaults.clone());
        }
        let own = self.section(section).ok_or_else(|| Self::no_section(section))?;
        Ok(Scope::layered(&self.defaults, own))
    }

    /// Reads and resolves an option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSection`] or [`ConfigError::NoOption`] if the raw
    /// value cannot be found, and [`ConfigError::Resolution`] if it cannot be
    /// resolved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use interpcfg::adapters::SectionedConfig;
    /// use interpcfg::domain::{ConfigError, ResolutionError};
    ///
    /// # fn main() -> interpcfg::domain::Result<()> {
    /// let mut config = SectionedConfig::default();
    /// config.add_section("shortfloat")?;
    /// config.set("shortfloat", "title", "{a} is {b}")?;
    /// config.set("shortfloat", "a", "1")?;
    ///
    /// let err = config.get("shortfloat", "title").unwrap_err();
    /// assert!(matches!(
    ///     err,
    ///     ConfigError::Resolution(ResolutionError::MissingReference { .. })
    /// ));
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(&self, section: &str, option: &str) -> Result<ResolvedValue> {
        let raw_value = self.get_raw(section, option)?;
        let scope = self.scope(section)?;
        let option = option.to_lowercase();
        Ok(self
            .interpolation
            .resolve(raw_value, section, &option, &scope)?)
    }

    /// Returns `true` if the option is visible from the section.
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.get_raw(section, option).is_ok()
    }

    /// Option names visible from a section: its own options first, then
    /// defaults it does not override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSection`] if the section does not exist.
    pub fn options(&self, section: &str) -> Result<Vec<&str>> {
        if section == DEFAULT_SECTION {
            return Ok(self.defaults.names().collect());
        }
        let own = self.section(section).ok_or_else(|| Self::no_section(section))?;
        Ok(own
            .names()
            .chain(self.defaults.names().filter(|name| !own.contains(name)))
            .collect())
    }

    /// Resolves every option visible from a section, in [`options`](Self::options) order.
    ///
    /// # Errors
    ///
    /// Fails on the first option that cannot be resolved.
    pub fn items(&self, section: &str) -> Result<Vec<(String, ResolvedValue)>> {
        self.options(section)?
            .into_iter()
            .map(|option| {
                self.get(section, option)
                    .map(|value| (option.to_string(), value))
            })
            .collect()
    }

    /// Removes an option from a section, or from the defaults for `DEFAULT`.
    ///
    /// Returns `true` if the option existed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSection`] if the section does not exist.
    pub fn remove_option(&mut self, section: &str, option: &str) -> Result<bool> {
        let option = option.to_lowercase();
        let target = if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.section_mut(section)
                .ok_or_else(|| Self::no_section(section))?
        };
        Ok(target.remove(&option).is_some())
    }

    /// Removes a section with all its options. Returns `true` if it existed.
    pub fn remove_section(&mut self, name: &str) -> bool {
        self.sections.shift_remove(name).is_some()
    }
}

impl Default for SectionedConfig {
    fn default() -> Self {
        Self::new(FStringInterpolation::default())
    }
}

impl std::fmt::Debug for SectionedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionedConfig")
            .field("defaults", &self.defaults)
            .field("sections", &self.sections)
            .finish_non_exhaustive()
    }
}
