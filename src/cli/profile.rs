//! YAML processing profiles.
//!
//! ```yaml
//! filters:
//!   - name: bgr
//!     params: ["window=5"]
//!   - name: bandpass
//!     params: ["freqmin=70", "freqmax=130"]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dzt::filter::pipeline::ActiveFilterSet;
use dzt::filter::spec::FilterSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub filters: Vec<ProfileFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFilter {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid profile {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Parses every entry into a [`FilterSpec`], in file order.
    pub fn to_filter_set(&self) -> Result<ActiveFilterSet> {
        let mut set = ActiveFilterSet::new();
        for entry in &self.filters {
            let spec = FilterSpec::from_params(&entry.name, entry.params.iter().map(String::as_str))?;
            if let Some(old) = set.insert(spec) {
                log::warn!("Profile lists {} more than once; replacing {old}", old.kind().alias());
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dzt::filter::spec::FilterKind;

    const PROFILE: &str = "\
filters:
  - name: bgr
    params: [\"window=5\"]
  - name: bandpass
    params: [\"freqmin=70\", \"freqmax=130\", \"zerophase=false\"]
  - name: fft
";

    #[test]
    fn parses_filters_in_order() -> Result<()> {
        let set = Profile::from_yaml(PROFILE)?.to_filter_set()?;
        let kinds: Vec<_> = set.iter().map(FilterSpec::kind).collect();
        assert_eq!(
            kinds,
            [
                FilterKind::BackgroundRemoval,
                FilterKind::TriangularBandpass,
                FilterKind::FrequencyTransform
            ]
        );
        assert_eq!(
            set.get(FilterKind::TriangularBandpass),
            Some(&FilterSpec::TriangularBandpass {
                freqmin: 70.0,
                freqmax: 130.0,
                zerophase: false
            })
        );
        Ok(())
    }

    #[test]
    fn repeated_kind_replaces_in_place() -> Result<()> {
        let text = "filters:\n  - {name: bgr, params: [window=3]}\n  - {name: fft}\n  - {name: bgr, params: [window=9]}\n";
        let set = Profile::from_yaml(text)?.to_filter_set()?;
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().next(),
            Some(&FilterSpec::BackgroundRemoval { window: 9 })
        );
        Ok(())
    }

    #[test]
    fn bad_parameter_is_an_error() -> Result<()> {
        let profile = Profile::from_yaml("filters:\n  - {name: bandpass, params: [freqmin=70]}\n")?;
        assert!(profile.to_filter_set().is_err());

        let profile = Profile::from_yaml("filters:\n  - {name: hilbert}\n")?;
        assert!(profile.to_filter_set().is_err());
        Ok(())
    }

    #[test]
    fn yaml_round_trip() -> Result<()> {
        let profile = Profile::from_yaml(PROFILE)?;
        assert_eq!(Profile::from_yaml(&serde_yaml_ng::to_string(&profile)?)?, profile);
        Ok(())
    }

    #[test]
    fn empty_profile_has_no_filters() -> Result<()> {
        assert!(Profile::from_yaml("{}")?.to_filter_set()?.is_empty());
        Ok(())
    }
}
