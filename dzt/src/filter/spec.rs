//! Filter names and typed parameters.
//!
//! A filter is written as `name` or `name:key=value,key=value`, for example
//! `bgr:window=5` or `bandpass:freqmin=70,freqmax=130`. Names match either
//! the short alias or the full display name, ignoring case.

use std::fmt::Display;
use std::str::FromStr;

use crate::utils::errors::ParamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    BackgroundRemoval,
    TriangularBandpass,
    FrequencyTransform,
    Wavelet,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::BackgroundRemoval,
        FilterKind::TriangularBandpass,
        FilterKind::FrequencyTransform,
        FilterKind::Wavelet,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            FilterKind::BackgroundRemoval => "Horizontal background removal",
            FilterKind::TriangularBandpass => "Vertical triangular FIR bandpass",
            FilterKind::FrequencyTransform => "Fast Fourier Transform",
            FilterKind::Wavelet => "Wavelets",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            FilterKind::BackgroundRemoval => "bgr",
            FilterKind::TriangularBandpass => "bandpass",
            FilterKind::FrequencyTransform => "fft",
            FilterKind::Wavelet => "wavelet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FilterKind::BackgroundRemoval => {
                "Subtracts row averages over the full width, or over a moving window of traces \
                 (window=N, 0 for full width only)"
            }
            FilterKind::TriangularBandpass => {
                "25-tap triangular FIR bandpass down each trace \
                 (freqmin=MHz, freqmax=MHz, zerophase=true|false)"
            }
            FilterKind::FrequencyTransform => {
                "Real part of the 2-D Fourier transform; must be the last filter"
            }
            FilterKind::Wavelet => {
                "Single-level wavelet decomposition, reported without changing the data \
                 (family=haar|db1-db4|sym2|sym3|mexh|morl)"
            }
        }
    }

    pub fn params(&self) -> &'static [&'static str] {
        match self {
            FilterKind::BackgroundRemoval => &["window"],
            FilterKind::TriangularBandpass => &["freqmin", "freqmax", "zerophase"],
            FilterKind::FrequencyTransform => &[],
            FilterKind::Wavelet => &["family"],
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ParamError> {
        let name = name.trim();
        FilterKind::ALL
            .into_iter()
            .find(|kind| {
                kind.alias().eq_ignore_ascii_case(name)
                    || kind.display_name().eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| ParamError::UnknownFilter(name.to_string()))
    }
}

impl Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    BackgroundRemoval {
        window: usize,
    },
    /// Cutoffs in MHz.
    TriangularBandpass {
        freqmin: f64,
        freqmax: f64,
        zerophase: bool,
    },
    FrequencyTransform,
    Wavelet {
        family: String,
    },
}

impl FilterSpec {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSpec::BackgroundRemoval { .. } => FilterKind::BackgroundRemoval,
            FilterSpec::TriangularBandpass { .. } => FilterKind::TriangularBandpass,
            FilterSpec::FrequencyTransform => FilterKind::FrequencyTransform,
            FilterSpec::Wavelet { .. } => FilterKind::Wavelet,
        }
    }

    /// Builds a spec from a filter name and `key=value` parameter strings.
    pub fn from_params<'a, I>(name: &str, params: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let kind = FilterKind::from_name(name)?;
        let mut values = Params::new(kind);

        for text in params {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let Some((key, value)) = text.split_once('=') else {
                return Err(ParamError::Malformed {
                    filter: kind.alias().to_string(),
                    text: text.to_string(),
                });
            };
            values.insert(key.trim(), value.trim())?;
        }

        let spec = match kind {
            FilterKind::BackgroundRemoval => FilterSpec::BackgroundRemoval {
                window: values.count("window")?.unwrap_or(0),
            },
            FilterKind::TriangularBandpass => FilterSpec::TriangularBandpass {
                freqmin: values.required_number("freqmin")?,
                freqmax: values.required_number("freqmax")?,
                zerophase: values.boolean("zerophase")?.unwrap_or(true),
            },
            FilterKind::FrequencyTransform => FilterSpec::FrequencyTransform,
            FilterKind::Wavelet => FilterSpec::Wavelet {
                family: values.required_text("family")?.to_string(),
            },
        };

        Ok(spec)
    }
}

impl FromStr for FilterSpec {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, params)) => FilterSpec::from_params(name, params.split(',')),
            None => FilterSpec::from_params(s, []),
        }
    }
}

impl Display for FilterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterSpec::BackgroundRemoval { window } => write!(f, "bgr:window={window}"),
            FilterSpec::TriangularBandpass {
                freqmin,
                freqmax,
                zerophase,
            } => write!(
                f,
                "bandpass:freqmin={freqmin},freqmax={freqmax},zerophase={zerophase}"
            ),
            FilterSpec::FrequencyTransform => write!(f, "fft"),
            FilterSpec::Wavelet { family } => write!(f, "wavelet:family={family}"),
        }
    }
}

/// Collected `key=value` pairs for one filter.
struct Params<'a> {
    kind: FilterKind,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Params<'a> {
    fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            pairs: Vec::new(),
        }
    }

    fn insert(&mut self, key: &'a str, value: &'a str) -> Result<(), ParamError> {
        let Some(&known) = self
            .kind
            .params()
            .iter()
            .find(|p| p.eq_ignore_ascii_case(key))
        else {
            return Err(ParamError::Unknown {
                filter: self.kind.alias().to_string(),
                param: key.to_string(),
            });
        };

        // later values win
        self.pairs.retain(|(k, _)| *k != known);
        self.pairs.push((known, value));
        Ok(())
    }

    fn get(&self, param: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == param)
            .map(|&(_, v)| v)
    }

    fn error_parts(&self, param: &str) -> (String, String) {
        (self.kind.alias().to_string(), param.to_string())
    }

    fn number(&self, param: &str) -> Result<Option<f64>, ParamError> {
        let Some(value) = self.get(param) else {
            return Ok(None);
        };
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => {
                let (filter, param) = self.error_parts(param);
                Err(ParamError::NotNumeric {
                    filter,
                    param,
                    value: value.to_string(),
                })
            }
        }
    }

    fn required_number(&self, param: &str) -> Result<f64, ParamError> {
        self.number(param)?.ok_or_else(|| {
            let (filter, param) = self.error_parts(param);
            ParamError::Missing { filter, param }
        })
    }

    /// A non-negative number, truncated to an integer.
    fn count(&self, param: &str) -> Result<Option<usize>, ParamError> {
        match self.number(param)? {
            Some(v) if v < 0.0 => {
                let value = self.get(param).unwrap_or_default().to_string();
                let (filter, param) = self.error_parts(param);
                Err(ParamError::Negative {
                    filter,
                    param,
                    value,
                })
            }
            Some(v) => Ok(Some(v as usize)),
            None => Ok(None),
        }
    }

    fn boolean(&self, param: &str) -> Result<Option<bool>, ParamError> {
        let Some(value) = self.get(param) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => {
                let (filter, param) = self.error_parts(param);
                Err(ParamError::NotBoolean {
                    filter,
                    param,
                    value: value.to_string(),
                })
            }
        }
    }

    fn required_text(&self, param: &str) -> Result<&'a str, ParamError> {
        match self.get(param) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => {
                let (filter, param) = self.error_parts(param);
                Err(ParamError::Missing { filter, param })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_filter() -> Result<(), ParamError> {
        assert_eq!(
            "bgr:window=5".parse::<FilterSpec>()?,
            FilterSpec::BackgroundRemoval { window: 5 }
        );
        assert_eq!(
            "bgr".parse::<FilterSpec>()?,
            FilterSpec::BackgroundRemoval { window: 0 }
        );
        assert_eq!(
            "bandpass:freqmin=70, freqmax=130".parse::<FilterSpec>()?,
            FilterSpec::TriangularBandpass {
                freqmin: 70.0,
                freqmax: 130.0,
                zerophase: true,
            }
        );
        assert_eq!(
            "Vertical triangular FIR bandpass:freqmin=70,freqmax=130,zerophase=false"
                .parse::<FilterSpec>()?,
            FilterSpec::TriangularBandpass {
                freqmin: 70.0,
                freqmax: 130.0,
                zerophase: false,
            }
        );
        assert_eq!("FFT".parse::<FilterSpec>()?, FilterSpec::FrequencyTransform);
        assert_eq!(
            "wavelet:family=db2".parse::<FilterSpec>()?,
            FilterSpec::Wavelet {
                family: "db2".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn window_accepts_decimal_text() -> Result<(), ParamError> {
        assert_eq!(
            "bgr:window=7.0".parse::<FilterSpec>()?,
            FilterSpec::BackgroundRemoval { window: 7 }
        );
        Ok(())
    }

    #[test]
    fn display_parses_back() -> Result<(), ParamError> {
        for text in ["bgr:window=3", "bandpass:freqmin=70.5,freqmax=130", "fft"] {
            let spec: FilterSpec = text.parse()?;
            assert_eq!(spec.to_string().parse::<FilterSpec>()?, spec);
        }
        Ok(())
    }

    #[test]
    fn reports_bad_parameters() {
        assert_eq!(
            "sharpen".parse::<FilterSpec>(),
            Err(ParamError::UnknownFilter("sharpen".to_string()))
        );
        assert_eq!(
            "bandpass:freqmin=70".parse::<FilterSpec>(),
            Err(ParamError::Missing {
                filter: "bandpass".to_string(),
                param: "freqmax".to_string(),
            })
        );
        assert_eq!(
            "bandpass:freqmin=abc,freqmax=1".parse::<FilterSpec>(),
            Err(ParamError::NotNumeric {
                filter: "bandpass".to_string(),
                param: "freqmin".to_string(),
                value: "abc".to_string(),
            })
        );
        assert!(matches!(
            "bgr:window=-2".parse::<FilterSpec>(),
            Err(ParamError::Negative { .. })
        ));
        assert!(matches!(
            "bgr:size=3".parse::<FilterSpec>(),
            Err(ParamError::Unknown { .. })
        ));
        assert!(matches!(
            "bgr:3".parse::<FilterSpec>(),
            Err(ParamError::Malformed { .. })
        ));
        assert!(matches!(
            "bandpass:freqmin=1,freqmax=2,zerophase=maybe".parse::<FilterSpec>(),
            Err(ParamError::NotBoolean { .. })
        ));
        assert!(matches!(
            "wavelet".parse::<FilterSpec>(),
            Err(ParamError::Missing { .. })
        ));
    }

    #[test]
    fn kind_names() -> Result<(), ParamError> {
        for kind in FilterKind::ALL {
            assert_eq!(FilterKind::from_name(kind.alias())?, kind);
            assert_eq!(FilterKind::from_name(kind.display_name())?, kind);
        }
        Ok(())
    }
}
