//! Antenna model to center-frequency resolution.

/// Known GSSI antenna model codes and their center frequency in MHz.
const KNOWN_ANTENNAS: &[(&str, f64)] = &[
    ("3207", 100.0),
    ("3207AP", 100.0),
    ("5106", 200.0),
    ("5106A", 200.0),
    ("50270", 270.0),
    ("50270S", 270.0),
    ("D50300", 300.0),
    ("50300", 300.0),
    ("350", 350.0),
    ("350HS", 350.0),
    ("D400HS", 350.0),
    ("5103", 400.0),
    ("5103A", 400.0),
    ("50400", 400.0),
    ("50400S", 400.0),
    ("800", 800.0),
    ("D50800", 800.0),
    ("3101", 900.0),
    ("3101A", 900.0),
    ("3101D", 900.0),
    ("51600", 1600.0),
    ("51600S", 1600.0),
    ("SS MINI", 1600.0),
    ("62000", 2000.0),
    ("62000-003", 2000.0),
    ("62300", 2300.0),
    ("62300XT", 2300.0),
    ("52600", 2600.0),
    ("52600S", 2600.0),
];

/// Where an antenna frequency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencySource {
    Known,
    UserSupplied,
    Estimated,
}

impl FrequencySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencySource::Known => "known model",
            FrequencySource::UserSupplied => "user-supplied",
            FrequencySource::Estimated => "estimated from name",
        }
    }
}

pub fn lookup(name: &str) -> Option<f64> {
    let name = name.trim();
    KNOWN_ANTENNAS
        .iter()
        .find(|(model, _)| model.eq_ignore_ascii_case(name))
        .map(|&(_, freq)| freq)
}

/// Guesses a frequency from the digits in an antenna name.
///
/// Model codes usually embed the frequency after a one-digit family prefix
/// (`5`0400 -> 400 MHz, `6`2300 -> 2300 MHz); plain numbers in a sensible
/// range are taken as-is.
pub fn estimate(name: &str) -> Option<f64> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let plausible = |f: f64| (10.0..=10_000.0).contains(&f);

    let whole: f64 = digits.parse().ok()?;
    if digits.len() <= 4 && plausible(whole) {
        return Some(whole);
    }

    let tail: f64 = digits.get(1..)?.parse().ok()?;
    plausible(tail).then_some(tail)
}

/// Resolves the frequency for an antenna name.
///
/// A user-supplied value wins over estimation but not over a known model.
pub fn resolve(name: &str, user_mhz: Option<f64>) -> Option<(f64, FrequencySource)> {
    if let Some(freq) = lookup(name) {
        return Some((freq, FrequencySource::Known));
    }
    if let Some(freq) = user_mhz {
        return Some((freq, FrequencySource::UserSupplied));
    }
    estimate(name).map(|freq| (freq, FrequencySource::Estimated))
}
