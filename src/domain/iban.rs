//! IBAN
//!
//! Validated international bank account numbers (ISO 13616). An IBAN is
//! assigned once at account creation and never changes afterwards.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shortest/longest IBAN lengths across registered countries
const MIN_LEN: usize = 15;
const MAX_LEN: usize = 34;

/// Errors from parsing or generating an IBAN
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IbanError {
    #[error("IBAN has invalid length {0}")]
    InvalidLength(usize),

    #[error("IBAN contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("IBAN must start with a two-letter country code")]
    InvalidCountry,

    #[error("IBAN checksum verification failed")]
    ChecksumFailed,
}

/// A validated IBAN, stored normalized (uppercase, no separators).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iban(String);

impl Iban {
    /// Parse an IBAN, accepting space-separated input.
    ///
    /// # Errors
    /// Rejects wrong lengths, non-alphanumeric characters, a missing country
    /// prefix, and a failed mod-97 checksum.
    pub fn parse(input: &str) -> Result<Self, IbanError> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.len() < MIN_LEN || normalized.len() > MAX_LEN {
            return Err(IbanError::InvalidLength(normalized.len()));
        }
        if let Some(bad) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(IbanError::InvalidCharacter(bad));
        }
        let mut chars = normalized.chars();
        let country_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.next().is_some_and(|c| c.is_ascii_digit())
            && chars.next().is_some_and(|c| c.is_ascii_digit());
        if !country_ok {
            return Err(IbanError::InvalidCountry);
        }
        if mod97(&rearrange(&normalized)) != 1 {
            return Err(IbanError::ChecksumFailed);
        }

        Ok(Self(normalized))
    }

    /// Generate a fresh IBAN for the given country and bank code with a
    /// random 10-digit account number. Uniqueness against already-issued
    /// IBANs is the caller's responsibility.
    ///
    /// # Errors
    /// Rejects a country prefix that is not two letters, non-alphanumeric
    /// bank codes, and bank codes that would push the IBAN past the
    /// maximum length.
    pub fn generate<R: Rng>(country: &str, bank_code: &str, rng: &mut R) -> Result<Self, IbanError> {
        let country = country.to_ascii_uppercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(IbanError::InvalidCountry);
        }
        let bank_code = bank_code.to_ascii_uppercase();
        if let Some(bad) = bank_code.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(IbanError::InvalidCharacter(bad));
        }
        let len = 4 + bank_code.len() + 10;
        if len < MIN_LEN || len > MAX_LEN {
            return Err(IbanError::InvalidLength(len));
        }

        let account_number: String = (0..10).map(|_| rng.gen_range(0..10).to_string()).collect();
        let bban = format!("{bank_code}{account_number}");

        // Check digits make the rearranged number congruent to 1 mod 97
        let remainder = mod97(&format!("{bban}{country}00"));
        let check = 98 - remainder;

        Ok(Self(format!("{country}{check:02}{bban}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter country code prefix.
    pub fn country(&self) -> &str {
        &self.0[..2]
    }
}

/// Move the country code and check digits behind the BBAN (ISO 13616 step 1)
fn rearrange(iban: &str) -> String {
    format!("{}{}", &iban[4..], &iban[..4])
}

/// Mod-97 over the string with letters mapped to 10..35
fn mod97(s: &str) -> u32 {
    s.chars().fold(0u32, |acc, c| {
        // parse() guarantees alphanumeric ASCII
        let v = c.to_digit(36).unwrap_or(0);
        if v < 10 {
            (acc * 10 + v) % 97
        } else {
            (acc * 100 + v) % 97
        }
    })
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Iban {
    type Err = IbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Iban::parse(s)
    }
}

impl TryFrom<String> for Iban {
    type Error = IbanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Iban::parse(&value)
    }
}

impl From<Iban> for String {
    fn from(iban: Iban) -> Self {
        iban.0
    }
}
