/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

//! The 64-bit SteamIDs Steam hands out for individual accounts.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};
use serde::ser::{Serialize, Serializer};

/// A 64-bit SteamID of an individual account, e.g. `76561198282622073`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{_0}")]
pub struct SteamId(u64);

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ParseSteamIdError {
    #[display("SteamID must only contain ASCII digits")]
    NotDecimal,

    #[display("SteamID does not fit into 64 bits: {_0}")]
    Overflow(ParseIntError),

    #[display("SteamID `{value}` is outside the range of individual accounts")]
    OutOfRange {
        #[error(ignore)]
        value: u64,
    },
}

impl SteamId {
    /// The smallest valid SteamID.
    pub const MIN: u64 = 76561197960265729_u64;

    /// The largest valid SteamID.
    pub const MAX: u64 = 76561202255233023_u64;

    pub const fn from_u64(value: u64) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses the decimal representation Steam uses in claimed identifiers and API responses.
    pub fn parse(value: &str) -> Result<Self, ParseSteamIdError> {
        if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ParseSteamIdError::NotDecimal);
        }

        let value = value.parse::<u64>().map_err(ParseSteamIdError::Overflow)?;

        Self::from_u64(value).ok_or(ParseSteamIdError::OutOfRange { value })
    }
}

impl fmt::Debug for SteamId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, fmt)
    }
}

impl PartialEq<u64> for SteamId {
    fn eq(&self, rhs: &u64) -> bool {
        self.0 == *rhs
    }
}

impl FromStr for SteamId {
    type Err = ParseSteamIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for SteamId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format_args!("{}", self.0).serialize(serializer)
    }
}

/// Steam's API sends SteamIDs as strings, but we also accept plain integers.
impl<'de> Deserialize<'de> for SteamId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SteamIdVisitor;

        impl Visitor<'_> for SteamIdVisitor {
            type Value = SteamId;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt.write_str("a 64-bit SteamID")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                SteamId::from_u64(value)
                    .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
                    .and_then(|value| self.visit_u64(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                SteamId::parse(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(SteamIdVisitor)
    }
}
