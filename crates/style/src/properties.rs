//! Style declarations (`name: value; ...`) as an ordered property map.

use crate::compare::compare_property_names;
use crate::error::StyleError;
use indexmap::IndexMap;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_until},
    character::complete::{alpha1, char, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::{many0, many1},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::fmt;
use std::str::FromStr;

/// `-?(letters-?)+`: an optional vendor dash, then letter runs joined by
/// single dashes.
pub fn is_valid_property_name(name: &str) -> bool {
    let mut parser = all_consuming(recognize(pair(
        opt(char::<&str, nom::error::Error<&str>>('-')),
        many1(pair(alpha1, opt(char('-')))),
    )));
    parser.parse(name).is_ok()
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(delimited(char('"'), opt(take_until("\"")), char('"'))),
        recognize(delimited(char('\''), opt(take_until("'")), char('\''))),
    ))
    .parse(input)
}

fn value(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((quoted, is_not(";\"'"))))).parse(input)
}

fn property_name(input: &str) -> IResult<&str, &str> {
    is_not(":;").parse(input)
}

fn declaration(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(property_name, char(':'), value).parse(input)
}

fn declarations(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    many0(delimited(
        many0(terminated(multispace0, tag(";"))),
        delimited(multispace0, declaration, multispace0),
        opt(char(';')),
    ))
    .parse(input)
}

/// An insertion-ordered map of property names to values. Names are unique
/// and an empty value is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: IndexMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `style` attribute value. Declarations with invalid names or
    /// empty values are skipped; text that is not a declaration is an error.
    pub fn parse(style: &str) -> Result<Self, StyleError> {
        let (rest, parsed) =
            declarations(style).map_err(|e| StyleError::Parse(e.to_string()))?;
        if !rest.trim().trim_matches(';').trim().is_empty() {
            return Err(StyleError::Parse(format!(
                "Unexpected input in style declaration: '{}'",
                rest.trim()
            )));
        }
        let mut properties = Self::new();
        for (name, value) in parsed {
            let name = name.trim();
            if !is_valid_property_name(name) {
                log::debug!("Skipping style property with invalid name '{}'", name);
                continue;
            }
            let value = value.trim();
            if !value.is_empty() {
                properties.entries.insert(name.to_string(), value.to_string());
            }
        }
        Ok(properties)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Sets a property; an empty (or blank) value removes it.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), StyleError> {
        if !is_valid_property_name(name) {
            return Err(StyleError::InvalidPropertyName(name.to_string()));
        }
        let value = value.trim();
        if value.is_empty() {
            self.entries.shift_remove(name);
        } else {
            self.entries.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    /// Removes several properties. Every name is validated before anything
    /// is removed; a blank or invalid name fails the whole call.
    pub fn remove_many<'a, I>(&mut self, names: I) -> Result<usize, StyleError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = names.into_iter().collect();
        if let Some(invalid) = names.iter().find(|n| !is_valid_property_name(n)) {
            return Err(StyleError::InvalidPropertyName(invalid.to_string()));
        }
        Ok(names
            .into_iter()
            .filter(|name| self.entries.shift_remove(*name).is_some())
            .count())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries in property-name order.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self.iter().collect();
        entries.sort_by(|a, b| compare_property_names(a.0, b.0));
        entries
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", name, value)?;
        }
        Ok(())
    }
}

impl FromStr for Properties {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
