// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key/value text format used by the server, drive and resource APIs.
//!
//! Every line holds a key and a value separated by whitespace. A line with
//! only a key is kept with no value. Lists are objects separated by blank
//! lines.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::super::utils;

/// A single object in the key/value format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvObject {
    values: BTreeMap<String, Option<String>>,
}

/// Body of a key/value request.
///
/// Values are forced onto one line, an empty value clears the key on the
/// server side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvBody {
    lines: Vec<(String, String)>,
}

fn split_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.find(char::is_whitespace) {
        Some(pos) => {
            let value = line[pos..].trim();
            Some((&line[..pos], if value.is_empty() { None } else { Some(value) }))
        }
        None => Some((line, None)),
    }
}

/// Find the value of a key in a key/value body.
///
/// A line consisting only of the requested key yields the key itself.
pub fn seek_value<'b>(body: &'b str, key: &str) -> Option<&'b str> {
    body.lines()
        .filter_map(split_line)
        .find(|(k, _)| *k == key)
        .map(|(k, v)| v.unwrap_or(k))
}

impl KvObject {
    /// Create an empty object.
    pub fn new() -> KvObject {
        KvObject::default()
    }

    /// Parse a single object.
    pub fn parse<S: AsRef<str>>(body: S) -> KvObject {
        let mut result = KvObject::new();
        for (key, value) in body.as_ref().lines().filter_map(split_line) {
            let _ = result
                .values
                .insert(key.to_string(), value.map(ToString::to_string));
        }
        result
    }

    /// Parse a list of objects separated by blank lines.
    pub fn parse_list<S: AsRef<str>>(body: S) -> Vec<KvObject> {
        let mut result = Vec::new();
        let mut current = KvObject::new();
        for line in body.as_ref().lines() {
            match split_line(line) {
                Some((key, value)) => {
                    let _ = current
                        .values
                        .insert(key.to_string(), value.map(ToString::to_string));
                }
                None if !current.is_empty() => {
                    result.push(current);
                    current = KvObject::new();
                }
                None => {}
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
        result
    }

    /// Value of the key, `None` if the key is absent or has no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    /// Value of the key, ignoring empty values.
    ///
    /// Unlike `get` this also trims the value.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Parse the value of the key, returning `None` on absent or malformed values.
    pub fn parse_value<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get_non_empty(key).and_then(|v| v.parse().ok())
    }

    /// Whether the key is present, with or without a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Set a value.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let _ = self.values.insert(key.into(), Some(value.into()));
    }

    /// Whether the object has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KvObject {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> KvObject {
        let mut result = KvObject::new();
        for (key, value) in iter {
            result.insert(key, value);
        }
        result
    }
}

impl KvBody {
    /// Start an empty body.
    pub fn new() -> KvBody {
        KvBody::default()
    }

    /// Add a key with a value.
    pub fn push<K: Into<String>, V: AsRef<str>>(&mut self, key: K, value: V) {
        self.lines
            .push((utils::single_line(key.into()), utils::single_line(value)));
    }

    /// Add a key with a value (builder style).
    #[inline]
    pub fn with<K: Into<String>, V: AsRef<str>>(mut self, key: K, value: V) -> KvBody {
        self.push(key, value);
        self
    }

    /// Add a key with an empty value, clearing it.
    #[inline]
    pub fn with_cleared<K: Into<String>>(self, key: K) -> KvBody {
        self.with(key, "")
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for KvBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.lines {
            writeln!(f, "{} {}", key, value)?;
        }
        Ok(())
    }
}

impl From<KvBody> for String {
    fn from(value: KvBody) -> String {
        value.to_string()
    }
}
