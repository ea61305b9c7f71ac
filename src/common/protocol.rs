// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Common JSON protocol bits.

#![allow(missing_docs)]

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating an empty one as missing.
pub fn empty_as_none<'de, D>(des: D) -> ::std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(des)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Pagination metadata of JSON listings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListMeta {
    #[serde(deserialize_with = "empty_as_none", default)]
    pub next: Option<String>,
}

impl ListMeta {
    /// Query string of the next page, if any.
    pub fn next_query(&self) -> Option<String> {
        self.next
            .as_ref()
            .and_then(|next| next.find('?').map(|pos| next[pos..].to_string()))
    }
}
