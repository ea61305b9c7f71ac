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

//! Types and traits shared between services.

use async_trait::async_trait;

use super::super::Result;

/// Trait representing something that can be refreshed.
#[async_trait]
pub trait Refresh {
    /// Refresh the resource representation.
    async fn refresh(&mut self) -> Result<()>;
}

protocol_enum! {
    #[doc = "CPU architecture of a server or an image."]
    enum Architecture {
        #[doc = "64-bit x86."]
        I64 = "x86_64",
        #[doc = "32-bit x86."]
        I32 = "i386"
    }
}

impl Architecture {
    /// Guess architecture from the `bits` value of a drive.
    pub fn from_bits(bits: Option<&str>) -> Architecture {
        match bits {
            Some(value) if value.contains("32") => Architecture::I32,
            _ => Architecture::I64,
        }
    }
}

impl Default for Architecture {
    fn default() -> Architecture {
        Architecture::I64
    }
}

protocol_enum! {
    #[doc = "Operating system of a server or an image."]
    enum Platform {
        #[doc = "Cannot be determined."]
        Unknown = "unknown",
        #[doc = "Some Unix-like system."]
        Unix = "unix",
        #[doc = "Ubuntu."]
        Ubuntu = "ubuntu",
        #[doc = "Debian."]
        Debian = "debian",
        #[doc = "CentOS."]
        CentOs = "centos",
        #[doc = "Red Hat Enterprise Linux."]
        RedHat = "rhel",
        #[doc = "Fedora."]
        Fedora = "fedora",
        #[doc = "SUSE."]
        Suse = "suse",
        #[doc = "CoreOS."]
        CoreOs = "coreos",
        #[doc = "FreeBSD."]
        FreeBsd = "freebsd",
        #[doc = "OpenBSD."]
        OpenBsd = "openbsd",
        #[doc = "Solaris."]
        Solaris = "solaris",
        #[doc = "Microsoft Windows."]
        Windows = "windows"
    }
}

const PLATFORM_HINTS: &[(&str, Platform)] = &[
    ("ubuntu", Platform::Ubuntu),
    ("debian", Platform::Debian),
    ("centos", Platform::CentOs),
    ("red hat", Platform::RedHat),
    ("redhat", Platform::RedHat),
    ("rhel", Platform::RedHat),
    ("fedora", Platform::Fedora),
    ("suse", Platform::Suse),
    ("coreos", Platform::CoreOs),
    ("freebsd", Platform::FreeBsd),
    ("openbsd", Platform::OpenBsd),
    ("solaris", Platform::Solaris),
    ("windows", Platform::Windows),
    ("win2", Platform::Windows),
    ("linux", Platform::Unix),
    ("unix", Platform::Unix),
    ("bsd", Platform::Unix),
];

impl Platform {
    /// Guess the platform from a free-form operating system description.
    pub fn guess<S: AsRef<str>>(value: S) -> Platform {
        let value = value.as_ref().to_lowercase();
        PLATFORM_HINTS
            .iter()
            .find(|(hint, _)| value.contains(hint))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Guess the platform using the operating system first and the name as
    /// a fallback.
    ///
    /// A generic Unix guess is refined by the name when possible.
    pub fn guess_with_fallback(os: Option<&str>, name: &str) -> Platform {
        match os.map(Platform::guess).unwrap_or(Platform::Unknown) {
            Platform::Unknown => Platform::guess(name),
            Platform::Unix => match Platform::guess(name) {
                Platform::Unknown | Platform::Windows => Platform::Unix,
                refined => refined,
            },
            other => other,
        }
    }

    /// Whether this is a Unix-like platform.
    pub fn is_unix(&self) -> bool {
        !matches!(self, Platform::Unknown | Platform::Windows)
    }

    /// Whether this is Windows.
    pub fn is_windows(&self) -> bool {
        *self == Platform::Windows
    }
}

impl Default for Platform {
    fn default() -> Platform {
        Platform::Unknown
    }
}

protocol_enum! {
    #[doc = "Whether an input is needed for an operation."]
    enum Requirement {
        #[doc = "Not used."]
        None = "none",
        #[doc = "May be provided."]
        Optional = "optional",
        #[doc = "Must be provided."]
        Required = "required"
    }
}

/// Constraints on resource names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConstraints {
    /// Minimum length.
    pub min_length: usize,
    /// Maximum length.
    pub max_length: usize,
    /// Whether only ASCII letters and digits are allowed.
    pub alphanumeric_only: bool,
}

impl NamingConstraints {
    /// Alphanumeric names of the given length range.
    pub const fn alphanumeric(min_length: usize, max_length: usize) -> NamingConstraints {
        NamingConstraints {
            min_length,
            max_length,
            alphanumeric_only: true,
        }
    }

    /// Any names of the given length range.
    pub const fn any(min_length: usize, max_length: usize) -> NamingConstraints {
        NamingConstraints {
            min_length,
            max_length,
            alphanumeric_only: false,
        }
    }

    /// Check whether a name satisfies the constraints.
    pub fn is_valid<S: AsRef<str>>(&self, name: S) -> bool {
        let name = name.as_ref();
        let len = name.chars().count();
        len >= self.min_length
            && len <= self.max_length
            && (!self.alphanumeric_only || name.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}
