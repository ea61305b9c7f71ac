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

//! Various utilities.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

/// Define an enumeration with a fixed string representation on the wire.
macro_rules! protocol_enum {
    {$(#[$attr:meta])* enum $name:ident { $($(#[$iattr:meta])* $item:ident = $val:expr),+ }} => (
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$iattr])* $item),+,
        }

        impl $name {
            /// String representation used by the API.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$item => $val),+,
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> ::std::result::Result<$name, $crate::Error> {
                $(if s.eq_ignore_ascii_case($val) {
                    return Ok($name::$item);
                })+
                Err($crate::Error::new(
                    $crate::ErrorKind::InvalidResponse,
                    format!("Unexpected {} value {:?}", stringify!($name), s),
                ))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl ::serde::ser::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::ser::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<$name, D::Error>
            where
                D: ::serde::de::Deserializer<'de>,
            {
                let value: String = ::serde::de::Deserialize::deserialize(deserializer)?;
                value.parse().map_err(::serde::de::Error::custom)
            }
        }
    );
}

/// Generate a getter forwarding to a field of `self.inner`.
macro_rules! transparent_property {
    ($(#[$attr:meta])* $name:ident: ref $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> &$type {
            &self.inner.$name
        }
    );

    ($(#[$attr:meta])* $name:ident: $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> $type {
            self.inner.$name
        }
    );
}

/// Generate a setter and a builder-style method for a creation request.
macro_rules! creation_field {
    ($(#[$attr:meta])* $set_func:ident, $with_func:ident -> $name:ident: optional $type:ty) => (
        $(#[$attr])*
        pub fn $set_func<S: Into<$type>>(&mut self, value: S) {
            self.$name = Some(value.into());
        }

        $(#[$attr])*
        #[inline]
        pub fn $with_func<S: Into<$type>>(mut self, value: S) -> Self {
            self.$set_func(value);
            self
        }
    );

    ($(#[$attr:meta])* $set_func:ident, $with_func:ident -> $name:ident: $type:ty) => (
        $(#[$attr])*
        pub fn $set_func<S: Into<$type>>(&mut self, value: S) {
            self.$name = value.into();
        }

        $(#[$attr])*
        #[inline]
        pub fn $with_func<S: Into<$type>>(mut self, value: S) -> Self {
            self.$set_func(value);
            self
        }
    );
}

/// Check whether an address belongs to a private or loopback range.
///
/// Values that are not IPv4 addresses are never private.
pub fn is_private_address(address: &str) -> bool {
    let addr: Ipv4Addr = match address.trim().parse() {
        Ok(addr) => addr,
        Err(_) => return false,
    };

    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.0/8"]
        .iter()
        .filter_map(|net| net.parse::<Ipv4Net>().ok())
        .any(|net| net.contains(&addr))
}

/// Replace line breaks so that a value fits into one key/value line.
pub fn single_line<S: AsRef<str>>(value: S) -> String {
    value
        .as_ref()
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod test {
    use super::{is_private_address, single_line};

    protocol_enum! {
        #[doc = "Test enum."]
        enum Color {
            #[doc = "Red."]
            Red = "red",
            Green = "green"
        }
    }

    #[test]
    fn test_protocol_enum() {
        assert_eq!(Color::Red.as_str(), "red");
        assert_eq!("GREEN".parse::<Color>().unwrap(), Color::Green);
        assert!("blue".parse::<Color>().is_err());
        assert_eq!(serde_json::to_string(&Color::Green).unwrap(), "\"green\"");
        let red: Color = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(red, Color::Red);
    }

    #[test]
    fn test_private_addresses() {
        assert!(is_private_address("10.1.2.3"));
        assert!(is_private_address("192.168.0.10"));
        assert!(is_private_address("172.16.5.4"));
        assert!(is_private_address("172.31.255.1"));
        assert!(is_private_address("127.0.0.1"));
        assert!(!is_private_address("172.32.0.1"));
        assert!(!is_private_address("31.171.246.10"));
        assert!(!is_private_address("auto"));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("web\nserver"), "web server");
        assert_eq!(single_line("a\r\nb"), "a b");
        assert_eq!(single_line("plain"), "plain");
    }
}
