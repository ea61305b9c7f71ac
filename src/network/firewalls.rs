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

//! Firewall policies and their rules.

use std::fmt::{self, Display, Formatter};

use futures::stream::{Stream, TryStreamExt};

use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::{api, protocol};

protocol_enum! {
    #[doc = "Whether a rule accepts or drops traffic."]
    enum Permission {
        #[doc = "Accept matching traffic."]
        Allow = "accept",
        #[doc = "Drop matching traffic."]
        Deny = "drop"
    }
}

protocol_enum! {
    #[doc = "Traffic direction."]
    enum Direction {
        #[doc = "Incoming traffic."]
        Ingress = "in",
        #[doc = "Outgoing traffic."]
        Egress = "out"
    }
}

protocol_enum! {
    #[doc = "IP protocol of a rule."]
    enum Protocol {
        #[doc = "TCP."]
        Tcp = "tcp",
        #[doc = "UDP."]
        Udp = "udp"
    }
}

/// Source or destination of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleTarget {
    /// Everything the policy applies to (identified by the policy ID).
    Global(String),
    /// An address range.
    Cidr(String),
}

/// A single firewall rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    /// ID of the policy holding the rule.
    pub firewall_id: String,
    /// Where the traffic comes from.
    pub source: RuleTarget,
    /// Traffic direction.
    pub direction: Option<Direction>,
    /// IP protocol, any when missing.
    pub protocol: Option<Protocol>,
    /// Accept or drop.
    pub permission: Option<Permission>,
    /// Where the traffic goes to.
    pub destination: RuleTarget,
    /// Destination port range, any when missing.
    pub ports: Option<(u16, u16)>,
}

/// Structure representing a single firewall policy.
#[derive(Clone, Debug)]
pub struct Firewall {
    session: Session,
    inner: protocol::FirewallPolicy,
    region_id: String,
}

impl Display for RuleTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RuleTarget::Global(id) => write!(f, "global:{}", id),
            RuleTarget::Cidr(cidr) => write!(f, "cidr:{}", cidr),
        }
    }
}

impl RuleTarget {
    fn from_protocol(value: Option<&str>, firewall_id: &str) -> RuleTarget {
        match value {
            Some(cidr) => RuleTarget::Cidr(cidr.to_string()),
            None => RuleTarget::Global(firewall_id.to_string()),
        }
    }

    fn to_protocol(&self) -> Option<String> {
        match self {
            RuleTarget::Global(..) => None,
            RuleTarget::Cidr(cidr) => Some(cidr.clone()),
        }
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value.trim().parse().map_err(|_| {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Invalid port {:?} in a firewall rule", value),
        )
    })
}

fn parse_ports(value: &str) -> Result<(u16, u16)> {
    match value.split_once(':') {
        Some((start, end)) => Ok((parse_port(start)?, parse_port(end)?)),
        None => {
            let port = parse_port(value)?;
            Ok((port, port))
        }
    }
}

fn name_or_any<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "any".to_string())
}

impl FirewallRule {
    /// Create a rule for the policy between global targets.
    pub fn new<S: Into<String>>(
        firewall_id: S,
        direction: Direction,
        permission: Permission,
        protocol: Protocol,
    ) -> FirewallRule {
        let firewall_id = firewall_id.into();
        FirewallRule {
            source: RuleTarget::Global(firewall_id.clone()),
            destination: RuleTarget::Global(firewall_id.clone()),
            firewall_id,
            direction: Some(direction),
            protocol: Some(protocol),
            permission: Some(permission),
            ports: None,
        }
    }

    /// Set the source address range.
    pub fn with_source<S: Into<String>>(mut self, cidr: S) -> FirewallRule {
        self.source = RuleTarget::Cidr(cidr.into());
        self
    }

    /// Set the destination address range.
    pub fn with_destination<S: Into<String>>(mut self, cidr: S) -> FirewallRule {
        self.destination = RuleTarget::Cidr(cidr.into());
        self
    }

    /// Set the destination port range.
    pub fn with_ports(mut self, start: u16, end: u16) -> FirewallRule {
        self.ports = Some((start, end));
        self
    }

    /// Deterministic rule ID built from all rule components.
    pub fn id(&self) -> String {
        let (start, end) = match self.ports {
            Some((start, end)) => (start.to_string(), end.to_string()),
            None => ("any".to_string(), "any".to_string()),
        };
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.firewall_id,
            self.source,
            name_or_any(self.direction),
            name_or_any(self.protocol),
            name_or_any(self.permission),
            self.destination,
            start,
            end
        )
    }

    pub(crate) fn from_protocol(rule: &protocol::Rule, firewall_id: &str) -> Result<FirewallRule> {
        Ok(FirewallRule {
            firewall_id: firewall_id.to_string(),
            source: RuleTarget::from_protocol(rule.src_ip.as_deref(), firewall_id),
            direction: rule
                .direction
                .as_deref()
                .map(|d| if d.eq_ignore_ascii_case("in") {
                    Direction::Ingress
                } else {
                    Direction::Egress
                }),
            protocol: rule.ip_proto.as_deref().and_then(|p| p.parse().ok()),
            permission: rule.action.as_deref().and_then(|a| a.parse().ok()),
            destination: RuleTarget::from_protocol(rule.dst_ip.as_deref(), firewall_id),
            ports: rule.dst_port.as_deref().map(parse_ports).transpose()?,
        })
    }

    pub(crate) fn to_protocol(&self) -> protocol::Rule {
        protocol::Rule {
            action: self.permission.map(String::from),
            direction: self.direction.map(String::from),
            ip_proto: self.protocol.map(String::from),
            src_ip: self.source.to_protocol(),
            dst_ip: self.destination.to_protocol(),
            dst_port: self.ports.map(|(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}:{}", start, end)
                }
            }),
            ..Default::default()
        }
    }
}

impl Display for Firewall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self.inner)
    }
}

impl Firewall {
    fn new(session: &Session, inner: protocol::FirewallPolicy) -> Result<Firewall> {
        Ok(Firewall {
            region_id: session.region_id()?,
            session: session.clone(),
            inner,
        })
    }

    /// Create a firewall policy.
    pub(crate) async fn create<S: Into<String>>(session: &Session, name: S) -> Result<Firewall> {
        let inner = api::create_firewall(session, name).await?;
        Firewall::new(session, inner)
    }

    /// Load a firewall policy, `None` if it does not exist.
    pub(crate) async fn find<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Option<Firewall>> {
        match api::get_firewall(session, id).await? {
            Some(inner) => Ok(Some(Firewall::new(session, inner)?)),
            None => Ok(None),
        }
    }

    /// Load a firewall policy.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Firewall> {
        let id = id.as_ref();
        Firewall::find(session, id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such firewall policy: {}", id),
            )
        })
    }

    /// Stream of all firewall policies with their rules.
    pub(crate) fn stream(session: &Session) -> impl Stream<Item = Result<Firewall>> {
        let for_mapping = session.clone();
        api::list_firewalls(session.clone(), true)
            .and_then(move |inner| futures::future::ready(Firewall::new(&for_mapping, inner)))
    }

    /// List all firewall policies.
    pub(crate) async fn list(session: &Session) -> Result<Vec<Firewall>> {
        Firewall::stream(session).try_collect().await
    }

    /// List IDs of all firewall policies with their availability.
    pub(crate) async fn list_status(session: &Session) -> Result<Vec<(String, bool)>> {
        api::list_firewalls(session.clone(), false)
            .map_ok(|policy| (policy.uuid, true))
            .try_collect()
            .await
    }

    /// Revoke a rule by its ID, searching all policies.
    pub(crate) async fn revoke_by_id<S: AsRef<str>>(session: &Session, rule_id: S) -> Result<()> {
        let rule_id = rule_id.as_ref();
        for mut firewall in Firewall::list(session).await? {
            let found = firewall.rules()?.iter().any(|rule| rule.id() == rule_id);
            if found {
                return firewall.revoke(rule_id).await;
            }
        }
        Err(Error::new(
            ErrorKind::ResourceNotFound,
            format!("No firewall rule with ID {}", rule_id),
        ))
    }

    /// Firewall policy ID.
    pub fn id(&self) -> &str {
        &self.inner.uuid
    }

    /// Firewall policy name, defaults to the ID.
    pub fn name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or(&self.inner.uuid)
    }

    /// Firewall policy description, same as the name.
    pub fn description(&self) -> &str {
        self.name()
    }

    /// Firewall policies are always active.
    pub fn is_active(&self) -> bool {
        true
    }

    /// Firewall policies are always available.
    pub fn is_available(&self) -> bool {
        true
    }

    /// ID of the region.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Rules of the policy as of the last refresh.
    pub fn rules(&self) -> Result<Vec<FirewallRule>> {
        self.inner
            .rules
            .iter()
            .map(|rule| FirewallRule::from_protocol(rule, &self.inner.uuid))
            .collect()
    }

    /// Add a rule to the policy, returning the rule ID.
    ///
    /// The policy is fetched and written back as a whole.
    pub async fn authorize(&mut self, rule: FirewallRule) -> Result<String> {
        let mut policy = api::get_firewall(&self.session, &self.inner.uuid)
            .await?
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ResourceNotFound,
                    format!("No such firewall policy: {}", self.inner.uuid),
                )
            })?;
        let rule = FirewallRule {
            firewall_id: policy.uuid.clone(),
            ..rule
        };
        policy.rules.push(rule.to_protocol());
        self.inner = api::update_firewall(&self.session, &policy).await?;
        let id = rule.id();
        debug!("Added rule {} to firewall policy {}", id, self.inner.uuid);
        Ok(id)
    }

    /// Remove a rule from the policy by its ID.
    pub async fn revoke<S: AsRef<str>>(&mut self, rule_id: S) -> Result<()> {
        let rule_id = rule_id.as_ref();
        let mut policy = api::get_firewall(&self.session, &self.inner.uuid)
            .await?
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ResourceNotFound,
                    format!("No such firewall policy: {}", self.inner.uuid),
                )
            })?;

        let mut kept = Vec::with_capacity(policy.rules.len());
        for rule in policy.rules {
            let id = FirewallRule::from_protocol(&rule, &policy.uuid)?.id();
            if !id.eq_ignore_ascii_case(rule_id) {
                kept.push(rule);
            }
        }
        policy.rules = kept;

        self.inner = api::update_firewall(&self.session, &policy).await?;
        debug!("Revoked rule {} from firewall policy {}", rule_id, self.inner.uuid);
        Ok(())
    }

    /// Remove a rule from the policy.
    pub async fn revoke_rule(&mut self, rule: &FirewallRule) -> Result<()> {
        let rule = FirewallRule {
            firewall_id: self.inner.uuid.clone(),
            ..rule.clone()
        };
        self.revoke(rule.id()).await
    }
}

#[cfg(test)]
mod test {
    use super::super::protocol;
    use super::{Direction, FirewallRule, Permission, Protocol, RuleTarget};

    #[test]
    fn test_rule_from_protocol() {
        let rule: protocol::Rule = serde_json::from_str(
            r#"{"action": "accept", "direction": "in", "ip_proto": "tcp",
                "src_ip": "10.0.0.0/8", "dst_port": "8000:8080"}"#,
        )
        .unwrap();
        let rule = FirewallRule::from_protocol(&rule, "fw1").unwrap();
        assert_eq!(rule.permission, Some(Permission::Allow));
        assert_eq!(rule.direction, Some(Direction::Ingress));
        assert_eq!(rule.protocol, Some(Protocol::Tcp));
        assert_eq!(rule.source, RuleTarget::Cidr("10.0.0.0/8".to_string()));
        assert_eq!(rule.destination, RuleTarget::Global("fw1".to_string()));
        assert_eq!(rule.ports, Some((8000, 8080)));
    }

    #[test]
    fn test_rule_to_protocol() {
        let rule = FirewallRule::new("fw1", Direction::Egress, Permission::Deny, Protocol::Udp)
            .with_destination("1.2.3.4/32")
            .with_ports(53, 53);
        let proto = rule.to_protocol();
        assert_eq!(proto.action.as_deref(), Some("drop"));
        assert_eq!(proto.direction.as_deref(), Some("out"));
        assert_eq!(proto.ip_proto.as_deref(), Some("udp"));
        assert_eq!(proto.src_ip, None);
        assert_eq!(proto.dst_ip.as_deref(), Some("1.2.3.4/32"));
        assert_eq!(proto.dst_port.as_deref(), Some("53"));

        let back = FirewallRule::from_protocol(&proto, "fw1").unwrap();
        assert_eq!(back, rule);
        assert_eq!(back.id(), rule.id());
    }

    #[test]
    fn test_rule_id() {
        let rule = FirewallRule::new("fw1", Direction::Ingress, Permission::Allow, Protocol::Tcp)
            .with_source("0.0.0.0/0")
            .with_ports(22, 22);
        assert_eq!(
            rule.id(),
            "fw1:cidr:0.0.0.0/0:in:tcp:accept:global:fw1:22:22"
        );
        let other = rule.clone().with_ports(22, 23);
        assert_ne!(rule.id(), other.id());
    }

    #[test]
    fn test_bad_port() {
        let rule = protocol::Rule {
            dst_port: Some("http".to_string()),
            ..Default::default()
        };
        assert!(FirewallRule::from_protocol(&rule, "fw1").is_err());
    }
}
