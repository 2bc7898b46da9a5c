//! Protocol and network configuration.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The shape of the sharing: `parties` nodes holding degree-`degree`
/// polynomials, so any `degree + 1` shares reconstruct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProtocolConfig")]
pub struct ProtocolConfig {
    parties: u16,
    degree: u16,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProtocolConfig {
    parties: u16,
    degree: u16,
}

impl TryFrom<RawProtocolConfig> for ProtocolConfig {
    type Error = Error;

    fn try_from(raw: RawProtocolConfig) -> Result<Self, Error> {
        Self::new(raw.parties, raw.degree)
    }
}

impl ProtocolConfig {
    /// Validates and builds a configuration.
    ///
    /// Requires `parties >= 2` and `1 <= degree < parties`.
    pub fn new(parties: u16, degree: u16) -> Result<Self, Error> {
        if parties < 2 {
            return Err(Error::InvalidParties);
        }
        if degree < 1 || degree >= parties {
            return Err(Error::InvalidDegree);
        }
        Ok(Self { parties, degree })
    }

    /// The number of parties `n`.
    pub fn parties(&self) -> u16 {
        self.parties
    }

    /// The polynomial degree `t`.
    pub fn degree(&self) -> u16 {
        self.degree
    }

    /// The number of points needed to interpolate, `t + 1`.
    pub fn threshold(&self) -> usize {
        usize::from(self.degree) + 1
    }

    /// The party indices `1..=n`.
    pub fn indices(&self) -> impl Iterator<Item = u16> {
        1..=self.parties
    }

    /// Fails unless `index` is in `1..=n`.
    pub fn check_index(&self, index: u16) -> Result<(), Error> {
        if index == 0 || index > self.parties {
            return Err(Error::InvalidPartyIndex { index });
        }
        Ok(())
    }

    /// Converts a party index into a zero-based slot.
    pub(crate) fn slot(&self, index: u16) -> Result<usize, Error> {
        self.check_index(index)?;
        Ok(usize::from(index) - 1)
    }
}

/// Where every participant lives. All parties must load the same document,
/// since slot `i` of `nodes` is party `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// The protocol shape.
    pub protocol: ProtocolConfig,
    /// The bulletin board's address.
    pub board: String,
    /// The node addresses, ordered by party index.
    pub nodes: Vec<String>,
}

impl NetworkConfig {
    /// Parses a JSON configuration and checks that there is one address per
    /// party.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the address list against the party count.
    pub fn validate(&self) -> Result<(), Error> {
        if self.nodes.len() != usize::from(self.protocol.parties()) {
            return Err(Error::IncorrectNumberOfAddresses {
                expected: self.protocol.parties(),
                actual: self.nodes.len(),
            });
        }
        Ok(())
    }

    /// The address of party `index`.
    pub fn node_address(&self, index: u16) -> Result<&str, Error> {
        let slot = self.protocol.slot(index)?;
        self.nodes
            .get(slot)
            .map(String::as_str)
            .ok_or(Error::InvalidPartyIndex { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(ProtocolConfig::new(1, 1), Err(Error::InvalidParties));
        assert_eq!(ProtocolConfig::new(3, 0), Err(Error::InvalidDegree));
        assert_eq!(ProtocolConfig::new(3, 3), Err(Error::InvalidDegree));
        assert!(ProtocolConfig::new(3, 2).is_ok());
    }

    #[test]
    fn parses_network_json() {
        let json = r#"{
            "protocol": { "parties": 3, "degree": 1 },
            "board": "127.0.0.1:9000",
            "nodes": ["127.0.0.1:9001", "127.0.0.1:9002", "127.0.0.1:9003"]
        }"#;
        let config = NetworkConfig::from_json(json).unwrap();
        assert_eq!(config.protocol.threshold(), 2);
        assert_eq!(config.node_address(2).unwrap(), "127.0.0.1:9002");
        assert_eq!(
            config.node_address(4),
            Err(Error::InvalidPartyIndex { index: 4 })
        );
    }

    #[test]
    fn rejects_mismatched_address_list() {
        let json = r#"{
            "protocol": { "parties": 3, "degree": 1 },
            "board": "b",
            "nodes": ["a", "b"]
        }"#;
        assert_eq!(
            NetworkConfig::from_json(json),
            Err(Error::IncorrectNumberOfAddresses {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn rejects_invalid_protocol_in_json() {
        let json = r#"{
            "protocol": { "parties": 3, "degree": 5 },
            "board": "b",
            "nodes": ["a", "b", "c"]
        }"#;
        assert!(matches!(
            NetworkConfig::from_json(json),
            Err(Error::InvalidConfig(_))
        ));
    }
}
